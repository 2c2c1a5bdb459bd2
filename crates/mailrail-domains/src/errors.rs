//! Error types for domain provisioning

use mailrail_dns::DnsError;
use mailrail_email::EmailError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// DNS state for the apex could not be read; fatal to the registration
    /// attempt (usually missing API access to the apex domain).
    #[error("Cannot access domain: {0}")]
    DomainAccess(String),

    /// The DNS-side record push failed after the email-delivery-side
    /// creation succeeded. External state is left inconsistent; the
    /// provider-side identity is kept for manual remediation.
    #[error("Subdomain creation failed: {0}")]
    SubdomainCreation(String),

    /// Verification has not completed yet. Expected, non-fatal condition
    /// for callers polling a registration.
    #[error("Domain verification pending: {0}")]
    VerificationPending(String),

    #[error("Apex domain provisioning is not supported: {0}")]
    ApexNotSupported(String),

    #[error("DNS provider error: {0}")]
    Dns(#[from] DnsError),

    #[error("Email-delivery provider error: {0}")]
    EmailDelivery(#[from] EmailError),
}
