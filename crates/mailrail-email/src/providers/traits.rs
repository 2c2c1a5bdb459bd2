//! Email-delivery port trait definition

use async_trait::async_trait;
use mailrail_core::DnsRecord;

use crate::errors::EmailError;

/// Capability interface for the email-delivery provider.
///
/// The provider owns subdomain identities (`subdomain.apex`) and reports
/// whether the DNS records it requires have propagated.
#[async_trait]
pub trait EmailDeliveryPort: Send + Sync {
    /// Create the subdomain on the provider and return the DNS records it
    /// requires (MX/TXT/CNAME).
    async fn create_subdomain(
        &self,
        subdomain: &str,
        apex: &str,
    ) -> Result<Vec<DnsRecord>, EmailError>;

    /// Delete the subdomain from the provider.
    async fn delete_subdomain(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError>;

    /// Check whether the subdomain already exists on the provider.
    async fn subdomain_exists(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError>;

    /// Trigger a verification check for the fully-qualified domain.
    ///
    /// Returns `true` once the provider considers every required DNS record
    /// valid. `Ok(false)` is an expected, retryable outcome.
    async fn verify_domain(&self, domain: &str) -> Result<bool, EmailError>;
}
