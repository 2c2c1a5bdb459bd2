//! Subdomain provisioning across the DNS and email-delivery providers

use std::sync::Arc;
use std::time::Duration;

use mailrail_core::split_domain;
use mailrail_dns::DnsPort;
use mailrail_email::EmailDeliveryPort;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::verifier::{DnsVerifier, DomainStatus, VerifierConfig};

/// Callback invoked once the registered domain is verified
pub type VerifiedCallback = Box<dyn Fn() + Send + Sync>;

/// Outcome of a registration request
#[derive(Debug, Clone, Serialize)]
pub struct RegisterDomainResult {
    pub domain: String,
    pub status: DomainStatus,
}

/// Orchestrates subdomain provisioning across the two providers
///
/// Registration is idempotent: a domain that already exists on either side
/// is reported `Verified` without touching external state. A freshly created
/// domain starts `Pending` and is handed to the background [`DnsVerifier`].
pub struct DomainService {
    dns: Arc<dyn DnsPort>,
    email_delivery: Arc<dyn EmailDeliveryPort>,
    verifier: DnsVerifier,
}

impl DomainService {
    pub fn new(dns: Arc<dyn DnsPort>, email_delivery: Arc<dyn EmailDeliveryPort>) -> Self {
        Self::with_verifier_config(dns, email_delivery, VerifierConfig::default())
    }

    pub fn with_verifier_config(
        dns: Arc<dyn DnsPort>,
        email_delivery: Arc<dyn EmailDeliveryPort>,
        config: VerifierConfig,
    ) -> Self {
        let verifier = DnsVerifier::with_config(email_delivery.clone(), config);
        Self {
            dns,
            email_delivery,
            verifier,
        }
    }

    /// Provision an email-receiving subdomain.
    ///
    /// Creates the domain on the email-delivery provider, pushes the DNS
    /// records it requires, and enqueues background verification. The
    /// `on_verified` callback fires at most once, when verification
    /// eventually succeeds.
    pub async fn register_domain(
        &self,
        domain: &str,
        on_verified: Option<VerifiedCallback>,
    ) -> Result<RegisterDomainResult, DomainError> {
        let (subdomain, apex) = split_domain(domain);
        let Some(subdomain) = subdomain else {
            return Err(DomainError::ApexNotSupported(domain.to_string()));
        };

        info!("Registering domain {} (apex {})", domain, apex);

        // One probe serves both the access check and idempotency: an error
        // here means we cannot manage records under the apex at all
        let dns_exists = self
            .dns
            .exists_records(&apex, &subdomain)
            .await
            .map_err(|e| {
                error!("Cannot access DNS zone for {}: {}", apex, e);
                DomainError::DomainAccess(format!("{}: {}", apex, e))
            })?;

        if dns_exists || self.email_delivery.subdomain_exists(&subdomain, &apex).await? {
            info!("Domain {} already provisioned", domain);
            return Ok(RegisterDomainResult {
                domain: domain.to_string(),
                status: DomainStatus::Verified,
            });
        }

        let records = self
            .email_delivery
            .create_subdomain(&subdomain, &apex)
            .await?;

        // No rollback of the email-delivery side on DNS failure; retrying
        // the registration picks the existing provider domain back up
        let created = self
            .dns
            .create_records(&apex, &subdomain, &records)
            .await
            .map_err(|e| DomainError::SubdomainCreation(format!("{}: {}", domain, e)))?;
        if !created {
            return Err(DomainError::SubdomainCreation(format!(
                "DNS provider refused records for {}",
                domain
            )));
        }

        let on_complete = on_verified.map(|cb| -> crate::verifier::CompletionCallback {
            Box::new(move |domain: &str| {
                info!("Domain {} verification complete", domain);
                cb();
            })
        });
        let on_error: crate::verifier::ErrorCallback =
            Box::new(|domain: &str, message: &str| {
                error!("Domain {} verification failed: {}", domain, message);
            });

        let pending = self
            .verifier
            .add_pending_verification(domain, on_complete, Some(on_error))
            .await;

        Ok(RegisterDomainResult {
            domain: domain.to_string(),
            status: if pending {
                DomainStatus::Pending
            } else {
                DomainStatus::Verified
            },
        })
    }

    /// Tear down a subdomain on both providers.
    ///
    /// Both deletions are always attempted; a failure on one side never
    /// skips the other. Returns `true` only if both succeeded.
    pub async fn delete_domain(&self, domain: &str) -> Result<bool, DomainError> {
        let (subdomain, apex) = split_domain(domain);
        let Some(subdomain) = subdomain else {
            return Err(DomainError::ApexNotSupported(domain.to_string()));
        };

        info!("Deleting domain {} (apex {})", domain, apex);

        self.verifier.remove_domain(domain).await;

        let email_deleted = match self.email_delivery.delete_subdomain(&subdomain, &apex).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Failed to delete {} from email-delivery provider: {}", domain, e);
                false
            }
        };

        let dns_deleted = match self.dns.delete_records(&apex, &subdomain).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Failed to delete DNS records for {}: {}", domain, e);
                false
            }
        };

        if !email_deleted || !dns_deleted {
            warn!(
                "Partial deletion for {}: email-delivery={}, dns={}",
                domain, email_deleted, dns_deleted
            );
        }

        Ok(email_deleted && dns_deleted)
    }

    /// One immediate verification check, bypassing the background schedule.
    pub async fn verify_domain(&self, domain: &str) -> Result<bool, DomainError> {
        Ok(self.email_delivery.verify_domain(domain).await?)
    }

    /// Status of a domain tracked by the verifier; `None` if untracked.
    pub async fn verification_status(&self, domain: &str) -> Option<DomainStatus> {
        self.verifier.get_domain_status(domain).await
    }

    pub fn verifier(&self) -> &DnsVerifier {
        &self.verifier
    }

    /// Stop background verification, notifying still-pending registrations.
    pub async fn shutdown(&self, timeout: Duration) {
        self.verifier.shutdown(timeout).await;
    }
}
