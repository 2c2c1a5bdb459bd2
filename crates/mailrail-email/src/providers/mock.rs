//! Mock email-delivery provider for testing

use async_trait::async_trait;
use mailrail_core::{DnsRecord, DnsRecordType};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::EmailDeliveryPort;
use crate::errors::EmailError;

/// Mock email-delivery provider for testing
///
/// Tracks created subdomains in memory; the verification result can be
/// flipped at runtime to simulate DNS propagation.
#[derive(Debug, Clone, Default)]
pub struct MockEmailDeliveryProvider {
    domains: Arc<Mutex<HashSet<String>>>,

    /// Counters for tracking calls
    pub create_count: Arc<AtomicUsize>,
    pub delete_count: Arc<AtomicUsize>,
    pub exists_count: Arc<AtomicUsize>,
    pub verify_count: Arc<AtomicUsize>,

    /// Configurable responses
    verify_result: Arc<AtomicBool>,
    should_fail_verify: bool,
    should_refuse_delete: bool,
}

impl MockEmailDeliveryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the provider with an existing subdomain
    pub fn with_existing(self, subdomain: &str, apex: &str) -> Self {
        self.domains
            .lock()
            .unwrap()
            .insert(format!("{}.{}", subdomain, apex));
        self
    }

    /// Make `verify_domain` return an error
    pub fn with_verify_error(mut self) -> Self {
        self.should_fail_verify = true;
        self
    }

    /// Make `delete_subdomain` report failure
    pub fn with_delete_refusal(mut self) -> Self {
        self.should_refuse_delete = true;
        self
    }

    /// Set the result future `verify_domain` calls will report
    pub fn set_verify_result(&self, verified: bool) {
        self.verify_result.store(verified, Ordering::SeqCst);
    }

    pub fn create_call_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn exists_call_count(&self) -> usize {
        self.exists_count.load(Ordering::SeqCst)
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_count.load(Ordering::SeqCst)
    }

    /// The DNS records the mock hands out for a new subdomain
    pub fn sample_records(subdomain: &str, apex: &str) -> Vec<DnsRecord> {
        let domain = format!("{}.{}", subdomain, apex);
        vec![
            DnsRecord {
                name: domain.clone(),
                record_type: DnsRecordType::Mx,
                value: "mxa.mock.example".to_string(),
                priority: Some(10),
            },
            DnsRecord {
                name: domain.clone(),
                record_type: DnsRecordType::Txt,
                value: "v=spf1 include:mock.example ~all".to_string(),
                priority: None,
            },
            DnsRecord {
                name: format!("email.{}", domain),
                record_type: DnsRecordType::Cname,
                value: "mock.example".to_string(),
                priority: None,
            },
        ]
    }
}

#[async_trait]
impl EmailDeliveryPort for MockEmailDeliveryProvider {
    async fn create_subdomain(
        &self,
        subdomain: &str,
        apex: &str,
    ) -> Result<Vec<DnsRecord>, EmailError> {
        self.create_count.fetch_add(1, Ordering::SeqCst);

        self.domains
            .lock()
            .unwrap()
            .insert(format!("{}.{}", subdomain, apex));

        Ok(Self::sample_records(subdomain, apex))
    }

    async fn delete_subdomain(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);

        if self.should_refuse_delete {
            return Ok(false);
        }

        Ok(self
            .domains
            .lock()
            .unwrap()
            .remove(&format!("{}.{}", subdomain, apex)))
    }

    async fn subdomain_exists(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError> {
        self.exists_count.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .domains
            .lock()
            .unwrap()
            .contains(&format!("{}.{}", subdomain, apex)))
    }

    async fn verify_domain(&self, domain: &str) -> Result<bool, EmailError> {
        self.verify_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail_verify {
            return Err(EmailError::ProviderError(format!(
                "Mock verification failure for {}",
                domain
            )));
        }

        Ok(self.verify_result.load(Ordering::SeqCst))
    }
}
