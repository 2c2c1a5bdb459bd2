//! Mock DNS provider for testing

use async_trait::async_trait;
use mailrail_core::DnsRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::DnsPort;
use crate::errors::DnsError;

/// Mock DNS provider for testing
///
/// Keeps records in memory keyed by `subdomain.apex` and counts calls.
#[derive(Debug, Clone, Default)]
pub struct MockDnsProvider {
    records: Arc<Mutex<HashMap<String, Vec<DnsRecord>>>>,

    /// Counters for tracking calls
    pub create_count: Arc<AtomicUsize>,
    pub delete_count: Arc<AtomicUsize>,
    pub exists_count: Arc<AtomicUsize>,

    /// Configurable responses
    should_fail_exists: bool,
    should_refuse_create: bool,
    should_refuse_delete: bool,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the provider with existing records for `subdomain.apex`
    pub fn with_existing(self, apex: &str, subdomain: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(format!("{}.{}", subdomain, apex), Vec::new());
        self
    }

    /// Make `exists_records` return an error (simulates missing apex access)
    pub fn with_exists_error(mut self) -> Self {
        self.should_fail_exists = true;
        self
    }

    /// Make `create_records` report failure without storing anything
    pub fn with_create_refusal(mut self) -> Self {
        self.should_refuse_create = true;
        self
    }

    /// Make `delete_records` report failure
    pub fn with_delete_refusal(mut self) -> Self {
        self.should_refuse_delete = true;
        self
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

    /// Records currently stored for `subdomain.apex`
    pub fn stored_records(&self, apex: &str, subdomain: &str) -> Option<Vec<DnsRecord>> {
        self.records
            .lock()
            .unwrap()
            .get(&format!("{}.{}", subdomain, apex))
            .cloned()
    }
}

#[async_trait]
impl DnsPort for MockDnsProvider {
    async fn create_records(
        &self,
        apex: &str,
        subdomain: &str,
        records: &[DnsRecord],
    ) -> Result<bool, DnsError> {
        self.create_count.fetch_add(1, Ordering::SeqCst);

        if self.should_refuse_create {
            return Ok(false);
        }

        self.records
            .lock()
            .unwrap()
            .insert(format!("{}.{}", subdomain, apex), records.to_vec());
        Ok(true)
    }

    async fn delete_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);

        if self.should_refuse_delete {
            return Ok(false);
        }

        self.records
            .lock()
            .unwrap()
            .remove(&format!("{}.{}", subdomain, apex));
        Ok(true)
    }

    async fn exists_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError> {
        self.exists_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail_exists {
            return Err(DnsError::PermissionDenied(format!(
                "Mock provider has no access to {}",
                apex
            )));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .contains_key(&format!("{}.{}", subdomain, apex)))
    }
}
