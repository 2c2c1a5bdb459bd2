//! DNS port trait definition

use async_trait::async_trait;
use mailrail_core::DnsRecord;

use crate::errors::DnsError;

/// Capability interface for managing subdomain records on a DNS provider.
///
/// All operations address records belonging to `subdomain` under `apex`
/// (e.g. `demo` under `example.com`). A `bool` result reports whether the
/// provider accepted the operation; transport and authorization failures
/// surface as `DnsError`.
#[async_trait]
pub trait DnsPort: Send + Sync {
    /// Push the given records for the subdomain to the provider.
    ///
    /// Returns `true` only if every record was created.
    async fn create_records(
        &self,
        apex: &str,
        subdomain: &str,
        records: &[DnsRecord],
    ) -> Result<bool, DnsError>;

    /// Delete all records under `subdomain.apex`.
    ///
    /// Returns `true` only if no deletion failed.
    async fn delete_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError>;

    /// Check whether any record exists for exactly `subdomain.apex`.
    async fn exists_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError>;
}
