//! DNS provider port for Mailrail
//!
//! This crate defines the `DnsPort` capability used by the provisioning
//! orchestrator to manage subdomain records on an external DNS provider.
//!
//! # Providers
//!
//! - **Porkbun**: JSON API v3 (create / retrieve / delete by record id)
//! - **Mock**: in-memory provider for tests

pub mod errors;
pub mod providers;

// Re-export main types
pub use errors::DnsError;
pub use providers::{DnsPort, MockDnsProvider, PorkbunCredentials, PorkbunDnsProvider};
