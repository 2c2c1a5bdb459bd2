//! Domain provisioning and asynchronous verification for Mailrail
//!
//! This crate coordinates two eventually-consistent external services (a DNS
//! provider and an email-delivery provider) to provision email-receiving
//! subdomains:
//!
//! - `DomainService` sequences idempotent subdomain creation/deletion across
//!   the two provider ports.
//! - `DnsVerifier` runs the background verification state machine: it polls
//!   the email-delivery provider with exponential backoff until a domain is
//!   verified or its completion budget runs out, then fires exactly one
//!   callback per domain.
//!
//! Verification state is process-local and not persisted; a restart loses
//! in-flight verifications.

pub mod domain_service;
pub mod errors;
pub mod verifier;

// Re-export main types
pub use domain_service::{DomainService, RegisterDomainResult, VerifiedCallback};
pub use errors::DomainError;
pub use verifier::{
    CompletionCallback, DnsVerifier, DomainStatus, ErrorCallback, VerificationStatus,
    VerifierConfig,
};
