//! Core types shared across Mailrail crates
//!
//! This crate provides the value types exchanged between the DNS and
//! email-delivery ports, plus domain-name parsing utilities.

pub mod domain;
pub mod types;

// Re-export main types
pub use domain::{parse_email, split_domain};
pub use types::{DnsRecord, DnsRecordType};
