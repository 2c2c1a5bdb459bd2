//! Email-delivery provider port for Mailrail
//!
//! This crate defines the `EmailDeliveryPort` capability used to create
//! email-receiving subdomains on an external email-delivery service and to
//! query their verification status.
//!
//! # Providers
//!
//! - **Mailgun**: domain management via the v3/v4 REST API
//! - **Mock**: in-memory provider for tests

pub mod errors;
pub mod providers;

// Re-export main types
pub use errors::EmailError;
pub use providers::{
    EmailDeliveryPort, MailgunCredentials, MailgunProvider, MockEmailDeliveryProvider,
};
