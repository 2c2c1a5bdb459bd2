//! Error types for the email-delivery port

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Unexpected response status {status} for domain {domain}")]
    UnexpectedStatus {
        domain: String,
        status: reqwest::StatusCode,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}
