//! Mailgun email-delivery provider implementation
//!
//! Domain management goes through the v4 API (create/verify return the DNS
//! record sets), deletion and existence probes through v3.

use async_trait::async_trait;
use mailrail_core::{DnsRecord, DnsRecordType};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::traits::EmailDeliveryPort;
use crate::errors::EmailError;

/// Mailgun API credentials configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailgunCredentials {
    pub api_key: String,
}

/// Mailgun email-delivery provider
pub struct MailgunProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MailgunProvider {
    const BASE_URL: &'static str = "https://api.mailgun.net";
    const BASIC_AUTH_USER: &'static str = "api";

    /// Create a new Mailgun provider with the given credentials
    pub fn new(credentials: &MailgunCredentials) -> Self {
        Self {
            client: Client::new(),
            api_key: credentials.api_key.clone(),
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Mailgun API wire types
#[derive(Debug, Serialize)]
struct MailgunCreateDomainRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MailgunDomainResponse {
    #[serde(default)]
    receiving_dns_records: Vec<MailgunDnsRecord>,
    #[serde(default)]
    sending_dns_records: Vec<MailgunDnsRecord>,
}

#[derive(Debug, Deserialize)]
struct MailgunDnsRecord {
    record_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    value: Option<String>,
    // Mailgun serializes MX priorities as strings
    priority: Option<String>,
    #[serde(default)]
    valid: Option<String>,
}

impl MailgunDnsRecord {
    /// Convert a wire record into the shared `DnsRecord` value type.
    ///
    /// Records with a missing type/value or an unsupported record type are
    /// dropped; Mailgun only hands out MX/TXT/CNAME for domain setup.
    fn into_dns_record(self, fallback_name: &str) -> Option<DnsRecord> {
        let record_type = match self.record_type.as_deref() {
            Some(raw) => match raw.parse::<DnsRecordType>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!("Skipping Mailgun DNS record: {}", e);
                    return None;
                }
            },
            None => {
                error!("Skipping Mailgun DNS record without a record type");
                return None;
            }
        };

        let value = match self.value {
            Some(value) => value,
            None => {
                error!("Skipping Mailgun {} record without a value", record_type);
                return None;
            }
        };

        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => fallback_name.to_string(),
        };

        Some(DnsRecord {
            name,
            record_type,
            value,
            priority: self.priority.and_then(|p| p.parse().ok()),
        })
    }

    fn is_valid(&self) -> bool {
        self.valid.as_deref() == Some("valid")
    }
}

#[async_trait]
impl EmailDeliveryPort for MailgunProvider {
    async fn create_subdomain(
        &self,
        subdomain: &str,
        apex: &str,
    ) -> Result<Vec<DnsRecord>, EmailError> {
        let domain_name = format!("{}.{}", subdomain, apex);
        info!("Creating Mailgun domain {}", domain_name);

        let response = self
            .client
            .post(self.api_url("/v4/domains"))
            .basic_auth(Self::BASIC_AUTH_USER, Some(&self.api_key))
            .form(&MailgunCreateDomainRequest {
                name: domain_name.clone(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmailError::ProviderError(format!(
                "Failed to create domain {} ({}): {}",
                domain_name, status, body
            )));
        }

        let domain_response: MailgunDomainResponse = response.json().await?;

        let records: Vec<DnsRecord> = domain_response
            .receiving_dns_records
            .into_iter()
            .chain(domain_response.sending_dns_records)
            .filter_map(|r| r.into_dns_record(subdomain))
            .collect();

        debug!(
            "Mailgun returned {} DNS records for {}",
            records.len(),
            domain_name
        );

        Ok(records)
    }

    async fn delete_subdomain(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError> {
        let domain_name = format!("{}.{}", subdomain, apex);
        info!("Deleting Mailgun domain {}", domain_name);

        let response = self
            .client
            .delete(self.api_url(&format!(
                "/v3/domains/{}",
                urlencoding::encode(&domain_name)
            )))
            .basic_auth(Self::BASIC_AUTH_USER, Some(&self.api_key))
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    async fn subdomain_exists(&self, subdomain: &str, apex: &str) -> Result<bool, EmailError> {
        let domain_name = format!("{}.{}", subdomain, apex);

        let response = self
            .client
            .get(self.api_url(&format!(
                "/v3/domains/{}",
                urlencoding::encode(&domain_name)
            )))
            .basic_auth(Self::BASIC_AUTH_USER, Some(&self.api_key))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(EmailError::UnexpectedStatus {
                domain: domain_name,
                status,
            }),
        }
    }

    async fn verify_domain(&self, domain: &str) -> Result<bool, EmailError> {
        debug!("Triggering Mailgun verification for {}", domain);

        let response = self
            .client
            .put(self.api_url(&format!(
                "/v4/domains/{}/verify",
                urlencoding::encode(domain)
            )))
            .basic_auth(Self::BASIC_AUTH_USER, Some(&self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Mailgun verification call for {} returned {}", domain, status);
            return Ok(false);
        }

        let domain_response: MailgunDomainResponse = response.json().await?;

        let invalid_count = domain_response
            .receiving_dns_records
            .iter()
            .chain(domain_response.sending_dns_records.iter())
            .filter(|r| {
                if !r.is_valid() {
                    warn!(
                        "DNS record not yet valid for {}: name={:?} type={:?}",
                        domain, r.name, r.record_type
                    );
                    return true;
                }
                false
            })
            .count();

        debug!("{} invalid DNS records for {}", invalid_count, domain);

        Ok(invalid_count == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(server: &MockServer) -> MailgunProvider {
        MailgunProvider::new(&MailgunCredentials {
            api_key: "key-test".to_string(),
        })
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_create_subdomain_parses_records() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/domains"))
            .and(basic_auth("api", "key-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": {"name": "demo.example.com"},
                "receiving_dns_records": [
                    {"record_type": "MX", "priority": "10", "valid": "unknown", "value": "mxa.mailgun.org"},
                    {"record_type": "MX", "priority": "10", "valid": "unknown", "value": "mxb.mailgun.org"}
                ],
                "sending_dns_records": [
                    {"record_type": "TXT", "name": "demo.example.com", "valid": "unknown", "value": "v=spf1 include:mailgun.org ~all"},
                    {"record_type": "CNAME", "name": "email.demo.example.com", "valid": "unknown", "value": "mailgun.org"},
                    {"record_type": "A", "name": "bogus", "valid": "unknown", "value": "192.0.2.1"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let records = provider
            .create_subdomain("demo", "example.com")
            .await
            .unwrap();

        // The unsupported A record is dropped
        assert_eq!(records.len(), 4);

        // Empty MX names fall back to the subdomain
        let mx: Vec<_> = records
            .iter()
            .filter(|r| r.record_type == DnsRecordType::Mx)
            .collect();
        assert_eq!(mx.len(), 2);
        assert!(mx.iter().all(|r| r.name == "demo"));
        assert!(mx.iter().all(|r| r.priority == Some(10)));

        let txt = records
            .iter()
            .find(|r| r.record_type == DnsRecordType::Txt)
            .unwrap();
        assert_eq!(txt.name, "demo.example.com");
    }

    #[tokio::test]
    async fn test_create_subdomain_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v4/domains"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "domain exists"})),
            )
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let result = provider.create_subdomain("demo", "example.com").await;

        assert!(matches!(result, Err(EmailError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_subdomain_exists() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v3/domains/demo.example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"domain": {"name": "demo.example.com"}})),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v3/domains/missing.example.com"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v3/domains/broken.example.com"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = test_provider(&server);

        assert!(provider
            .subdomain_exists("demo", "example.com")
            .await
            .unwrap());
        assert!(!provider
            .subdomain_exists("missing", "example.com")
            .await
            .unwrap());
        assert!(matches!(
            provider.subdomain_exists("broken", "example.com").await,
            Err(EmailError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_domain_all_valid() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v4/domains/demo.example.com/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "receiving_dns_records": [
                    {"record_type": "MX", "priority": "10", "valid": "valid", "value": "mxa.mailgun.org"}
                ],
                "sending_dns_records": [
                    {"record_type": "TXT", "name": "demo.example.com", "valid": "valid", "value": "v=spf1"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        assert!(provider.verify_domain("demo.example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_domain_pending_record() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v4/domains/demo.example.com/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "receiving_dns_records": [
                    {"record_type": "MX", "priority": "10", "valid": "valid", "value": "mxa.mailgun.org"}
                ],
                "sending_dns_records": [
                    {"record_type": "TXT", "name": "demo.example.com", "valid": "unknown", "value": "v=spf1"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        assert!(!provider.verify_domain("demo.example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_domain_non_success_is_not_verified() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v4/domains/demo.example.com/verify"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        assert!(!provider.verify_domain("demo.example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_subdomain() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v3/domains/demo.example.com"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        assert!(provider
            .delete_subdomain("demo", "example.com")
            .await
            .unwrap());
    }
}
