//! Porkbun DNS provider implementation
//!
//! Uses the Porkbun JSON API v3. All requests are POSTs carrying the API
//! key pair in the body.

use async_trait::async_trait;
use mailrail_core::DnsRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::traits::DnsPort;
use crate::errors::DnsError;

/// Porkbun API credentials configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PorkbunCredentials {
    pub api_key: String,
    pub secret_api_key: String,
}

/// Porkbun DNS provider
pub struct PorkbunDnsProvider {
    client: Client,
    credentials: PorkbunCredentials,
    base_url: String,
}

impl PorkbunDnsProvider {
    const BASE_URL: &'static str = "https://api.porkbun.com/api/json/v3";

    /// Create a new Porkbun provider with the given credentials
    pub fn new(credentials: PorkbunCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
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

    async fn retrieve_records(&self, apex: &str) -> Result<Vec<PorkbunRecord>, DnsError> {
        let request = PorkbunAuthRequest {
            apikey: self.credentials.api_key.clone(),
            secretapikey: self.credentials.secret_api_key.clone(),
        };

        let response = self
            .client
            .post(self.api_url(&format!("/dns/retrieve/{}", urlencoding::encode(apex))))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(DnsError::PermissionDenied(format!(
                    "Cannot retrieve records for {} ({}): {}",
                    apex, status, body
                )));
            }
            return Err(DnsError::ApiError(format!(
                "Failed to retrieve records for {} ({}): {}",
                apex, status, body
            )));
        }

        let retrieved: PorkbunRetrieveResponse = response.json().await?;
        Ok(retrieved.records)
    }

    async fn delete_record(&self, apex: &str, record_id: &str) -> Result<bool, DnsError> {
        let request = PorkbunAuthRequest {
            apikey: self.credentials.api_key.clone(),
            secretapikey: self.credentials.secret_api_key.clone(),
        };

        let response = self
            .client
            .post(self.api_url(&format!(
                "/dns/delete/{}/{}",
                urlencoding::encode(apex),
                urlencoding::encode(record_id)
            )))
            .json(&request)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

/// Strip the apex suffix from a fully-qualified record name.
///
/// Porkbun expects record names relative to the apex; providers hand back
/// fully-qualified names.
fn relative_name(full_name: &str, apex: &str) -> String {
    match full_name.strip_suffix(apex) {
        Some(remaining) => remaining.trim_end_matches('.').to_string(),
        None => full_name.to_string(),
    }
}

// Porkbun API wire types
#[derive(Debug, Serialize)]
struct PorkbunAuthRequest {
    apikey: String,
    secretapikey: String,
}

#[derive(Debug, Serialize)]
struct PorkbunCreateRequest {
    apikey: String,
    secretapikey: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prio: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct PorkbunRetrieveResponse {
    #[allow(dead_code)]
    status: String,
    records: Vec<PorkbunRecord>,
}

#[derive(Debug, Deserialize)]
struct PorkbunRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    record_type: String,
    #[allow(dead_code)]
    content: String,
}

#[async_trait]
impl DnsPort for PorkbunDnsProvider {
    async fn create_records(
        &self,
        apex: &str,
        subdomain: &str,
        records: &[DnsRecord],
    ) -> Result<bool, DnsError> {
        info!(
            "Creating {} DNS records for {}.{}",
            records.len(),
            subdomain,
            apex
        );

        let mut records_created = 0;

        for record in records {
            let name = relative_name(&record.name, apex);

            let request = PorkbunCreateRequest {
                apikey: self.credentials.api_key.clone(),
                secretapikey: self.credentials.secret_api_key.clone(),
                name,
                record_type: record.record_type.to_string(),
                content: record.value.clone(),
                prio: record.priority,
            };

            let response = self
                .client
                .post(self.api_url(&format!("/dns/create/{}", urlencoding::encode(apex))))
                .json(&request)
                .send()
                .await?;

            if response.status().is_success() {
                records_created += 1;
            } else {
                error!(
                    "Failed to create {} record {} for {}.{} ({})",
                    record.record_type,
                    record.name,
                    subdomain,
                    apex,
                    response.status()
                );
            }
        }

        Ok(records_created == records.len())
    }

    async fn delete_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError> {
        let records = self.retrieve_records(apex).await?;
        let full_name = format!("{}.{}", subdomain, apex);
        // Match on a label boundary so a sibling like `mydemo.example.com`
        // is never mistaken for a record under `demo.example.com`
        let label_suffix = format!(".{}", full_name);

        let mut failure_recorded = false;

        for record in records
            .iter()
            .filter(|r| r.name == full_name || r.name.ends_with(&label_suffix))
        {
            debug!("Deleting DNS record {} ({})", record.name, record.id);
            if !self.delete_record(apex, &record.id).await? {
                error!(
                    "Failed to delete DNS record {} ({}) under {}",
                    record.name, record.id, apex
                );
                failure_recorded = true;
            }
        }

        Ok(!failure_recorded)
    }

    async fn exists_records(&self, apex: &str, subdomain: &str) -> Result<bool, DnsError> {
        let records = self.retrieve_records(apex).await?;
        let full_name = format!("{}.{}", subdomain, apex);

        Ok(records.iter().any(|r| r.name == full_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailrail_core::DnsRecordType;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(server: &MockServer) -> PorkbunDnsProvider {
        PorkbunDnsProvider::new(PorkbunCredentials {
            api_key: "pk_test".to_string(),
            secret_api_key: "sk_test".to_string(),
        })
        .with_base_url(server.uri())
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(relative_name("demo.example.com", "example.com"), "demo");
        assert_eq!(
            relative_name("mxa._domainkey.demo.example.com", "example.com"),
            "mxa._domainkey.demo"
        );
        assert_eq!(relative_name("other.net", "example.com"), "other.net");
    }

    #[tokio::test]
    async fn test_create_records_strips_apex() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dns/create/example.com"))
            .and(body_partial_json(json!({
                "name": "demo",
                "type": "MX",
                "content": "mxa.mailgun.org",
                "prio": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let records = vec![DnsRecord {
            name: "demo.example.com".to_string(),
            record_type: DnsRecordType::Mx,
            value: "mxa.mailgun.org".to_string(),
            priority: Some(10),
        }];

        let created = provider
            .create_records("example.com", "demo", &records)
            .await
            .unwrap();

        assert!(created);
    }

    #[tokio::test]
    async fn test_create_records_reports_partial_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dns/create/example.com"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"status": "ERROR"})))
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let records = vec![DnsRecord {
            name: "demo.example.com".to_string(),
            record_type: DnsRecordType::Txt,
            value: "v=spf1 include:mailgun.org ~all".to_string(),
            priority: None,
        }];

        let created = provider
            .create_records("example.com", "demo", &records)
            .await
            .unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_exists_records_matches_exact_name() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dns/retrieve/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "records": [
                    {"id": "1", "name": "demo.example.com", "type": "MX", "content": "mxa.mailgun.org"},
                    {"id": "2", "name": "www.example.com", "type": "CNAME", "content": "example.com"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = test_provider(&server);

        assert!(provider
            .exists_records("example.com", "demo")
            .await
            .unwrap());
        assert!(!provider
            .exists_records("example.com", "other")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_exists_records_permission_denied() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dns/retrieve/example.com"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let result = provider.exists_records("example.com", "demo").await;

        assert!(matches!(result, Err(DnsError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_delete_records_deletes_matching_only() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dns/retrieve/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "records": [
                    {"id": "1", "name": "demo.example.com", "type": "MX", "content": "mxa.mailgun.org"},
                    {"id": "2", "name": "mail._domainkey.demo.example.com", "type": "TXT", "content": "k=rsa"},
                    {"id": "3", "name": "www.example.com", "type": "CNAME", "content": "example.com"},
                    {"id": "4", "name": "mydemo.example.com", "type": "MX", "content": "mxa.mailgun.org"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dns/delete/example.com/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dns/delete/example.com/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server);
        let deleted = provider
            .delete_records("example.com", "demo")
            .await
            .unwrap();

        // Only ids 1 and 2 have delete mocks mounted; an attempt to delete
        // the unrelated `www` record or the `mydemo` sibling would hit an
        // unmocked route, fail, and flip the result to false
        assert!(deleted);
    }
}
