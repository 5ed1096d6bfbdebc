//! Cloudflare v4 API client
//!
//! Implements [`DnsProvider`] against the Cloudflare REST API using the
//! legacy email + global key authentication headers.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{DnsError, DnsProvider, DnsResult, RawRecord, RecordUpdate, UpdateAck};

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the Cloudflare client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareConfig {
    /// Account email (`X-Auth-Email`)
    pub email: String,

    /// Global API key (`X-Auth-Key`)
    pub api_key: String,

    /// Zone holding the managed records
    pub zone_id: String,

    /// API base URL
    pub api_base: String,

    /// Page size for the list call
    pub per_page: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            api_key: String::new(),
            zone_id: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            per_page: 30,
            timeout_secs: 10,
        }
    }
}

impl CloudflareConfig {
    pub fn new(
        email: impl Into<String>,
        api_key: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            zone_id: zone_id.into(),
            ..Default::default()
        }
    }

    /// Point the client at a different API base (mock servers, proxies)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

// ============================================================================
// API Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl ApiMessage {
    fn render(&self) -> String {
        format!("{} ({})", self.message, self.code)
    }
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

// ============================================================================
// Cloudflare Client
// ============================================================================

/// Cloudflare DNS client
pub struct CloudflareClient {
    config: CloudflareConfig,
    http_client: Client,
}

impl CloudflareClient {
    /// Create a new client
    pub fn new(config: CloudflareConfig) -> DnsResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Zone this client lists
    pub fn zone_id(&self) -> &str {
        &self.config.zone_id
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!(
            "{}/zones/{}/dns_records",
            self.config.api_base.trim_end_matches('/'),
            zone_id
        )
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.config.email)
            .header("X-Auth-Key", &self.config.api_key)
    }

    // Internal: decode a provider envelope, falling back to the HTTP status
    // when the body is not one
    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> DnsResult<Envelope<T>> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(DnsError::Decode(e.to_string())),
            Err(_) => Err(DnsError::Http {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn list_page(&self, page: u32) -> DnsResult<(Vec<RawRecord>, Option<u32>)> {
        let request = self
            .http_client
            .get(self.records_url(&self.config.zone_id))
            .query(&[("per_page", self.config.per_page), ("page", page)]);

        let response = self.with_auth(request).send().await?;
        let envelope: Envelope<Vec<RawRecord>> = Self::decode(response).await?;

        if !envelope.success {
            return Err(DnsError::Rejected(join_errors(&envelope.errors)));
        }

        let total_pages = envelope.result_info.and_then(|info| info.total_pages);
        Ok((envelope.result.unwrap_or_default(), total_pages))
    }
}

fn join_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ApiMessage::render)
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    async fn list_records(&self) -> DnsResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (batch, total_pages) = self.list_page(page).await?;
            let fetched = batch.len();
            records.extend(batch);

            tracing::debug!(page, fetched, total_pages = ?total_pages, "Listed DNS records page");

            match total_pages {
                Some(total) if page < total && fetched > 0 => page += 1,
                _ => break,
            }
        }

        Ok(records)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> DnsResult<UpdateAck> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);
        let request = self.http_client.put(&url).json(update);

        let response = self.with_auth(request).send().await?;
        let envelope: Envelope<serde_json::Value> = Self::decode(response).await?;

        Ok(UpdateAck {
            success: envelope.success,
            errors: envelope.errors.iter().map(ApiMessage::render).collect(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CloudflareConfig::new("ops@example.com", "key", "zone");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.per_page, 30);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_records_url_trims_trailing_slash() {
        let config = CloudflareConfig::new("a", "b", "zone-1").with_api_base("http://mock/");
        let client = CloudflareClient::new(config).unwrap();
        assert_eq!(client.records_url("zone-1"), "http://mock/zones/zone-1/dns_records");
    }

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{
            "success": false,
            "errors": [{"code": 81057, "message": "Record already exists."}],
            "result": null
        }"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!envelope.success);
        assert_eq!(join_errors(&envelope.errors), "Record already exists. (81057)");
    }

    #[test]
    fn test_join_errors_empty() {
        assert_eq!(join_errors(&[]), "no error details");
    }
}
