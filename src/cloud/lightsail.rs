//! AWS Lightsail static IP client
//!
//! Speaks the Lightsail JSON protocol directly over reqwest:
//! `POST /` with an `X-Amz-Target` header naming the operation, signed with
//! SigV4. The region selects the endpoint host for every call.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::sigv4::{self, Credentials, SigningRequest};
use super::{AddressProvider, CloudError, CloudResult, StaticAddress};

const SERVICE: &str = "lightsail";
const TARGET_PREFIX: &str = "Lightsail_20161128";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Message fragment Lightsail uses when a static IP name is taken
const NAME_IN_USE_MARKER: &str = "already in use";

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the Lightsail client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsailConfig {
    pub access_key_id: String,

    pub secret_access_key: String,

    /// Session token for temporary credentials
    pub session_token: Option<String>,

    /// Base URL replacing `https://lightsail.{region}.amazonaws.com`
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LightsailConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl LightsailConfig {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            endpoint: None,
            timeout_secs: 30,
        }
    }

    /// Send every call to a fixed endpoint instead of the regional host
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetStaticIpResponse {
    static_ip: Option<WireStaticIp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStaticIp {
    name: String,
    ip_address: Option<String>,
    attached_to: Option<String>,
    #[serde(default)]
    is_attached: bool,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl ServiceError {
    /// `com.amazonaws...#InvalidInputException` -> `InvalidInputException`
    fn code(&self) -> &str {
        self.error_type
            .rsplit('#')
            .next()
            .unwrap_or(self.error_type.as_str())
    }
}

// ============================================================================
// Lightsail Client
// ============================================================================

/// Lightsail static IP client
pub struct LightsailClient {
    credentials: Credentials,
    endpoint: Option<String>,
    http_client: Client,
}

impl LightsailClient {
    pub fn new(config: LightsailConfig) -> CloudResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            credentials: Credentials {
                access_key_id: config.access_key_id,
                secret_access_key: config.secret_access_key,
                session_token: config.session_token,
            },
            endpoint: config.endpoint,
            http_client,
        })
    }

    fn endpoint_for(&self, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://lightsail.{region}.amazonaws.com"),
        }
    }

    /// Issue one signed call and return the decoded JSON body
    async fn call(
        &self,
        region: &str,
        operation: &str,
        payload: serde_json::Value,
    ) -> CloudResult<serde_json::Value> {
        let endpoint = self.endpoint_for(region);
        let host = host_of(&endpoint);
        let target = format!("{TARGET_PREFIX}.{operation}");
        let body = serde_json::to_vec(&payload).map_err(|e| CloudError::Decode(e.to_string()))?;

        let signed = sigv4::sign(
            &self.credentials,
            &SigningRequest {
                host: &host,
                region,
                service: SERVICE,
                target: &target,
                content_type: CONTENT_TYPE,
                body: &body,
                timestamp: Utc::now(),
            },
        )?;

        let mut request = self
            .http_client
            .post(format!("{endpoint}/"))
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        tracing::debug!(region, operation, "Lightsail request");

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(serde_json::Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| CloudError::Decode(e.to_string()));
        }

        Err(classify_error(status.as_u16(), &text))
    }
}

/// Host (with port, if any) of a base URL
fn host_of(endpoint: &str) -> String {
    let without_scheme = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

fn classify_error(status: u16, body: &str) -> CloudError {
    match serde_json::from_str::<ServiceError>(body) {
        Ok(err) if err.message.contains(NAME_IN_USE_MARKER) => CloudError::NameInUse(err.message),
        Ok(err) => CloudError::Service {
            code: if err.code().is_empty() {
                format!("HTTP {status}")
            } else {
                err.code().to_string()
            },
            message: err.message,
        },
        Err(_) => CloudError::Service {
            code: format!("HTTP {status}"),
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl AddressProvider for LightsailClient {
    async fn allocate(&self, region: &str, name: &str) -> CloudResult<()> {
        self.call(region, "AllocateStaticIp", json!({ "staticIpName": name }))
            .await?;
        Ok(())
    }

    async fn release(&self, region: &str, name: &str) -> CloudResult<()> {
        self.call(region, "ReleaseStaticIp", json!({ "staticIpName": name }))
            .await?;
        Ok(())
    }

    async fn attach(&self, region: &str, name: &str, instance: &str) -> CloudResult<()> {
        self.call(
            region,
            "AttachStaticIp",
            json!({ "staticIpName": name, "instanceName": instance }),
        )
        .await?;
        Ok(())
    }

    async fn get(&self, region: &str, name: &str) -> CloudResult<StaticAddress> {
        let body = self
            .call(region, "GetStaticIp", json!({ "staticIpName": name }))
            .await?;

        let response: GetStaticIpResponse =
            serde_json::from_value(body).map_err(|e| CloudError::Decode(e.to_string()))?;
        let static_ip = response
            .static_ip
            .ok_or_else(|| CloudError::Decode("response has no staticIp".to_string()))?;
        let ip_address = static_ip
            .ip_address
            .ok_or_else(|| CloudError::Decode(format!("{} has no ipAddress", static_ip.name)))?;

        Ok(StaticAddress {
            name: static_ip.name,
            ip_address,
            attached_to: static_ip.attached_to.filter(|_| static_ip.is_attached),
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
    fn test_regional_endpoint() {
        let client = LightsailClient::new(LightsailConfig::new("id", "secret")).unwrap();
        assert_eq!(
            client.endpoint_for("ap-southeast-1"),
            "https://lightsail.ap-southeast-1.amazonaws.com"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let config = LightsailConfig::new("id", "secret").with_endpoint("http://127.0.0.1:9000/");
        let client = LightsailClient::new(config).unwrap();
        assert_eq!(client.endpoint_for("ap-northeast-1"), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("http://127.0.0.1:9000"), "127.0.0.1:9000");
        assert_eq!(
            host_of("https://lightsail.ap-northeast-1.amazonaws.com/"),
            "lightsail.ap-northeast-1.amazonaws.com"
        );
    }

    #[test]
    fn test_classify_name_in_use() {
        let body = r#"{"__type":"InvalidInputException","message":"Some names are already in use: static-ap-northeast-1"}"#;
        assert!(classify_error(400, body).is_name_in_use());
    }

    #[test]
    fn test_classify_service_error() {
        let body = r#"{"__type":"com.amazonaws.lightsail#NotFoundException","Message":"nope"}"#;
        match classify_error(400, body) {
            CloudError::Service { code, message } => {
                assert_eq!(code, "NotFoundException");
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_unparsable_body() {
        match classify_error(502, "Bad Gateway") {
            CloudError::Service { code, .. } => assert_eq!(code, "HTTP 502"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
