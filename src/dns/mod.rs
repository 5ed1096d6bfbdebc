//! DNS provider contract
//!
//! The reconciler only needs two calls from a DNS provider: list every record
//! in the zone, and overwrite one record's content. [`DnsProvider`] captures
//! exactly that; [`cloudflare::CloudflareClient`] is the production
//! implementation.

pub mod cloudflare;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cloudflare::{CloudflareClient, CloudflareConfig};

/// Result type for DNS provider operations
pub type DnsResult<T> = Result<T, DnsError>;

/// Errors returned by a DNS provider
#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    /// The request never produced a response
    #[error("DNS provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a readable provider envelope
    #[error("DNS provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The provider answered but reported failure
    #[error("DNS provider rejected the request: {0}")]
    Rejected(String),

    /// Response body could not be decoded
    #[error("Failed to decode DNS provider response: {0}")]
    Decode(String),
}

impl DnsError {
    /// Whether the request failed before the provider could acknowledge it
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. } | Self::Decode(_))
    }
}

/// A record as returned by the provider's list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// New content for an A-record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl RecordUpdate {
    /// Automatic TTL; the provider's minimum
    pub const MIN_TTL: u32 = 1;

    /// A-record update with minimum TTL and proxying disabled
    pub fn a_record(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            record_type: "A",
            name: name.into(),
            content: content.into(),
            ttl: Self::MIN_TTL,
            proxied: false,
        }
    }
}

/// Provider acknowledgement of an update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAck {
    /// Provider-level `success` flag
    pub success: bool,

    /// Provider error messages, if any
    pub errors: Vec<String>,
}

impl UpdateAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
        }
    }
}

/// DNS provider operations used by the reconciler
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record the provider holds for the configured zone
    async fn list_records(&self) -> DnsResult<Vec<RawRecord>>;

    /// Overwrite a record's content
    ///
    /// `Ok` means the provider answered; inspect [`UpdateAck::success`] for
    /// whether it applied the change. `Err` means no acknowledgement arrived.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> DnsResult<UpdateAck>;
}
