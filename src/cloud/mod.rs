//! Cloud address provider contract
//!
//! Named static addresses ("reservations") are allocated, released, attached
//! to an instance, and read back, each call scoped to a region.
//! [`AddressProvider`] is the seam; [`lightsail::LightsailClient`] talks to
//! AWS Lightsail.

pub mod lightsail;
pub mod sigv4;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use lightsail::{LightsailClient, LightsailConfig};

/// Result type for address provider operations
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors returned by an address provider
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// A reservation with this name already exists
    #[error("Static address name already in use: {0}")]
    NameInUse(String),

    /// The provider rejected the call
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The request never produced a response
    #[error("Address provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request signing failed
    #[error("Failed to sign request: {0}")]
    Signing(String),

    /// Response body could not be decoded
    #[error("Failed to decode address provider response: {0}")]
    Decode(String),
}

impl CloudError {
    pub fn is_name_in_use(&self) -> bool {
        matches!(self, Self::NameInUse(_))
    }
}

/// A named public address held by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAddress {
    /// Reservation name
    pub name: String,

    /// Assigned public address
    pub ip_address: String,

    /// Instance the address is attached to, if any
    pub attached_to: Option<String>,
}

/// Deterministic reservation name for a region
pub fn reservation_name(region: &str) -> String {
    format!("static-{region}")
}

/// Static address operations used by the reallocator
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// Create a reservation; fails with [`CloudError::NameInUse`] if one exists
    async fn allocate(&self, region: &str, name: &str) -> CloudResult<()>;

    /// Release an existing reservation
    async fn release(&self, region: &str, name: &str) -> CloudResult<()>;

    /// Attach a reservation to an instance
    async fn attach(&self, region: &str, name: &str, instance: &str) -> CloudResult<()>;

    /// Read a reservation back
    async fn get(&self, region: &str, name: &str) -> CloudResult<StaticAddress>;
}
