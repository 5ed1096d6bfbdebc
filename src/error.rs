//! Unified error handling for the repoint crate
//!
//! Domain errors ([`DnsError`], [`CloudError`], [`ReallocationError`]) stay
//! close to the code that raises them; [`Error`] wraps them at module
//! boundaries.
//!
//! No variant is fatal once the reconciliation loop runs: every failure is
//! logged, counted, and retried from scratch on the next cycle.
//!
//! # Usage
//!
//! ```rust,ignore
//! use repoint::error::{Error, RepointErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = ?err.category(), "will retry next cycle: {err}");
//!     } else {
//!         tracing::error!("operator action needed: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::cloud::CloudError;
pub use crate::dns::DnsError;
pub use crate::reallocate::ReallocationError;

/// Common trait for all repoint error types
pub trait RepointErrorTrait: std::error::Error {
    /// Check if this error can clear up on a later cycle
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (timeouts, refused connections)
    Network,
    /// An external provider answered with an error
    Provider,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the repoint crate
#[derive(Error, Debug)]
pub enum Error {
    /// Listing or reading from an external API failed
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// DNS provider errors
    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),

    /// Address provider errors
    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Address reallocation errors
    #[error("Reallocation error: {0}")]
    Reallocation(#[from] ReallocationError),

    /// DNS record still stale after the bounded retry
    #[error("Propagation failed for {record}: {reason}")]
    PropagationFailed { record: String, reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Metrics registry errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl RepointErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::ProviderUnavailable(_) => true,
            Self::Dns(_) => true,
            Self::Cloud(e) => !matches!(e, CloudError::Signing(_)),
            Self::Reallocation(_) => true,
            Self::PropagationFailed { .. } => true,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Http(_) => true,
            Self::Metrics(_) => false,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderUnavailable(_) | Self::Http(_) | Self::Io(_) => ErrorCategory::Network,
            Self::Dns(e) if e.is_transport() => ErrorCategory::Network,
            Self::Cloud(CloudError::Transport(_)) => ErrorCategory::Network,
            Self::Dns(_) | Self::Cloud(_) | Self::Reallocation(_) | Self::PropagationFailed { .. } => {
                ErrorCategory::Provider
            }
            Self::Config(_) => ErrorCategory::Config,
            Self::Json(_) | Self::Metrics(_) => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-unavailable error
    pub fn provider_unavailable(msg: impl Into<String>) -> Self {
        Self::ProviderUnavailable(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
