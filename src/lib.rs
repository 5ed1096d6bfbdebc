//! repoint - keeps DNS-named endpoints reachable
//!
//! Detects managed hosts whose public address stopped answering, moves a
//! fresh static address onto the region's replacement instance, and points
//! the DNS record at it.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Core data structures and types
//! - [`dns`] - DNS provider contract and the Cloudflare client
//! - [`cloud`] - Static address provider contract and the Lightsail client
//! - [`inventory`] - Managed record resolution and caching
//! - [`probe`] - Liveness probing
//! - [`reallocate`] - Static address reallocation
//! - [`notify`] - New-address notification
//! - [`propagate`] - DNS record updates with bounded retry
//! - [`reconcile`] - The reconciliation cycle
//! - [`metrics`] - Event counters
//! - [`scheduler`] - Cron trigger
//! - [`server`] - Metrics and health HTTP surface
//! - [`config`] - Configuration management and settings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use repoint::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("repoint.toml".as_ref())?;
//!     let dns = CloudflareClient::new(config.cloudflare.clone())?;
//!     let cloud = LightsailClient::new(config.lightsail.clone())?;
//!     let metrics = Arc::new(Metrics::new()?);
//!
//!     let reconciler = Reconciler::new(&config, Arc::new(dns), Arc::new(cloud), metrics)?;
//!     let report = reconciler.run_cycle().await;
//!     println!("repaired {} of {}", report.repaired, report.records);
//!     Ok(())
//! }
//! ```

pub mod cloud;
pub mod config;
pub mod dns;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod notify;
pub mod probe;
pub mod propagate;
pub mod reallocate;
pub mod reconcile;
pub mod scheduler;
pub mod server;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cloud::{AddressProvider, LightsailClient, LightsailConfig};
    pub use crate::config::Config;
    pub use crate::dns::{CloudflareClient, CloudflareConfig, DnsProvider};
    pub use crate::error::{Error, ErrorCategory, RepointErrorTrait, Result};
    pub use crate::metrics::Metrics;
    pub use crate::models::{ManagedRecord, Outcome, ProbeOutcome, RegionProfile};
    pub use crate::reconcile::{CycleReport, Reconciler};
}

// Direct re-exports for convenience
pub use models::{ManagedRecord, ProbeOutcome, RegionProfile};
