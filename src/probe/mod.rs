//! Liveness probing of managed endpoints
//!
//! A probe is a bare GET against `http://{record}:{port}{path}`. Any response
//! at all counts as healthy; only transport failures mark an endpoint
//! unreachable, classified by cause:
//!
//! - timeout: the address is probably blocked, so it gets replaced
//! - connection refused: the host answers but the service is down
//! - anything else
//!
//! The prober never returns an error. Every failure becomes a
//! [`ProbeOutcome`].

use reqwest::Client;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProbeConfig;
use crate::metrics::Metrics;
use crate::models::{EventKind, ManagedRecord, ProbeOutcome, UnreachableReason};

/// Issues liveness probes and records their outcomes
pub struct HealthProber {
    client: Client,
    port: u16,
    path: String,
    timeout: Duration,
    metrics: Arc<Metrics>,
}

impl HealthProber {
    /// Create a prober from endpoint settings
    pub fn new(config: &ProbeConfig, metrics: Arc<Metrics>) -> reqwest::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config, metrics))
    }

    /// Create a prober on a shared HTTP client
    ///
    /// The configured timeout is applied per request.
    pub fn with_client(client: Client, config: &ProbeConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            port: config.port,
            path: config.path.clone(),
            timeout: config.timeout(),
            metrics,
        }
    }

    /// URL probed for a record
    pub fn probe_url(&self, record: &ManagedRecord) -> String {
        format!("http://{}:{}{}", record.name, self.port, self.path)
    }

    /// Probe one record
    pub async fn probe(&self, record: &ManagedRecord) -> ProbeOutcome {
        let url = self.probe_url(record);

        let outcome = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => {
                tracing::info!(record = %record.name, status = %response.status(), "Endpoint reachable");
                ProbeOutcome::Healthy
            }
            Err(e) => {
                let reason = classify(&e);
                match reason {
                    UnreachableReason::TimedOut => tracing::warn!(
                        record = %record.name,
                        "Probe timed out, address may be blocked; scheduling a new address"
                    ),
                    UnreachableReason::Refused => tracing::error!(
                        record = %record.name,
                        "Connection refused, service may not be running"
                    ),
                    UnreachableReason::Other => tracing::warn!(
                        record = %record.name,
                        error = %e,
                        "Probe failed"
                    ),
                }
                ProbeOutcome::Unreachable(reason)
            }
        };

        self.metrics
            .record(&record.name, EventKind::Probe, outcome.outcome());
        outcome
    }
}

/// Classify a transport error into an unreachable reason
pub fn classify(error: &reqwest::Error) -> UnreachableReason {
    if error.is_timeout() {
        return UnreachableReason::TimedOut;
    }

    match io_error_kind(error) {
        Some(io::ErrorKind::ConnectionRefused) => UnreachableReason::Refused,
        Some(io::ErrorKind::TimedOut) => UnreachableReason::TimedOut,
        Some(_) => UnreachableReason::Other,
        // Some connectors wrap the OS error in their own type
        None if error.is_connect() && chain_mentions(error, "refused") => {
            UnreachableReason::Refused
        }
        None => UnreachableReason::Other,
    }
}

fn chain_mentions(error: &reqwest::Error, needle: &str) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        if err.to_string().to_lowercase().contains(needle) {
            return true;
        }
        source = err.source();
    }
    false
}

/// Walk the source chain looking for the underlying I/O error
fn io_error_kind(error: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = err.source();
    }
    None
}
