//! Prometheus metrics for the reconciliation loop
//!
//! One counter family, `repoint_event_count`, keyed by
//! `(location, event, status)`. Every outcome-producing step increments it:
//! probes, reallocations, DNS propagation attempts and whole cycles.
//!
//! # Usage
//!
//! The [`Metrics`] sink owns its own registry and is shared through an `Arc`
//! by the reconciler and the HTTP surface, so tests get isolated counters.
//!
//! ```ignore
//! let metrics = Arc::new(Metrics::new()?);
//! metrics.record("nasi-campur-jp-1", EventKind::Probe, Outcome::Ko);
//! let text = metrics.encode()?;
//! ```

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::models::{EventKind, Outcome};

/// Name of the event counter family
pub const EVENT_COUNTER: &str = "repoint_event_count";

/// Location label used for cycle-level events
pub const CYCLE_LOCATION: &str = "all";

// ============================================================================
// Metrics Sink
// ============================================================================

/// Process-wide event counters
pub struct Metrics {
    registry: Registry,
    events: IntCounterVec,
}

impl Metrics {
    /// Create a sink with a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events = IntCounterVec::new(
            Opts::new(EVENT_COUNTER, "Reconciliation events by location, kind and status"),
            &["location", "event", "status"],
        )?;
        registry.register(Box::new(events.clone()))?;

        Ok(Self { registry, events })
    }

    /// Increment the counter for one event
    pub fn record(&self, location: &str, kind: EventKind, outcome: Outcome) {
        self.events
            .with_label_values(&[location, kind.as_str(), outcome.as_str()])
            .inc();
    }

    /// Record a cycle-level event
    pub fn record_cycle(&self, outcome: Outcome) {
        self.record(CYCLE_LOCATION, EventKind::Cycle, outcome);
    }

    /// Current value of one counter
    pub fn count(&self, location: &str, kind: EventKind, outcome: Outcome) -> u64 {
        self.events
            .get_metric_with_label_values(&[location, kind.as_str(), outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Content type of [`Metrics::encode`] output
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

// ============================================================================
// Tests
// ============================================================================
