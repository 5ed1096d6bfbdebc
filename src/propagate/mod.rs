//! DNS propagation
//!
//! Writes a new address into a managed record. A provider-reported failure
//! (`success: false`) is retried exactly once; a transport failure is final
//! for this cycle. One metric is recorded per attempt.

use std::net::IpAddr;
use std::sync::Arc;

use crate::dns::{DnsProvider, RecordUpdate, UpdateAck};
use crate::metrics::Metrics;
use crate::models::{EventKind, ManagedRecord, Outcome};

/// Maximum provider calls per propagation
pub const MAX_ATTEMPTS: u32 = 2;

/// Result of a single update call
enum Attempt {
    Applied,
    Rejected(String),
    Transport(String),
}

/// Points managed records at new addresses
pub struct DnsPropagator {
    dns: Arc<dyn DnsProvider>,
    metrics: Arc<Metrics>,
}

impl DnsPropagator {
    pub fn new(dns: Arc<dyn DnsProvider>, metrics: Arc<Metrics>) -> Self {
        Self { dns, metrics }
    }

    /// Set `record`'s content to `address`
    ///
    /// The returned outcome is that of the last attempt made.
    pub async fn propagate(&self, record: &ManagedRecord, address: IpAddr) -> Outcome {
        let update = RecordUpdate::a_record(&record.name, address.to_string());

        for attempt in 1..=MAX_ATTEMPTS {
            let result = self.attempt(record, &update).await;
            let outcome = Outcome::from(matches!(result, Attempt::Applied));
            self.metrics
                .record(&record.name, EventKind::Propagate, outcome);

            match result {
                Attempt::Applied => {
                    tracing::info!(record = %record.name, %address, attempt, "DNS record updated");
                    return Outcome::Ok;
                }
                Attempt::Transport(reason) => {
                    tracing::error!(record = %record.name, %address, attempt, error = %reason, "DNS update failed");
                    return Outcome::Ko;
                }
                Attempt::Rejected(reason) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(record = %record.name, %address, attempt, error = %reason, "DNS update rejected, retrying");
                }
                Attempt::Rejected(reason) => {
                    tracing::error!(record = %record.name, %address, attempt, error = %reason, "DNS update rejected after retry");
                }
            }
        }

        Outcome::Ko
    }

    async fn attempt(&self, record: &ManagedRecord, update: &RecordUpdate) -> Attempt {
        match self
            .dns
            .update_record(&record.zone_id, &record.id, update)
            .await
        {
            Ok(UpdateAck { success: true, .. }) => Attempt::Applied,
            Ok(ack) => Attempt::Rejected(if ack.errors.is_empty() {
                "provider reported failure".to_string()
            } else {
                ack.errors.join("; ")
            }),
            Err(e) if e.is_transport() => Attempt::Transport(e.to_string()),
            Err(e) => Attempt::Rejected(e.to_string()),
        }
    }
}
