//! Reconciliation orchestration
//!
//! One cycle: resolve the managed inventory (cached after the first
//! success), probe every record concurrently, and for each unreachable
//! record run reallocate → notify → propagate as soon as its probe settles.
//! All per-record pipelines are joined before the cycle completes.
//!
//! # Serialization
//!
//! - Cycles never overlap: a second caller waits for the running cycle.
//! - Within a cycle, reallocation is serialized per region. The first
//!   unreachable record of a region obtains the new address; other records
//!   of that region reuse it, since they all point at the same instance.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::Instrument;

use crate::cloud::AddressProvider;
use crate::config::Config;
use crate::dns::DnsProvider;
use crate::error::{Error, Result};
use crate::inventory::{InventoryCache, InventoryResolver};
use crate::metrics::Metrics;
use crate::models::{EventKind, ManagedRecord, Outcome, ProbeOutcome, RegionProfile};
use crate::notify::EndpointNotifier;
use crate::probe::HealthProber;
use crate::propagate::DnsPropagator;
use crate::reallocate::Reallocator;

// ============================================================================
// Reports
// ============================================================================

/// Summary of one reconciliation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Cycle number, starting at 1
    pub cycle: u64,
    /// Managed records considered
    pub records: usize,
    /// Records that answered their probe
    pub healthy: usize,
    /// Unreachable records now pointing at a new address
    pub repaired: usize,
    /// Unreachable records left for the next cycle
    pub failed: usize,
    /// Whether the inventory could be resolved
    pub inventory_available: bool,
}

impl CycleReport {
    /// Metric outcome for the whole cycle
    pub fn outcome(&self) -> Outcome {
        Outcome::from(self.inventory_available && self.failed == 0)
    }
}

/// Last completed cycle, for readiness reporting
#[derive(Debug, Clone, Serialize)]
pub struct CycleStatus {
    pub report: CycleReport,
    pub completed_at: DateTime<Utc>,
}

/// Final state of one record's pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordResult {
    Healthy,
    Repaired(IpAddr),
    Failed(String),
}

/// Last completed cycle, shared with the HTTP surface
pub type SharedCycleStatus = Arc<RwLock<Option<CycleStatus>>>;

/// Per-region reallocation result shared within a cycle, with the instance
/// the address went to
type RegionSlot = Arc<Mutex<Option<(String, std::result::Result<IpAddr, String>)>>>;

// ============================================================================
// Reconciler
// ============================================================================

/// Context object owning every stage of the reconciliation loop
pub struct Reconciler {
    resolver: InventoryResolver,
    cache: InventoryCache,
    prober: HealthProber,
    reallocator: Reallocator,
    notifier: EndpointNotifier,
    propagator: DnsPropagator,
    metrics: Arc<Metrics>,
    regions: HashMap<String, RegionProfile>,
    cycle_guard: Mutex<()>,
    cycle_counter: AtomicU64,
    last_cycle: SharedCycleStatus,
}

impl Reconciler {
    /// Build a reconciler from configuration and provider handles
    pub fn new(
        config: &Config,
        dns: Arc<dyn DnsProvider>,
        addresses: Arc<dyn AddressProvider>,
        metrics: Arc<Metrics>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(config, dns, addresses, metrics, client))
    }

    /// Build a reconciler whose probes and notifications share `client`
    pub fn with_http_client(
        config: &Config,
        dns: Arc<dyn DnsProvider>,
        addresses: Arc<dyn AddressProvider>,
        metrics: Arc<Metrics>,
        client: reqwest::Client,
    ) -> Self {
        let resolver = InventoryResolver::new(
            Arc::clone(&dns),
            config.inventory.management_token.clone(),
            config.locations.clone(),
        );
        let prober = HealthProber::with_client(client.clone(), &config.probe, Arc::clone(&metrics));
        let notifier = EndpointNotifier::with_client(client, &config.notify);
        let propagator = DnsPropagator::new(dns, Arc::clone(&metrics));

        let regions = config
            .locations
            .iter()
            .map(|l| (l.code.clone(), l.clone()))
            .collect();

        Self {
            resolver,
            cache: InventoryCache::new(),
            prober,
            reallocator: Reallocator::new(addresses),
            notifier,
            propagator,
            metrics,
            regions,
            cycle_guard: Mutex::new(()),
            cycle_counter: AtomicU64::new(0),
            last_cycle: SharedCycleStatus::default(),
        }
    }

    /// Shared metrics sink
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle to the last completed cycle
    pub fn status_handle(&self) -> SharedCycleStatus {
        Arc::clone(&self.last_cycle)
    }

    /// Last completed cycle, if any
    pub async fn last_cycle(&self) -> Option<CycleStatus> {
        self.last_cycle.read().await.clone()
    }

    /// Managed inventory, resolving it on first use
    pub async fn inventory(&self) -> Result<Arc<Vec<ManagedRecord>>> {
        self.cache.get_or_resolve(&self.resolver).await
    }

    /// Probe every managed record without repairing anything
    pub async fn probe_all(&self) -> Result<Vec<(ManagedRecord, ProbeOutcome)>> {
        let records = self.inventory().await?;
        let outcomes = join_all(records.iter().map(|r| self.prober.probe(r))).await;
        Ok(records.iter().cloned().zip(outcomes).collect())
    }

    /// Run one full reconciliation cycle
    ///
    /// Never fails: every error is logged, counted, and left for the next
    /// cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_guard.lock().await;
        let cycle = self.cycle_counter.fetch_add(1, Ordering::SeqCst) + 1;

        let report = self
            .run_cycle_inner(cycle)
            .instrument(tracing::info_span!("cycle", cycle))
            .await;

        self.metrics.record_cycle(report.outcome());
        *self.last_cycle.write().await = Some(CycleStatus {
            report: report.clone(),
            completed_at: Utc::now(),
        });

        report
    }

    async fn run_cycle_inner(&self, cycle: u64) -> CycleReport {
        let mut report = CycleReport {
            cycle,
            ..Default::default()
        };

        let records = match self.inventory().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Inventory unavailable, skipping cycle");
                return report;
            }
        };
        report.inventory_available = true;
        report.records = records.len();

        // One slot per region, shared by every pipeline in this cycle
        let slots: HashMap<String, RegionSlot> = self
            .regions
            .values()
            .map(|p| (p.region.clone(), RegionSlot::default()))
            .collect();

        let results = join_all(records.iter().map(|r| self.reconcile_record(r, &slots))).await;

        for result in &results {
            match result {
                RecordResult::Healthy => report.healthy += 1,
                RecordResult::Repaired(_) => report.repaired += 1,
                RecordResult::Failed(_) => report.failed += 1,
            }
        }

        tracing::info!(
            records = report.records,
            healthy = report.healthy,
            repaired = report.repaired,
            failed = report.failed,
            "Reconciliation cycle complete"
        );

        report
    }

    /// Probe one record and repair it if unreachable
    async fn reconcile_record(
        &self,
        record: &ManagedRecord,
        slots: &HashMap<String, RegionSlot>,
    ) -> RecordResult {
        if self.prober.probe(record).await.is_healthy() {
            return RecordResult::Healthy;
        }

        match self.repair(record, slots).await {
            Ok(address) => RecordResult::Repaired(address),
            Err(e) => {
                tracing::error!(record = %record.name, error = %e, "Repair failed, will retry next cycle");
                RecordResult::Failed(e.to_string())
            }
        }
    }

    async fn repair(
        &self,
        record: &ManagedRecord,
        slots: &HashMap<String, RegionSlot>,
    ) -> Result<IpAddr> {
        let profile = self.regions.get(&record.location).ok_or_else(|| {
            Error::config(format!("no region configured for location {}", record.location))
        })?;

        let address = self.address_for(record, profile, slots).await?;

        // Best-effort; DNS is updated regardless
        self.notifier.notify(address).await;

        match self.propagator.propagate(record, address).await {
            Outcome::Ok => {
                tracing::info!(record = %record.name, %address, "Record repointed");
                Ok(address)
            }
            Outcome::Ko => Err(Error::PropagationFailed {
                record: record.name.clone(),
                reason: format!("DNS still not pointing at {address}"),
            }),
        }
    }

    /// New address for a record's region, reallocating at most once per cycle
    async fn address_for(
        &self,
        record: &ManagedRecord,
        profile: &RegionProfile,
        slots: &HashMap<String, RegionSlot>,
    ) -> Result<IpAddr> {
        let Some(slot) = slots.get(&profile.region) else {
            return Err(Error::config(format!("no slot for region {}", profile.region)));
        };
        let mut slot = slot.lock().await;

        if let Some((instance, previous)) = slot.as_ref() {
            if *instance != profile.instance {
                return Err(Error::config(format!(
                    "region {} already reallocated for {instance}, not {}",
                    profile.region, profile.instance
                )));
            }
            tracing::debug!(record = %record.name, region = %profile.region, "Reusing this cycle's reallocation result");
            return previous.clone().map_err(|reason| {
                Error::provider_unavailable(format!(
                    "reallocation already failed in {} this cycle: {reason}",
                    profile.region
                ))
            });
        }

        let result = self
            .reallocator
            .reallocate(&profile.region, &profile.instance)
            .await;
        self.metrics.record(
            &record.name,
            EventKind::Reallocate,
            Outcome::from(result.is_ok()),
        );

        *slot = Some((
            profile.instance.clone(),
            result.as_ref().copied().map_err(|e| e.to_string()),
        ));
        Ok(result?)
    }
}
