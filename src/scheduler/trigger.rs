//! Reconciliation trigger
//!
//! Sleeps until the schedule's next fire time, runs one cycle to completion,
//! then computes the next fire time from the current clock. Fire times that
//! pass while a cycle is running are skipped, never queued.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

use super::error::SchedulerResult;
use super::schedule::CronSchedule;
use crate::reconcile::{CycleReport, Reconciler};

/// Something that runs one reconciliation cycle
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self) -> CycleReport;
}

#[async_trait]
impl CycleRunner for Reconciler {
    async fn run_cycle(&self) -> CycleReport {
        Reconciler::run_cycle(self).await
    }
}

/// Invokes a [`CycleRunner`] on a cron schedule
pub struct ReconcileTrigger {
    schedule: CronSchedule,
    runner: Arc<dyn CycleRunner>,
    run_on_startup: bool,
}

impl ReconcileTrigger {
    pub fn new(schedule: CronSchedule, runner: Arc<dyn CycleRunner>) -> Self {
        Self {
            schedule,
            runner,
            run_on_startup: false,
        }
    }

    /// Run one cycle immediately when started
    pub fn run_on_startup(mut self, value: bool) -> Self {
        self.run_on_startup = value;
        self
    }

    /// Start the trigger loop (runs until `shutdown` flips to true or its
    /// sender is dropped)
    ///
    /// A running cycle is allowed to finish before shutdown is observed.
    pub async fn start(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerResult<()> {
        tracing::info!(schedule = %self.schedule, "Reconciliation trigger started");

        if self.run_on_startup {
            self.fire().await;
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = self.schedule.next()?;
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tracing::debug!(next = %next, wait_secs = wait.as_secs(), "Waiting for next fire time");

            tokio::select! {
                _ = tokio::time::sleep(wait) => self.fire().await,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Reconciliation trigger stopped");
        Ok(())
    }

    async fn fire(&self) {
        let report = self.runner.run_cycle().await;
        tracing::debug!(cycle = report.cycle, outcome = %report.outcome(), "Triggered cycle finished");
    }
}
