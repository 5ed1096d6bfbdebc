//! Reconciliation scheduling
//!
//! - [`schedule`] - Cron expression parsing and next-fire computation
//! - [`trigger`] - The loop that runs a cycle at each fire time
//! - [`error`] - Scheduler errors
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use repoint::scheduler::{CronSchedule, ReconcileTrigger};
//! use tokio::sync::watch;
//!
//! let schedule = CronSchedule::parse("*/5 * * * *")?;
//! let trigger = ReconcileTrigger::new(schedule, reconciler).run_on_startup(true);
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! tokio::spawn(async move { trigger.start(shutdown_rx).await });
//! // ...
//! shutdown_tx.send(true)?;
//! ```

pub mod error;
pub mod schedule;
pub mod trigger;

pub use error::{SchedulerError, SchedulerResult};
pub use schedule::CronSchedule;
pub use trigger::{CycleRunner, ReconcileTrigger};
