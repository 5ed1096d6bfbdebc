//! Cron schedule parsing
//!
//! Accepts classic 5-field expressions (minute first) as well as the
//! seconds-first 6/7-field form the `cron` crate understands natively.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

use super::error::{SchedulerError, SchedulerResult};

/// A parsed cron expression
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// Parse a cron expression
    ///
    /// Five fields are read as `min hour day month weekday` and fire at
    /// second zero.
    pub fn parse(expression: &str) -> SchedulerResult<Self> {
        let trimmed = expression.trim();
        let normalized = match trimmed.split_whitespace().count() {
            5 => format!("0 {trimmed}"),
            _ => trimmed.to_string(),
        };

        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| SchedulerError::invalid_expression(trimmed, e.to_string()))?;

        Ok(Self {
            expression: trimmed.to_string(),
            schedule,
        })
    }

    /// Expression as configured
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Next fire time from now
    pub fn next(&self) -> SchedulerResult<DateTime<Utc>> {
        self.next_after(Utc::now())
            .ok_or_else(|| SchedulerError::NoUpcomingFireTime {
                expression: self.expression.clone(),
            })
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
