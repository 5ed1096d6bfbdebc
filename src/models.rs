//! Core data structures for repoint
//!
//! This module defines the types shared between the reconciliation stages:
//! - [`ManagedRecord`] - A DNS A-record under management
//! - [`RegionProfile`] - Static mapping from a location code to its cloud region
//! - [`ProbeOutcome`] - Result of a liveness probe
//! - [`EventKind`] / [`Outcome`] - Metric event labels

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Managed Record
// ============================================================================

/// A DNS A-record this system keeps pointed at a live endpoint
///
/// Built by the inventory resolver from a raw provider record. A record only
/// exists in this form when its name carried a recognized location token, so
/// `location` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Provider-assigned record identifier
    pub id: String,

    /// Zone the record lives in
    pub zone_id: String,

    /// Fully-qualified domain name (encodes the location token)
    pub name: String,

    /// Location code derived from `name`
    pub location: String,
}

impl ManagedRecord {
    /// Create a new managed record
    pub fn new(
        id: impl Into<String>,
        zone_id: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            zone_id: zone_id.into(),
            name: name.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for ManagedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.location)
    }
}

// ============================================================================
// Region Profile
// ============================================================================

/// Maps a location code to the cloud region and replacement instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    /// Location code as it appears in record names (e.g. `jp`)
    pub code: String,

    /// Cloud region identifier (e.g. `ap-northeast-1`)
    pub region: String,

    /// Instance that receives the replacement address
    pub instance: String,
}

impl RegionProfile {
    pub fn new(
        code: impl Into<String>,
        region: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            region: region.into(),
            instance: instance.into(),
        }
    }

    /// Token searched for in record names
    pub fn name_token(&self) -> String {
        format!("-{}-", self.code)
    }
}

// ============================================================================
// Probe Outcome
// ============================================================================

/// Why a probe judged an endpoint unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreachableReason {
    /// The request timed out (suspected network-level blocking)
    TimedOut,
    /// The connection was refused (service down)
    Refused,
    /// Any other transport failure
    Other,
}

impl UnreachableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimedOut => "timed-out",
            Self::Refused => "refused",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ProbeOutcome {
    Healthy,
    Unreachable(UnreachableReason),
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Metric outcome for this probe result
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Healthy => Outcome::Ok,
            Self::Unreachable(_) => Outcome::Ko,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Unreachable(reason) => write!(f, "unreachable ({reason})"),
        }
    }
}

// ============================================================================
// Metric Labels
// ============================================================================

/// Kind of outcome-producing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Probe,
    Reallocate,
    Propagate,
    Cycle,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Reallocate => "reallocate",
            Self::Propagate => "propagate",
            Self::Cycle => "cycle",
        }
    }
}

/// Binary outcome of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Ko => "KO",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        if success {
            Self::Ok
        } else {
            Self::Ko
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
