//! Liveness and readiness endpoints
//!
//! - `/health/live` answers 200 whenever the process can serve HTTP.
//! - `/health/ready` answers 200 once a reconciliation cycle has completed,
//!   503 before that.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::AppState;
use crate::models::Outcome;

// ============================================================================
// Health Status Types
// ============================================================================

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Starting,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Starting => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Liveness probe response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: String,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_outcome: Option<Outcome>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness probe handler
pub async fn liveness_probe(State(state): State<AppState>) -> impl IntoResponse {
    let response = LivenessResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe handler
pub async fn readiness_probe(State(state): State<AppState>) -> impl IntoResponse {
    let last = state.cycle_status.read().await.clone();

    let response = match last {
        Some(status) => ReadinessResponse {
            status: HealthStatus::Healthy,
            timestamp: chrono::Utc::now().to_rfc3339(),
            last_cycle: Some(status.report.cycle),
            last_cycle_completed_at: Some(status.completed_at.to_rfc3339()),
            last_cycle_outcome: Some(status.report.outcome()),
        },
        None => ReadinessResponse {
            status: HealthStatus::Starting,
            timestamp: chrono::Utc::now().to_rfc3339(),
            last_cycle: None,
            last_cycle_completed_at: None,
            last_cycle_outcome: None,
        },
    };

    (response.status.status_code(), Json(response))
}
