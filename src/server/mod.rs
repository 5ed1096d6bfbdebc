//! HTTP surface
//!
//! Read-only endpoints for scrapers and orchestrators:
//!
//! | Route | Content |
//! |---|---|
//! | `GET /metrics` | Event counters, Prometheus text format |
//! | `GET /monitor` | Same as `/metrics` |
//! | `GET /health/live` | Process liveness |
//! | `GET /health/ready` | Last completed reconciliation cycle |

pub mod health;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;
use crate::reconcile::SharedCycleStatus;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Event counters
    pub metrics: Arc<Metrics>,

    /// Last completed reconciliation cycle
    pub cycle_status: SharedCycleStatus,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>, cycle_status: SharedCycleStatus) -> Self {
        Self {
            metrics,
            cycle_status,
            start_time: Instant::now(),
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {reason}")]
    BindError { addr: SocketAddr, reason: String },

    #[error("Server error: {0}")]
    ServeError(String),
}

// ============================================================================
// Router
// ============================================================================

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/monitor", get(metrics_handler))
        .route("/health/live", get(health::liveness_probe))
        .route("/health/ready", get(health::readiness_probe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindError {
            addr,
            reason: e.to_string(),
        })?;

    tracing::info!("Metrics server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::ServeError(e.to_string()))?;

    tracing::info!("Metrics server shutdown complete");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
