//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, cache coverage reporting, and Prometheus
//! metrics. Runs on its own port, separate from the quote API.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Liveness probe (simple OK)
//! - `GET /readyz` - Readiness probe (real data cached or a tick completed)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{QuoteService, RotationScheduler, SchedulerStatus};
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Cache coverage.
    pub cache: CacheHealth,
    /// Scheduler state, absent when the scheduler is disabled.
    pub scheduler: Option<SchedulerStatus>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every predefined symbol has real data.
    Healthy,
    /// Serving, but some symbols only have placeholders.
    Degraded,
    /// The background refresh has stopped.
    Unhealthy,
}

/// Cache coverage.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    /// Cached snapshots, placeholders included.
    pub entries: usize,
    /// Predefined symbols with real data.
    pub with_real_data: usize,
    /// Length of the predefined list.
    pub predefined: usize,
    /// When the scheduler last completed a tick.
    pub last_update: DateTime<Utc>,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    service: Arc<QuoteService>,
    scheduler: Option<Arc<RotationScheduler>>,
}

impl HealthServerState {
    /// Create new health server state. Pass `None` when the scheduler is disabled.
    #[must_use]
    pub fn new(
        version: String,
        service: Arc<QuoteService>,
        scheduler: Option<Arc<RotationScheduler>>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            service,
            scheduler,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Build the health router.
#[must_use]
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);

    let tick_completed = response
        .scheduler
        .as_ref()
        .is_some_and(|scheduler| scheduler.cycles_completed > 0);

    if response.cache.with_real_data > 0 || tick_completed {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let cache = CacheHealth {
        entries: state.service.cache_size(),
        with_real_data: state.service.real_data_count(),
        predefined: state.service.predefined_symbols().len(),
        last_update: state.service.last_update_time(),
    };
    let scheduler = state.scheduler.as_ref().map(|scheduler| scheduler.status());

    HealthResponse {
        status: determine_health_status(&cache, scheduler.as_ref()),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        cache,
        scheduler,
    }
}

fn determine_health_status(cache: &CacheHealth, scheduler: Option<&SchedulerStatus>) -> HealthStatus {
    if scheduler.is_some_and(|status| status.stopped) {
        return HealthStatus::Unhealthy;
    }
    if cache.with_real_data >= cache.predefined {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
