//! Quote REST API
//!
//! Thin JSON pass-through to `QuoteService`. Prices serialize as decimal
//! strings.
//!
//! # Endpoints
//!
//! - `GET /api/v1/instruments` - All predefined quotes, in list order
//! - `PUT /api/v1/instruments/sync-all` - Same list, served from the cache
//! - `GET /api/v1/instruments/{symbol}` - One quote (cache-first)
//! - `PUT /api/v1/instruments/{symbol}/sync` - Force a refresh from the quote API
//! - `GET /api/v1/instruments/debug/{symbol}` - Troubleshooting report
//! - `GET /api/v1/cache` - Cache statistics
//! - `DELETE /api/v1/cache` - Drop every cached quote

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::QuoteService;
use crate::domain::quote::{Symbol, normalize_symbol};

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// What was wrong with the request.
    pub error: String,
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    /// Cached snapshots, placeholders included.
    pub entries: usize,
    /// Predefined symbols with real data.
    pub with_real_data: usize,
    /// Length of the predefined list.
    pub predefined: usize,
    /// When the scheduler last completed a tick.
    pub last_update: DateTime<Utc>,
}

/// Build the API router over `service`.
#[must_use]
pub fn router(service: Arc<QuoteService>) -> Router {
    Router::new()
        .route("/api/v1/instruments", get(list_instruments))
        .route("/api/v1/instruments/sync-all", put(list_instruments))
        .route("/api/v1/instruments/{symbol}", get(get_instrument))
        .route("/api/v1/instruments/{symbol}/sync", put(sync_instrument))
        .route("/api/v1/instruments/debug/{symbol}", get(debug_instrument))
        .route("/api/v1/cache", get(cache_status).delete(clear_cache))
        .with_state(service)
}

/// Quote REST API server.
pub struct ApiServer {
    port: u16,
    service: Arc<QuoteService>,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a new API server.
    #[must_use]
    pub const fn new(port: u16, service: Arc<QuoteService>, cancel: CancellationToken) -> Self {
        Self {
            port,
            service,
            cancel,
        }
    }

    /// Serve requests until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ApiServerError` if binding fails or the server stops with an
    /// I/O error.
    pub async fn run(self) -> Result<(), ApiServerError> {
        let app = router(self.service);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Quote API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Quote API stopped");
        Ok(())
    }
}

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

async fn list_instruments(State(service): State<Arc<QuoteService>>) -> impl IntoResponse {
    Json(service.get_all_predefined_quotes())
}

async fn get_instrument(
    State(service): State<Arc<QuoteService>>,
    Path(raw): Path<String>,
) -> Response {
    match parse_symbol(&raw) {
        Ok(symbol) => Json(service.get_quote(&symbol).await).into_response(),
        Err(rejection) => rejection,
    }
}

async fn sync_instrument(
    State(service): State<Arc<QuoteService>>,
    Path(raw): Path<String>,
) -> Response {
    match parse_symbol(&raw) {
        Ok(symbol) => Json(service.refresh_quote(&symbol).await).into_response(),
        Err(rejection) => rejection,
    }
}

async fn debug_instrument(
    State(service): State<Arc<QuoteService>>,
    Path(raw): Path<String>,
) -> Response {
    match parse_symbol(&raw) {
        Ok(symbol) => Json(service.diagnose(&symbol).await).into_response(),
        Err(rejection) => rejection,
    }
}

async fn cache_status(State(service): State<Arc<QuoteService>>) -> impl IntoResponse {
    Json(CacheStatus {
        entries: service.cache_size(),
        with_real_data: service.real_data_count(),
        predefined: service.predefined_symbols().len(),
        last_update: service.last_update_time(),
    })
}

async fn clear_cache(State(service): State<Arc<QuoteService>>) -> impl IntoResponse {
    service.clear_cache();
    StatusCode::NO_CONTENT
}

fn parse_symbol(raw: &str) -> Result<Symbol, Response> {
    normalize_symbol(raw).ok_or_else(|| {
        let body = ErrorBody {
            error: "symbol must not be blank".to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    })
}
