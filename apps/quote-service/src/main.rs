//! Quote Service Binary
//!
//! Starts the quote cache, its background refresh and the HTTP endpoints.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-service
//! ```
//!
//! # Environment Variables
//!
//! ## Upstream
//! - `ALPHA_VANTAGE_API_KEY`: API key (default: demo)
//! - `ALPHA_VANTAGE_BASE_URL`: API base URL (default: <https://www.alphavantage.co>)
//! - `ALPHA_VANTAGE_TIMEOUT_SECS`: Request timeout (default: 15)
//! - `QUOTE_RATE_LIMIT_CALLS`: Calls allowed per window (default: 5)
//! - `QUOTE_RATE_LIMIT_WINDOW_MS`: Window length (default: 60000)
//!
//! ## Scheduler
//! - `QUOTE_SCHEDULER_ENABLED`: Run the background refresh (default: true)
//! - `QUOTE_SYMBOLS_PER_CYCLE`: Symbols refreshed per tick (default: 4)
//! - `QUOTE_TICK_INTERVAL_SECS`: Time between ticks (default: 300)
//! - `QUOTE_FETCH_DELAY_MS`: Pause between fetches in a tick (default: 1000)
//! - `QUOTE_SCHEDULER_INITIAL_DELAY_SECS`: Delay before the first tick (default: 0)
//! - `QUOTE_SYMBOLS`: Comma-separated predefined symbols (default: 20 large caps)
//!
//! ## Servers and telemetry
//! - `QUOTE_SERVICE_HTTP_PORT`: Quote API port (default: 8080)
//! - `QUOTE_SERVICE_HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: quote-service)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use quote_service::infrastructure::telemetry;
use quote_service::{
    AlphaVantageClient, ApiServer, HealthServer, HealthServerState, QuoteCache, QuoteFetcher,
    QuoteService, RateLimiter, RotationScheduler, ServiceConfig, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting quote service");

    let _metrics_handle = init_metrics();

    let config = ServiceConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let tracker = TaskTracker::new();

    let limiter = Arc::new(RateLimiter::new(config.rate_limit, shutdown_token.clone()));
    let fetcher: Arc<dyn QuoteFetcher> =
        Arc::new(AlphaVantageClient::new(&config.alpha_vantage, limiter)?);
    let cache = Arc::new(QuoteCache::new());

    let service = Arc::new(QuoteService::new(
        Arc::clone(&cache),
        Arc::clone(&fetcher),
        config.symbols.clone(),
    ));

    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(RotationScheduler::new(
            Arc::clone(&cache),
            Arc::clone(&fetcher),
            config.symbols.clone(),
            config.scheduler.clone(),
            shutdown_token.clone(),
        ));
        let runner = Arc::clone(&scheduler);
        tracker.spawn(async move { runner.run().await });
        Some(scheduler)
    } else {
        tracing::warn!("Rotation scheduler disabled, cache fills on demand only");
        None
    };

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&service),
        scheduler,
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tracker.spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    let api_server = ApiServer::new(
        config.server.http_port,
        Arc::clone(&service),
        shutdown_token.clone(),
    );
    tracker.spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!(error = %e, "Quote API error");
        }
    });

    tracker.close();
    tracing::info!("Quote service ready");

    await_shutdown(shutdown_token).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, tracker.wait())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            remaining = tracker.len(),
            "Background tasks did not stop in time"
        );
    }

    tracing::info!("Quote service stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Load .env file from the nearest ancestor directory that has one.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        base_url = %config.alpha_vantage.base_url,
        max_calls = config.rate_limit.max_calls,
        window_ms = u64::try_from(config.rate_limit.window.as_millis()).unwrap_or(u64::MAX),
        symbols = config.symbols.len(),
        symbols_per_cycle = config.scheduler.symbols_per_cycle,
        tick_interval_secs = config.scheduler.tick_interval.as_secs(),
        full_rotation_secs = config.full_rotation_period().as_secs(),
        http_port = config.server.http_port,
        health_port = config.server.health_port,
        "Configuration loaded"
    );
    if config.alpha_vantage.credentials.is_demo() {
        tracing::warn!("Using the demo API key, most symbols will return no data");
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
