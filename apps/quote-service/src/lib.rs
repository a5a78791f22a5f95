#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Quote Service - Rate-Limited Quote Cache
//!
//! Keeps an in-memory cache of equity quotes warm by polling the Alpha
//! Vantage `GLOBAL_QUOTE` endpoint for a small slice of a predefined symbol
//! list on every scheduler tick, staying under the upstream call quota. Reads
//! are served from the cache, falling back to a synchronous fetch and then to
//! a zero-valued placeholder.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types
//!   - `quote`: Snapshots, symbols, display names
//!   - `rotation`: Round-robin cursor over the symbol list
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: `QuoteFetcher` and `FetchError`
//!   - `services`: `QuoteService` read path, `RotationScheduler`
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `alphavantage`: Rate-limited HTTP client
//!   - `cache`: Concurrent snapshot map
//!   - `rate_limit`: Fixed-window limiter
//!   - `http`: Quote REST API
//!   - `health`: Health, readiness and metrics endpoint
//!   - `config`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//! RotationScheduler ──┐
//!                     ├──► RateLimiter ──► AlphaVantageClient ──► QuoteCache
//! QuoteService (miss)─┘                                               │
//!       ▲                                                             │
//!       └──────────────────────── read ◄──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Quote types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::quote::{DEFAULT_SYMBOLS, QuoteSnapshot, Symbol, display_name, normalize_symbol};
pub use domain::rotation::RotationState;

// Ports and services
pub use application::ports::{FetchError, QuoteFetcher};
pub use application::services::{
    QuoteDiagnostics, QuoteService, RotationScheduler, SchedulerStatus, TickOutcome,
};

// Infrastructure config
pub use infrastructure::config::{
    AlphaVantageSettings, ConfigError, Credentials, SchedulerSettings, ServerSettings,
    ServiceConfig,
};

// Adapters and shared state
pub use infrastructure::alphavantage::{AlphaVantageClient, AlphaVantageError};
pub use infrastructure::cache::QuoteCache;
pub use infrastructure::rate_limit::{RateLimitConfig, RateLimitError, RateLimiter};

// HTTP servers
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};
pub use infrastructure::http::{ApiServer, ApiServerError};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
