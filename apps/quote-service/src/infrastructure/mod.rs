//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports plus the process-wide
//! state (cache, rate limiter) and the HTTP surfaces.

/// Alpha Vantage `GLOBAL_QUOTE` client.
pub mod alphavantage;

/// In-memory quote cache.
pub mod cache;

/// Configuration loaded from the environment.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Quote REST API.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Fixed-window call quota for the quote API.
pub mod rate_limit;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
