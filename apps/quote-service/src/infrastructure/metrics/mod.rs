//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Fetches**: Quote API calls by outcome, and their latency
//! - **Rate limiting**: Waits imposed by the call limiter
//! - **Cache**: Entry count and read-path lookups by result
//! - **Scheduler**: Rotation ticks and per-tick symbol results
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! functions are no-ops until `init_metrics` installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "quote_service_fetches_total",
        "Quote API lookups by outcome"
    );
    describe_histogram!(
        "quote_service_fetch_duration_seconds",
        "Quote API round-trip time"
    );

    describe_counter!(
        "quote_service_rate_limit_waits_total",
        "Times a caller was suspended by the call limiter"
    );
    describe_histogram!(
        "quote_service_rate_limit_wait_seconds",
        "Time callers spent waiting for a call slot"
    );

    describe_gauge!("quote_service_cache_entries", "Snapshots held in the cache");
    describe_counter!(
        "quote_service_cache_lookups_total",
        "Read-path cache lookups by result"
    );

    describe_counter!(
        "quote_service_scheduler_ticks_total",
        "Rotation ticks by result"
    );
    describe_counter!(
        "quote_service_scheduler_symbols_total",
        "Symbols processed by rotation ticks by result"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Result of a read-path cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    /// Cached snapshot with real data was served.
    Real,
    /// Only a placeholder was cached.
    Placeholder,
    /// Nothing was cached.
    Miss,
}

impl CacheLookup {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Placeholder => "placeholder",
            Self::Miss => "miss",
        }
    }
}

/// Record a quote API lookup outcome (`"success"` or a `FetchError` kind).
pub fn record_fetch(outcome: &'static str, duration: Duration) {
    counter!("quote_service_fetches_total", "outcome" => outcome).increment(1);
    histogram!("quote_service_fetch_duration_seconds").record(duration.as_secs_f64());
}

/// Record a caller being suspended by the limiter.
pub fn record_rate_limit_wait(wait: Duration) {
    counter!("quote_service_rate_limit_waits_total").increment(1);
    histogram!("quote_service_rate_limit_wait_seconds").record(wait.as_secs_f64());
}

/// Update the cache entry gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_cache_entries(count: usize) {
    gauge!("quote_service_cache_entries").set(count as f64);
}

/// Record a read-path cache lookup.
pub fn record_cache_lookup(result: CacheLookup) {
    counter!("quote_service_cache_lookups_total", "result" => result.as_str()).increment(1);
}

/// Record a finished rotation tick.
pub fn record_tick(succeeded: usize, failed: usize, interrupted: bool) {
    let result = if interrupted { "interrupted" } else { "completed" };
    counter!("quote_service_scheduler_ticks_total", "result" => result).increment(1);
    counter!("quote_service_scheduler_symbols_total", "result" => "success")
        .increment(succeeded as u64);
    counter!("quote_service_scheduler_symbols_total", "result" => "error")
        .increment(failed as u64);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_lookup_as_str() {
        assert_eq!(CacheLookup::Real.as_str(), "real");
        assert_eq!(CacheLookup::Placeholder.as_str(), "placeholder");
        assert_eq!(CacheLookup::Miss.as_str(), "miss");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_fetch("success", Duration::from_millis(5));
        record_rate_limit_wait(Duration::from_secs(1));
        set_cache_entries(3);
        record_cache_lookup(CacheLookup::Miss);
        record_tick(2, 1, false);
    }
}
