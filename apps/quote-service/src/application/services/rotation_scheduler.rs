//! Rotation Scheduler
//!
//! Background refresh that keeps the cache warm while staying under the
//! upstream quota: each tick fetches only a bounded slice of the predefined
//! symbols, round-robin, so the whole list is refreshed once every
//! `ceil(len / symbols_per_cycle)` ticks.
//!
//! Ticks never overlap. A tick interrupted by shutdown keeps the writes it
//! already made but leaves the cursor where it was, so the next tick retries
//! the same slice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FetchError, QuoteFetcher};
use crate::domain::quote::Symbol;
use crate::domain::rotation::RotationState;
use crate::infrastructure::cache::QuoteCache;
use crate::infrastructure::config::SchedulerSettings;
use crate::infrastructure::metrics;

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Result of one rotation tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickOutcome {
    /// 1-based tick number.
    pub cycle: u64,
    /// First list offset of the slice.
    pub start: usize,
    /// One past the last list offset of the slice.
    pub end: usize,
    /// Symbols a fetch was issued for.
    pub attempted: usize,
    /// Fetches that produced a snapshot.
    pub succeeded: usize,
    /// Fetches that failed.
    pub failed: usize,
    /// Whether shutdown cut the tick short.
    pub interrupted: bool,
    /// Cursor after the tick.
    pub next_cursor: usize,
    /// When the tick finished.
    pub finished_at: DateTime<Utc>,
}

/// Point-in-time scheduler state for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    /// Whether the tick loop is running.
    pub running: bool,
    /// Whether the tick loop has exited. A scheduler that has not started yet
    /// is neither running nor stopped.
    pub stopped: bool,
    /// Offset where the next tick starts.
    pub cursor: usize,
    /// Ticks that completed their slice.
    pub cycles_completed: u64,
    /// Slice size.
    pub symbols_per_cycle: usize,
    /// Length of the symbol list.
    pub total_symbols: usize,
    /// Ticks needed to refresh every symbol once.
    pub ticks_per_rotation: usize,
    /// Most recent tick, if any.
    pub last_tick: Option<TickOutcome>,
}

/// Round-robin background refresher.
pub struct RotationScheduler {
    cache: Arc<QuoteCache>,
    fetcher: Arc<dyn QuoteFetcher>,
    symbols: Vec<Symbol>,
    settings: SchedulerSettings,
    rotation: Mutex<RotationState>,
    last_tick: RwLock<Option<TickOutcome>>,
    running: AtomicBool,
    stopped: AtomicBool,
    tick_lock: tokio::sync::Mutex<()>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RotationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationScheduler")
            .field("symbols", &self.symbols.len())
            .field("settings", &self.settings)
            .field("rotation", &*self.rotation.lock())
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("stopped", &self.stopped.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl RotationScheduler {
    /// Create a scheduler over `symbols` that stops when `shutdown` fires.
    #[must_use]
    pub fn new(
        cache: Arc<QuoteCache>,
        fetcher: Arc<dyn QuoteFetcher>,
        symbols: Vec<Symbol>,
        settings: SchedulerSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            cache,
            fetcher,
            symbols,
            settings,
            rotation: Mutex::new(RotationState::new()),
            last_tick: RwLock::new(None),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            tick_lock: tokio::sync::Mutex::new(()),
            shutdown,
        }
    }

    /// Run ticks at a fixed rate until shutdown.
    ///
    /// The first tick fires after the configured initial delay. Ticks that
    /// would have fired while a slow tick was running are skipped.
    pub async fn run(&self) {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(
            symbols = self.symbols.len(),
            symbols_per_cycle = self.settings.symbols_per_cycle,
            interval_secs = self.settings.tick_interval.as_secs(),
            ticks_per_rotation = self.ticks_per_rotation(),
            "Rotation scheduler started"
        );

        let period = self.settings.tick_interval.max(MIN_TICK_INTERVAL);
        let mut interval = tokio::time::interval_at(Instant::now() + self.settings.initial_delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if self.run_tick().await.interrupted {
                        break;
                    }
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        tracing::info!("Rotation scheduler stopped");
    }

    /// Refresh the next slice of symbols.
    ///
    /// Per-symbol failures are counted and never abort the tick. Shutdown is
    /// checked between symbols; an in-flight fetch is allowed to finish.
    pub async fn run_tick(&self) -> TickOutcome {
        let _tick = self.tick_lock.lock().await;

        let total = self.symbols.len();
        let (slice, cycle) = {
            let rotation = self.rotation.lock();
            (
                rotation.next_slice(total, self.settings.symbols_per_cycle),
                rotation.cycles_completed() + 1,
            )
        };

        tracing::info!(
            cycle,
            start = slice.start,
            end = slice.end,
            total,
            "Starting rotation tick"
        );

        let mut attempted = 0;
        let mut succeeded = 0;
        let mut failed = 0;
        let mut interrupted = false;

        for (position, symbol) in self.symbols[slice.clone()].iter().enumerate() {
            if position > 0 && !self.courtesy_delay().await {
                interrupted = true;
                break;
            }
            if self.shutdown.is_cancelled() {
                interrupted = true;
                break;
            }

            attempted += 1;
            match self.fetcher.fetch(symbol).await {
                Ok(snapshot) => {
                    self.cache.put(symbol.as_str(), snapshot);
                    succeeded += 1;
                }
                Err(FetchError::Cancelled) => {
                    interrupted = true;
                    break;
                }
                Err(error) => {
                    tracing::warn!(symbol = %symbol, error = %error, "Rotation fetch failed");
                    failed += 1;
                }
            }
        }

        let next_cursor = {
            let mut rotation = self.rotation.lock();
            if interrupted {
                rotation.cursor()
            } else {
                rotation.complete(&slice, total)
            }
        };

        let outcome = TickOutcome {
            cycle,
            start: slice.start,
            end: slice.end,
            attempted,
            succeeded,
            failed,
            interrupted,
            next_cursor,
            finished_at: Utc::now(),
        };

        metrics::record_tick(succeeded, failed, interrupted);
        if interrupted {
            tracing::warn!(
                cycle,
                succeeded,
                failed,
                cursor = next_cursor,
                "Rotation tick interrupted, slice will be retried"
            );
        } else {
            self.cache.mark_updated();
            self.log_summary(&outcome);
        }

        *self.last_tick.write() = Some(outcome.clone());
        outcome
    }

    /// Current scheduler state.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        let rotation = *self.rotation.lock();
        SchedulerStatus {
            running: self.running.load(Ordering::SeqCst),
            stopped: self.stopped.load(Ordering::SeqCst),
            cursor: rotation.cursor(),
            cycles_completed: rotation.cycles_completed(),
            symbols_per_cycle: self.settings.symbols_per_cycle,
            total_symbols: self.symbols.len(),
            ticks_per_rotation: self.ticks_per_rotation(),
            last_tick: self.last_tick.read().clone(),
        }
    }

    /// Whether the tick loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the tick loop has exited.
    #[must_use]
    pub fn has_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn ticks_per_rotation(&self) -> usize {
        RotationState::ticks_per_rotation(self.symbols.len(), self.settings.symbols_per_cycle)
    }

    /// Sleep between fetches. Returns `false` if shutdown fired first.
    async fn courtesy_delay(&self) -> bool {
        tracing::debug!(
            delay_ms = u64::try_from(self.settings.fetch_delay.as_millis()).unwrap_or(u64::MAX),
            "Waiting before next fetch"
        );
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => false,
            () = tokio::time::sleep(self.settings.fetch_delay) => true,
        }
    }

    fn log_summary(&self, outcome: &TickOutcome) {
        let next = self
            .rotation
            .lock()
            .next_slice(self.symbols.len(), self.settings.symbols_per_cycle);

        tracing::info!(
            cycle = outcome.cycle,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            cached = self.cache.len(),
            with_real_data = self.cache.count_with_real_data(&self.symbols),
            total = self.symbols.len(),
            next_start = next.start,
            next_end = next.end,
            "Rotation tick completed"
        );

        if outcome.next_cursor == 0 {
            tracing::info!(
                ticks = self.ticks_per_rotation(),
                "Full symbol rotation completed"
            );
        }
    }
}
