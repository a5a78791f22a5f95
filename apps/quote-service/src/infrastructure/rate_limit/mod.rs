//! Fixed-Window Rate Limiter
//!
//! Gates calls to the external quote API so that at most `max_calls` start
//! within any window of `window` length. A caller that finds the window full
//! is suspended until the window elapses, then the window restarts.
//!
//! The window state sits behind a fair async mutex, so waiting callers are
//! released in arrival order. Waits are cancelled through the limiter's
//! `CancellationToken`; a cancelled caller never reserves a slot.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::metrics;

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls allowed per window.
    pub max_calls: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Rate limiter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// The wait for a slot was cancelled before a slot was reserved.
    #[error("rate limit wait cancelled")]
    Cancelled,
}

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    calls_in_window: u32,
}

impl WindowState {
    fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.calls_in_window = 0;
    }
}

/// Process-wide call gate shared by the scheduler and the read path.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
    shutdown: CancellationToken,
}

impl RateLimiter {
    /// Create a limiter whose waits end when `shutdown` is cancelled.
    #[must_use]
    pub fn new(config: RateLimitConfig, shutdown: CancellationToken) -> Self {
        Self {
            config,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                calls_in_window: 0,
            }),
            shutdown,
        }
    }

    /// Wait until a call slot is available, then reserve it.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Cancelled` if the shutdown token fires before a
    /// slot is reserved, including when it has already fired and a slot is
    /// free. No slot is consumed in that case.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        let mut state = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Err(RateLimitError::Cancelled),
            guard = self.state.lock() => guard,
        };

        let now = Instant::now();
        if now.duration_since(state.window_start) >= self.config.window {
            state.reset(now);
        }

        if state.calls_in_window >= self.config.max_calls {
            let wait = self
                .config
                .window
                .saturating_sub(now.duration_since(state.window_start));

            tracing::warn!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                max_calls = self.config.max_calls,
                "API call limit reached, waiting for next window"
            );
            metrics::record_rate_limit_wait(wait);

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => {
                    tracing::debug!("Rate limit wait cancelled");
                    return Err(RateLimitError::Cancelled);
                }
                () = tokio::time::sleep(wait) => {}
            }

            state.reset(Instant::now());
        }

        state.calls_in_window += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn limiter(max_calls: u32, window: Duration) -> (Arc<RateLimiter>, CancellationToken) {
        let token = CancellationToken::new();
        let limiter = RateLimiter::new(RateLimitConfig { max_calls, window }, token.clone());
        (Arc::new(limiter), token)
    }

    fn calls_in_window(limiter: &RateLimiter) -> u32 {
        limiter.state.try_lock().unwrap().calls_in_window
    }

    #[test]
    fn default_config_values() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_calls, 5);
        assert_eq!(config.window, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn calls_within_quota_do_not_wait() {
        let (limiter, _token) = limiter(5, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls_in_window(&limiter), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn call_over_quota_waits_for_remaining_window() {
        let (limiter, _token) = limiter(5, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(20)).await;

        limiter.acquire().await.unwrap();

        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(60), "waited {waited:?}");
        assert!(waited < Duration::from_secs(61), "waited {waited:?}");
        assert_eq!(calls_in_window(&limiter), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn counter_resets_after_window_elapses() {
        let (limiter, _token) = limiter(2, Duration::from_secs(10));

        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;

        let start = Instant::now();
        limiter.acquire().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(calls_in_window(&limiter), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_reserves_no_slot() {
        let (limiter, token) = limiter(1, Duration::from_secs(60));
        limiter.acquire().await.unwrap();

        let waiting = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();

        let result = waiting.await.unwrap();
        assert_eq!(result, Err(RateLimitError::Cancelled));
        assert_eq!(calls_in_window(&limiter), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_after_shutdown_is_always_cancelled() {
        for _ in 0..50 {
            let (limiter, token) = limiter(5, Duration::from_secs(60));
            token.cancel();

            assert_eq!(limiter.acquire().await, Err(RateLimitError::Cancelled));
            assert_eq!(calls_in_window(&limiter), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_served_in_turn() {
        let (limiter, _token) = limiter(1, Duration::from_secs(60));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire().await.unwrap();
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap().duration_since(start));
        }
        finished.sort();

        assert_eq!(finished[0], Duration::ZERO);
        assert!(finished[1] >= Duration::from_secs(60));
        assert!(finished[2] >= Duration::from_secs(120));
    }
}
