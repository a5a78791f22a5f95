//! Service Configuration Settings
//!
//! Configuration types for the quote service, loaded from environment variables.

use std::time::Duration;

use crate::domain::quote::{DEFAULT_SYMBOLS, Symbol, normalize_symbol};
use crate::infrastructure::rate_limit::RateLimitConfig;

/// Default Alpha Vantage base URL.
const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Key accepted by Alpha Vantage for its documented sample symbols only.
const DEMO_API_KEY: &str = "demo";

/// Alpha Vantage API credentials.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(api_key: String) -> Self {
        Self { api_key }
    }

    /// Get the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Whether this is the public demo key.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Upstream quote API settings.
#[derive(Debug, Clone)]
pub struct AlphaVantageSettings {
    /// API base URL (without the `/query` path).
    pub base_url: String,
    /// API credentials.
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AlphaVantageSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: Credentials::new(DEMO_API_KEY.to_string()),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Rotation scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Whether the background refresh runs at all.
    pub enabled: bool,
    /// Symbols refreshed per tick.
    pub symbols_per_cycle: usize,
    /// Time between tick starts.
    pub tick_interval: Duration,
    /// Courtesy pause between fetches within one tick.
    pub fetch_delay: Duration,
    /// Delay before the first tick.
    pub initial_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            symbols_per_cycle: 4,
            tick_interval: Duration::from_secs(300),
            fetch_delay: Duration::from_secs(1),
            initial_delay: Duration::ZERO,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Quote REST API port.
    pub http_port: u16,
    /// Health check HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 8080,
            health_port: 8082,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upstream quote API settings.
    pub alpha_vantage: AlphaVantageSettings,
    /// Upstream call quota.
    pub rate_limit: RateLimitConfig,
    /// Background refresh settings.
    pub scheduler: SchedulerSettings,
    /// Predefined symbol list, in rotation order.
    pub symbols: Vec<Symbol>,
    /// Server port settings.
    pub server: ServerSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            alpha_vantage: AlphaVantageSettings::default(),
            rate_limit: RateLimitConfig::default(),
            scheduler: SchedulerSettings::default(),
            symbols: default_symbols(),
            server: ServerSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but empty, or a limit is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = match std::env::var("ALPHA_VANTAGE_API_KEY") {
            Ok(key) if key.trim().is_empty() => {
                return Err(ConfigError::EmptyValue("ALPHA_VANTAGE_API_KEY".to_string()));
            }
            Ok(key) => key,
            Err(_) => DEMO_API_KEY.to_string(),
        };

        let alpha_vantage = AlphaVantageSettings {
            base_url: std::env::var("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or(defaults.alpha_vantage.base_url),
            credentials: Credentials::new(api_key),
            timeout: parse_env_duration_secs(
                "ALPHA_VANTAGE_TIMEOUT_SECS",
                defaults.alpha_vantage.timeout,
            ),
        };

        let rate_limit = RateLimitConfig {
            max_calls: parse_env_u32("QUOTE_RATE_LIMIT_CALLS", defaults.rate_limit.max_calls),
            window: parse_env_duration_millis(
                "QUOTE_RATE_LIMIT_WINDOW_MS",
                defaults.rate_limit.window,
            ),
        };

        let scheduler = SchedulerSettings {
            enabled: parse_env_bool("QUOTE_SCHEDULER_ENABLED", defaults.scheduler.enabled),
            symbols_per_cycle: parse_env_usize(
                "QUOTE_SYMBOLS_PER_CYCLE",
                defaults.scheduler.symbols_per_cycle,
            ),
            tick_interval: parse_env_duration_secs(
                "QUOTE_TICK_INTERVAL_SECS",
                defaults.scheduler.tick_interval,
            ),
            fetch_delay: parse_env_duration_millis(
                "QUOTE_FETCH_DELAY_MS",
                defaults.scheduler.fetch_delay,
            ),
            initial_delay: parse_env_duration_secs(
                "QUOTE_SCHEDULER_INITIAL_DELAY_SECS",
                defaults.scheduler.initial_delay,
            ),
        };

        let symbols = std::env::var("QUOTE_SYMBOLS")
            .map(|raw| parse_symbol_list(&raw))
            .unwrap_or(defaults.symbols);

        let server = ServerSettings {
            http_port: parse_env_u16("QUOTE_SERVICE_HTTP_PORT", defaults.server.http_port),
            health_port: parse_env_u16("QUOTE_SERVICE_HEALTH_PORT", defaults.server.health_port),
        };

        let config = Self {
            alpha_vantage,
            rate_limit,
            scheduler,
            symbols,
            server,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the services rely on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero quota, a zero batch size,
    /// a zero tick interval or an empty symbol list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_calls == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUOTE_RATE_LIMIT_CALLS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scheduler.symbols_per_cycle == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUOTE_SYMBOLS_PER_CYCLE".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scheduler.tick_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "QUOTE_TICK_INTERVAL_SECS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "QUOTE_SYMBOLS".to_string(),
                reason: "must name at least one symbol".to_string(),
            });
        }
        Ok(())
    }

    /// Approximate time for the scheduler to refresh every symbol once.
    #[must_use]
    pub fn full_rotation_period(&self) -> Duration {
        let ticks = self
            .symbols
            .len()
            .div_ceil(self.scheduler.symbols_per_cycle.max(1));
        self.scheduler
            .tick_interval
            .saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX))
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has a value the service cannot run with.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

fn default_symbols() -> Vec<Symbol> {
    DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect()
}

/// Parse a comma-separated symbol list, normalizing and dropping duplicates.
fn parse_symbol_list(raw: &str) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for symbol in raw.split(',').filter_map(normalize_symbol) {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(default)
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
