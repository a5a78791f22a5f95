//! Port Interfaces
//!
//! Defines the outbound interfaces the application services depend on.
//!
//! ## Driven Ports (Outbound)
//!
//! - `QuoteFetcher`: one external quote lookup per call

use async_trait::async_trait;

use crate::domain::quote::QuoteSnapshot;

/// Why a single quote lookup produced no snapshot.
///
/// Adapters log these at their boundary; callers only decide what to do with
/// the absence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The upstream quota was exhausted (HTTP 429 or an upstream quota notice).
    #[error("rate limited by quote provider: {message}")]
    RateLimited {
        /// Upstream message.
        message: String,
    },

    /// Transport failure or non-success HTTP status other than 429.
    #[error("HTTP error: {message}")]
    Http {
        /// HTTP status, absent for transport failures.
        status: Option<u16>,
        /// Error details.
        message: String,
    },

    /// A field of the response could not be parsed.
    #[error("failed to parse {field}: {value:?}")]
    Parse {
        /// Upstream field name.
        field: String,
        /// Offending raw value.
        value: String,
    },

    /// The response was well-formed but carried no quote.
    #[error("no quote data for {symbol}")]
    NoData {
        /// Requested symbol.
        symbol: String,
    },

    /// Waiting for a rate-limit slot was cancelled.
    #[error("quote fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Http { .. } => "http_error",
            Self::Parse { .. } => "parse_error",
            Self::NoData { .. } => "no_data",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Port for looking up the current quote of one symbol.
///
/// Implementations never write to the cache; the caller owns cache writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Fetch the current quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` describing why no snapshot is available.
    async fn fetch(&self, symbol: &str) -> Result<QuoteSnapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(
            FetchError::RateLimited {
                message: String::new()
            }
            .kind(),
            "rate_limited"
        );
        assert_eq!(
            FetchError::NoData {
                symbol: "X".to_string()
            }
            .kind(),
            "no_data"
        );
        assert_eq!(FetchError::Cancelled.kind(), "cancelled");
    }

    #[test]
    fn http_error_display() {
        let transport = FetchError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(transport.to_string(), "HTTP error: connection refused");
        assert_eq!(transport.kind(), "http_error");
    }
}
