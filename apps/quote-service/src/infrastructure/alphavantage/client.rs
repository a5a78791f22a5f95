//! Alpha Vantage HTTP client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};

use super::messages::GlobalQuoteResponse;
use crate::application::ports::{FetchError, QuoteFetcher};
use crate::domain::quote::QuoteSnapshot;
use crate::infrastructure::config::{AlphaVantageSettings, Credentials};
use crate::infrastructure::metrics;
use crate::infrastructure::rate_limit::RateLimiter;

/// Errors constructing the client.
#[derive(Debug, thiserror::Error)]
pub enum AlphaVantageError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// `GLOBAL_QUOTE` client; the production `QuoteFetcher`.
///
/// Every request first reserves a slot on the shared `RateLimiter`.
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    query_url: String,
    credentials: Credentials,
    limiter: Arc<RateLimiter>,
}

impl AlphaVantageClient {
    /// Create a client from settings, gated by `limiter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        settings: &AlphaVantageSettings,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, AlphaVantageError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AlphaVantageError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            query_url: format!("{}/query", settings.base_url.trim_end_matches('/')),
            credentials: settings.credentials.clone(),
            limiter,
        })
    }

    async fn request_quote(&self, symbol: &str) -> Result<QuoteSnapshot, FetchError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Cancelled)?;

        tracing::debug!(symbol, "Fetching quote");

        let response = self
            .client
            .get(&self.query_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.credentials.api_key()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Http {
                status: None,
                // The URL carries the API key.
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                message: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: Some(status.as_u16()),
                message: format!("HTTP {status}"),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            status: Some(status.as_u16()),
            message: e.without_url().to_string(),
        })?;

        let parsed: GlobalQuoteResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse {
                field: "response body".to_string(),
                value: e.to_string(),
            })?;

        parsed.into_snapshot(symbol, Utc::now())
    }
}

#[async_trait]
impl QuoteFetcher for AlphaVantageClient {
    async fn fetch(&self, symbol: &str) -> Result<QuoteSnapshot, FetchError> {
        let started = Instant::now();
        let result = self.request_quote(symbol).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(snapshot) => {
                metrics::record_fetch("success", elapsed);
                tracing::info!(
                    symbol,
                    price = %snapshot.current_price,
                    change = %snapshot.change,
                    elapsed_ms = duration_ms(elapsed),
                    "Fetched quote"
                );
            }
            Err(error) => {
                metrics::record_fetch(error.kind(), elapsed);
                log_fetch_error(symbol, error);
            }
        }

        result
    }
}

fn log_fetch_error(symbol: &str, error: &FetchError) {
    match error {
        FetchError::RateLimited { .. } => {
            tracing::warn!(symbol, error = %error, "Quote API rate limit exceeded");
        }
        FetchError::NoData { .. } => {
            tracing::warn!(symbol, "No quote data returned");
        }
        FetchError::Http { .. } | FetchError::Parse { .. } => {
            tracing::error!(symbol, kind = error.kind(), error = %error, "Quote fetch failed");
        }
        FetchError::Cancelled => {
            tracing::debug!(symbol, "Quote fetch cancelled while waiting for rate limit");
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
