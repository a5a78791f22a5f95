//! Alpha Vantage Wire Types
//!
//! Typed mirror of the `GLOBAL_QUOTE` response. Field names match the
//! upstream JSON keys exactly, including the numeric prefixes. All values
//! arrive as strings and are converted to exact decimals when mapping to a
//! `QuoteSnapshot`.
//!
//! # Example payload
//!
//! ```json
//! {
//!     "Global Quote": {
//!         "01. symbol": "IBM",
//!         "05. price": "171.2300",
//!         "08. previous close": "170.1000",
//!         "09. change": "1.1300",
//!         "10. change percent": "0.6643%"
//!     }
//! }
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::FetchError;
use crate::domain::quote::{QuoteSnapshot, display_name};

/// Top-level `GLOBAL_QUOTE` response.
///
/// On quota exhaustion the API answers 200 with only a `Note` or
/// `Information` message; invalid requests carry `Error Message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalQuoteResponse {
    /// Quote payload (empty object for unknown symbols).
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    /// Call-frequency notice.
    #[serde(rename = "Note")]
    pub note: Option<String>,
    /// Informational notice (daily quota, premium endpoints).
    #[serde(rename = "Information")]
    pub information: Option<String>,
    /// Request error.
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

/// Quote payload inside `Global Quote`.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "02. open", default)]
    pub open: Option<String>,
    #[serde(rename = "03. high", default)]
    pub high: Option<String>,
    #[serde(rename = "04. low", default)]
    pub low: Option<String>,
    #[serde(rename = "05. price", default)]
    pub price: Option<String>,
    #[serde(rename = "06. volume", default)]
    pub volume: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    pub latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default)]
    pub previous_close: Option<String>,
    #[serde(rename = "09. change", default)]
    pub change: Option<String>,
    #[serde(rename = "10. change percent", default)]
    pub change_percent: Option<String>,
}

impl GlobalQuote {
    fn is_empty(&self) -> bool {
        self.symbol.is_none() && self.price.is_none()
    }
}

impl GlobalQuoteResponse {
    /// Map the response to a snapshot for `symbol`.
    ///
    /// # Errors
    ///
    /// - `FetchError::RateLimited` for an upstream quota notice
    /// - `FetchError::NoData` when no quote payload is present
    /// - `FetchError::Parse` when a numeric field is malformed
    pub fn into_snapshot(self, symbol: &str, now: DateTime<Utc>) -> Result<QuoteSnapshot, FetchError> {
        let notice = self.note.or(self.information);

        let quote = match self.global_quote {
            Some(quote) if !quote.is_empty() => quote,
            _ => {
                if let Some(message) = notice
                    && is_quota_notice(&message)
                {
                    return Err(FetchError::RateLimited { message });
                }
                if let Some(message) = self.error_message {
                    tracing::debug!(symbol, message = %message, "Quote API returned an error message");
                }
                return Err(FetchError::NoData {
                    symbol: symbol.to_string(),
                });
            }
        };

        Ok(QuoteSnapshot {
            symbol: symbol.to_string(),
            name: display_name(symbol).to_string(),
            current_price: parse_decimal("05. price", quote.price.as_deref())?,
            previous_close: parse_decimal("08. previous close", quote.previous_close.as_deref())?,
            change: parse_decimal("09. change", quote.change.as_deref())?,
            change_percent: parse_percent(quote.change_percent.as_deref())?,
            last_updated: now,
        })
    }
}

fn is_quota_notice(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("call frequency") || lower.contains("rate limit")
}

/// Parse an exact decimal; absent or blank values are zero.
fn parse_decimal(field: &str, raw: Option<&str>) -> Result<Decimal, FetchError> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(value).map_err(|_| FetchError::Parse {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Parse a percent string such as `"-0.5012%"`.
fn parse_percent(raw: Option<&str>) -> Result<Decimal, FetchError> {
    let stripped = raw.map(|value| value.trim().trim_end_matches('%'));
    parse_decimal("10. change percent", stripped)
}
