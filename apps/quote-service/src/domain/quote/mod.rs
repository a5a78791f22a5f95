//! Quote Snapshot Types
//!
//! Point-in-time quote records for equity symbols. All monetary values are
//! exact decimals; a snapshot whose price is zero is a placeholder that stands
//! in for "no real data yet".

mod symbols;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use symbols::{DEFAULT_SYMBOLS, display_name, normalize_symbol};

/// A ticker symbol (e.g. "AAPL"), always trimmed and uppercase.
pub type Symbol = String;

/// One point-in-time quote record for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Display name (company name, or the symbol when unknown).
    pub name: String,
    /// Latest traded price.
    pub current_price: Decimal,
    /// Previous session close.
    pub previous_close: Decimal,
    /// Absolute change versus previous close.
    pub change: Decimal,
    /// Percent change versus previous close (`1.25` means 1.25%).
    pub change_percent: Decimal,
    /// When this snapshot was produced.
    pub last_updated: DateTime<Utc>,
}

impl QuoteSnapshot {
    /// Create a placeholder snapshot with every monetary field at zero.
    #[must_use]
    pub fn placeholder(symbol: &str, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: display_name(symbol).to_string(),
            current_price: Decimal::ZERO,
            previous_close: Decimal::ZERO,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            last_updated: now,
        }
    }

    /// Whether this snapshot carries a real price (price > 0).
    ///
    /// Freshness decisions use this rather than presence in the cache, since
    /// placeholders are cached too.
    #[must_use]
    pub fn has_real_data(&self) -> bool {
        self.current_price > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn placeholder_has_zero_monetary_fields() {
        let now = Utc::now();
        let snapshot = QuoteSnapshot::placeholder("MSFT", now);

        assert_eq!(snapshot.symbol, "MSFT");
        assert_eq!(snapshot.name, "Microsoft Corporation");
        assert_eq!(snapshot.current_price, Decimal::ZERO);
        assert_eq!(snapshot.previous_close, Decimal::ZERO);
        assert_eq!(snapshot.change, Decimal::ZERO);
        assert_eq!(snapshot.change_percent, Decimal::ZERO);
        assert_eq!(snapshot.last_updated, now);
        assert!(!snapshot.has_real_data());
    }

    #[test]
    fn placeholder_for_unknown_symbol_uses_symbol_as_name() {
        let snapshot = QuoteSnapshot::placeholder("XYZ", Utc::now());
        assert_eq!(snapshot.name, "XYZ");
    }

    #[test]
    fn positive_price_is_real_data() {
        let mut snapshot = QuoteSnapshot::placeholder("AAPL", Utc::now());
        snapshot.current_price = dec!(0.0001);
        assert!(snapshot.has_real_data());
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let mut snapshot = QuoteSnapshot::placeholder("AAPL", Utc::now());
        snapshot.current_price = dec!(189.8400);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["current_price"], "189.8400");
        assert_eq!(json["name"], "Apple Inc");
    }
}
