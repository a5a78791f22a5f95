//! In-Memory Quote Cache
//!
//! Thread-safe map from symbol to the last known snapshot. Readers never
//! block on I/O and stale entries are served as-is; there is no TTL or
//! eviction, entries live until overwritten or `clear` is called.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::quote::{QuoteSnapshot, Symbol};
use crate::infrastructure::metrics;

/// Last-writer-wins snapshot cache shared by the scheduler and the read path.
#[derive(Debug)]
pub struct QuoteCache {
    entries: RwLock<HashMap<Symbol, QuoteSnapshot>>,
    last_update: RwLock<DateTime<Utc>>,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            last_update: RwLock::new(Utc::now()),
        }
    }

    /// Get the cached snapshot for a symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<QuoteSnapshot> {
        self.entries.read().get(symbol).cloned()
    }

    /// Store a snapshot, replacing any previous entry for the symbol.
    pub fn put(&self, symbol: impl Into<Symbol>, snapshot: QuoteSnapshot) {
        let len = {
            let mut entries = self.entries.write();
            entries.insert(symbol.into(), snapshot);
            entries.len()
        };
        metrics::set_cache_entries(len);
    }

    /// Resolve every symbol to its cached snapshot or a generated placeholder.
    ///
    /// Output order and length match `symbols`. Placeholders are not stored.
    pub fn get_all_or_placeholder<F>(&self, symbols: &[Symbol], placeholder: F) -> Vec<QuoteSnapshot>
    where
        F: Fn(&str) -> QuoteSnapshot,
    {
        let entries = self.entries.read();
        symbols
            .iter()
            .map(|symbol| {
                entries
                    .get(symbol)
                    .cloned()
                    .unwrap_or_else(|| placeholder(symbol))
            })
            .collect()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
        metrics::set_cache_entries(0);
        tracing::info!("Quote cache cleared");
    }

    /// Number of cached entries (placeholders included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Count how many of `symbols` have a cached snapshot with real data.
    #[must_use]
    pub fn count_with_real_data(&self, symbols: &[Symbol]) -> usize {
        let entries = self.entries.read();
        symbols
            .iter()
            .filter(|symbol| entries.get(*symbol).is_some_and(QuoteSnapshot::has_real_data))
            .count()
    }

    /// Record that a refresh pass just finished.
    pub fn mark_updated(&self) {
        *self.last_update.write() = Utc::now();
    }

    /// When the last refresh pass finished (construction time until then).
    #[must_use]
    pub fn last_update_time(&self) -> DateTime<Utc> {
        *self.last_update.read()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;

    fn snapshot(symbol: &str, price: rust_decimal::Decimal) -> QuoteSnapshot {
        let mut snapshot = QuoteSnapshot::placeholder(symbol, Utc::now());
        snapshot.current_price = price;
        snapshot
    }

    fn symbols(list: &[&str]) -> Vec<Symbol> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn unfetched_symbol_is_absent() {
        let cache = QuoteCache::new();
        assert!(cache.get("AAPL").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn get_returns_last_written_snapshot() {
        let cache = QuoteCache::new();
        cache.put("AAPL", snapshot("AAPL", dec!(100)));
        let latest = snapshot("AAPL", dec!(101.25));
        cache.put("AAPL", latest.clone());

        assert_eq!(cache.get("AAPL"), Some(latest));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_all_preserves_order_and_length() {
        let cache = QuoteCache::new();
        cache.put("MSFT", snapshot("MSFT", dec!(410.5)));

        let requested = symbols(&["AAPL", "MSFT", "XYZ", "AAPL"]);
        let result =
            cache.get_all_or_placeholder(&requested, |s| QuoteSnapshot::placeholder(s, Utc::now()));

        let returned: Vec<_> = result.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(returned, vec!["AAPL", "MSFT", "XYZ", "AAPL"]);
        assert!(!result[0].has_real_data());
        assert_eq!(result[1].current_price, dec!(410.5));
        assert_eq!(cache.len(), 1, "placeholders are not stored");
    }

    #[test]
    fn clear_removes_everything() {
        let cache = QuoteCache::new();
        cache.put("AAPL", snapshot("AAPL", dec!(1)));
        cache.put("MSFT", snapshot("MSFT", dec!(2)));

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get("AAPL").is_none());
    }

    #[test]
    fn counts_only_real_data() {
        let cache = QuoteCache::new();
        cache.put("AAPL", snapshot("AAPL", dec!(190)));
        cache.put("MSFT", snapshot("MSFT", dec!(0)));

        let all = symbols(&["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(cache.count_with_real_data(&all), 1);
    }

    #[test]
    fn mark_updated_moves_timestamp_forward() {
        let cache = QuoteCache::new();
        let before = cache.last_update_time();
        cache.mark_updated();
        assert!(cache.last_update_time() >= before);
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let cache = Arc::new(QuoteCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let symbol = format!("SYM{}", i % 4);
                    for n in 0..200 {
                        cache.put(symbol.clone(), snapshot(&symbol, rust_decimal::Decimal::from(n)));
                        let _ = cache.get(&symbol);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
