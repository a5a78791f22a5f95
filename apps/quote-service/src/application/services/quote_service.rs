//! Quote Read Path
//!
//! Serves snapshots from the cache when they carry real data, falls back to a
//! synchronous fetch otherwise, and degrades to a zero-valued placeholder when
//! the fetch fails. None of these operations return an error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::application::ports::QuoteFetcher;
use crate::domain::quote::{QuoteSnapshot, Symbol};
use crate::infrastructure::cache::QuoteCache;
use crate::infrastructure::metrics::{self, CacheLookup};

/// Troubleshooting report for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteDiagnostics {
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Whether the symbol is in the predefined list.
    pub in_predefined_list: bool,
    /// Whether any snapshot was resolved.
    pub data_found: bool,
    /// Whether the snapshot has a non-zero price.
    pub has_real_data: bool,
    /// Resolved price.
    pub price: Decimal,
    /// Snapshot timestamp.
    pub last_updated: DateTime<Utc>,
    /// Human-readable summary.
    pub message: String,
    /// When the report was produced.
    pub timestamp: DateTime<Utc>,
}

/// Cache-first quote lookups over a shared cache and fetcher.
pub struct QuoteService {
    cache: Arc<QuoteCache>,
    fetcher: Arc<dyn QuoteFetcher>,
    symbols: Vec<Symbol>,
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("cache_entries", &self.cache.len())
            .field("symbols", &self.symbols)
            .finish_non_exhaustive()
    }
}

impl QuoteService {
    /// Create a service over `symbols`, the predefined list in display order.
    #[must_use]
    pub fn new(cache: Arc<QuoteCache>, fetcher: Arc<dyn QuoteFetcher>, symbols: Vec<Symbol>) -> Self {
        Self {
            cache,
            fetcher,
            symbols,
        }
    }

    /// Resolve a snapshot for `symbol`.
    ///
    /// A cached snapshot with real data is returned without touching the
    /// fetcher. Otherwise the fetched snapshot is cached and returned, even at
    /// a zero price; a failed fetch caches and returns a placeholder.
    pub async fn get_quote(&self, symbol: &str) -> QuoteSnapshot {
        match self.cache.get(symbol) {
            Some(snapshot) if snapshot.has_real_data() => {
                metrics::record_cache_lookup(CacheLookup::Real);
                tracing::debug!(symbol, "Serving cached quote");
                return snapshot;
            }
            Some(_) => metrics::record_cache_lookup(CacheLookup::Placeholder),
            None => metrics::record_cache_lookup(CacheLookup::Miss),
        }

        match self.fetcher.fetch(symbol).await {
            Ok(snapshot) => {
                self.cache.put(symbol, snapshot.clone());
                snapshot
            }
            Err(error) => {
                tracing::debug!(symbol, error = %error, "Fetch failed, caching placeholder");
                self.store_placeholder(symbol)
            }
        }
    }

    /// Snapshot for every predefined symbol, in list order.
    ///
    /// Never fetches; symbols without a cache entry get an unstored placeholder.
    #[must_use]
    pub fn get_all_predefined_quotes(&self) -> Vec<QuoteSnapshot> {
        let now = Utc::now();
        self.cache
            .get_all_or_placeholder(&self.symbols, |symbol| QuoteSnapshot::placeholder(symbol, now))
    }

    /// Fetch `symbol` regardless of what is cached.
    ///
    /// On failure the existing cache entry is returned untouched; with no
    /// entry, a placeholder is cached and returned.
    pub async fn refresh_quote(&self, symbol: &str) -> QuoteSnapshot {
        match self.fetcher.fetch(symbol).await {
            Ok(snapshot) => {
                self.cache.put(symbol, snapshot.clone());
                tracing::info!(symbol, price = %snapshot.current_price, "Quote refreshed on demand");
                snapshot
            }
            Err(error) => {
                tracing::warn!(symbol, error = %error, "On-demand refresh failed");
                self.cache
                    .get(symbol)
                    .unwrap_or_else(|| self.store_placeholder(symbol))
            }
        }
    }

    /// Cached snapshot without any fallback.
    #[must_use]
    pub fn cached_quote(&self, symbol: &str) -> Option<QuoteSnapshot> {
        self.cache.get(symbol)
    }

    /// Drop every cached snapshot.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached snapshots, placeholders included.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Predefined symbols whose cached snapshot has real data.
    #[must_use]
    pub fn real_data_count(&self) -> usize {
        self.cache.count_with_real_data(&self.symbols)
    }

    /// When the scheduler last completed a tick.
    #[must_use]
    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.cache.last_update_time()
    }

    /// The predefined symbol list.
    #[must_use]
    pub fn predefined_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether `symbol` is in the predefined list.
    #[must_use]
    pub fn is_predefined(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Resolve `symbol` through the read path and report what was found.
    pub async fn diagnose(&self, symbol: &str) -> QuoteDiagnostics {
        let in_predefined_list = self.is_predefined(symbol);
        let snapshot = self.get_quote(symbol).await;
        let has_real_data = snapshot.has_real_data();

        let message = if has_real_data {
            "Instrument data retrieved successfully".to_string()
        } else if in_predefined_list {
            "No real data available yet; placeholder returned".to_string()
        } else {
            "Symbol is not predefined and the quote API returned no price".to_string()
        };

        QuoteDiagnostics {
            symbol: snapshot.symbol,
            in_predefined_list,
            data_found: true,
            has_real_data,
            price: snapshot.current_price,
            last_updated: snapshot.last_updated,
            message,
            timestamp: Utc::now(),
        }
    }

    fn store_placeholder(&self, symbol: &str) -> QuoteSnapshot {
        let placeholder = QuoteSnapshot::placeholder(symbol, Utc::now());
        self.cache.put(symbol, placeholder.clone());
        placeholder
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::{FetchError, MockQuoteFetcher};

    fn real_snapshot(symbol: &str, price: Decimal) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: price,
            previous_close: price,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            last_updated: Utc::now(),
        }
    }

    fn service(fetcher: MockQuoteFetcher) -> (QuoteService, Arc<QuoteCache>) {
        let cache = Arc::new(QuoteCache::new());
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
        let service = QuoteService::new(Arc::clone(&cache), Arc::new(fetcher), symbols);
        (service, cache)
    }

    fn failing_fetcher() -> MockQuoteFetcher {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher.expect_fetch().returning(|symbol| {
            Err(FetchError::NoData {
                symbol: symbol.to_string(),
            })
        });
        fetcher
    }

    #[tokio::test]
    async fn real_cached_snapshot_skips_fetcher() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher.expect_fetch().never();
        let (service, cache) = service(fetcher);

        let cached = real_snapshot("AAPL", dec!(190.64));
        cache.put("AAPL", cached.clone());

        assert_eq!(service.get_quote("AAPL").await, cached);
    }

    #[tokio::test]
    async fn failed_fetch_caches_placeholder() {
        let (service, cache) = service(failing_fetcher());

        let snapshot = service.get_quote("XYZ").await;

        assert_eq!(snapshot.current_price, Decimal::ZERO);
        assert_eq!(snapshot.previous_close, Decimal::ZERO);
        assert_eq!(snapshot.change, Decimal::ZERO);
        assert_eq!(snapshot.change_percent, Decimal::ZERO);
        assert_eq!(cache.get("XYZ"), Some(snapshot));
    }

    #[tokio::test]
    async fn cached_placeholder_triggers_fetch() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|symbol| symbol == "AAPL")
            .times(1)
            .returning(|symbol| Ok(real_snapshot(symbol, dec!(190.64))));
        let (service, cache) = service(fetcher);
        cache.put("AAPL", QuoteSnapshot::placeholder("AAPL", Utc::now()));

        let snapshot = service.get_quote("AAPL").await;

        assert_eq!(snapshot.current_price, dec!(190.64));
        assert_eq!(cache.get("AAPL"), Some(snapshot));
    }

    #[tokio::test]
    async fn zero_price_response_is_still_cached() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|symbol| Ok(real_snapshot(symbol, Decimal::ZERO)));
        let (service, cache) = service(fetcher);

        let snapshot = service.get_quote("ZERO").await;

        assert!(!snapshot.has_real_data());
        assert_eq!(cache.get("ZERO"), Some(snapshot));
    }

    #[tokio::test]
    async fn predefined_quotes_follow_list_order_without_storing() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher.expect_fetch().never();
        let (service, cache) = service(fetcher);
        cache.put("MSFT", real_snapshot("MSFT", dec!(414.20)));

        let quotes = service.get_all_predefined_quotes();

        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, ["AAPL", "MSFT"]);
        assert!(!quotes[0].has_real_data());
        assert_eq!(quotes[1].current_price, dec!(414.20));
        assert_eq!(service.cache_size(), 1);
    }

    #[tokio::test]
    async fn refresh_bypasses_real_cache_entry() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|symbol| Ok(real_snapshot(symbol, dec!(200))));
        let (service, cache) = service(fetcher);
        cache.put("AAPL", real_snapshot("AAPL", dec!(190)));

        let snapshot = service.refresh_quote("AAPL").await;

        assert_eq!(snapshot.current_price, dec!(200));
        assert_eq!(cache.get("AAPL").map(|s| s.current_price), Some(dec!(200)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_existing_entry() {
        let (service, cache) = service(failing_fetcher());
        let existing = real_snapshot("AAPL", dec!(190));
        cache.put("AAPL", existing.clone());

        assert_eq!(service.refresh_quote("AAPL").await, existing);
        assert_eq!(cache.get("AAPL"), Some(existing));
    }

    #[tokio::test]
    async fn failed_refresh_without_entry_caches_placeholder() {
        let (service, cache) = service(failing_fetcher());

        let snapshot = service.refresh_quote("MSFT").await;

        assert!(!snapshot.has_real_data());
        assert_eq!(cache.get("MSFT"), Some(snapshot));
    }

    #[tokio::test]
    async fn clear_cache_empties_everything() {
        let (service, cache) = service(failing_fetcher());
        cache.put("AAPL", real_snapshot("AAPL", dec!(1)));
        cache.put("MSFT", real_snapshot("MSFT", dec!(2)));
        assert_eq!(service.cache_size(), 2);
        assert_eq!(service.real_data_count(), 2);

        service.clear_cache();

        assert_eq!(service.cache_size(), 0);
        assert!(service.cached_quote("AAPL").is_none());
    }

    #[tokio::test]
    async fn diagnose_reports_placeholder_for_unknown_symbol() {
        let (service, _cache) = service(failing_fetcher());

        let report = service.diagnose("XYZ").await;

        assert_eq!(report.symbol, "XYZ");
        assert!(!report.in_predefined_list);
        assert!(report.data_found);
        assert!(!report.has_real_data);
        assert_eq!(report.price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn diagnose_reports_real_data_for_predefined_symbol() {
        let mut fetcher = MockQuoteFetcher::new();
        fetcher.expect_fetch().never();
        let (service, cache) = service(fetcher);
        cache.put("AAPL", real_snapshot("AAPL", dec!(190.64)));

        let report = service.diagnose("AAPL").await;

        assert!(report.in_predefined_list);
        assert!(report.has_real_data);
        assert_eq!(report.price, dec!(190.64));
        assert_eq!(report.message, "Instrument data retrieved successfully");
    }

    #[test]
    fn predefined_membership() {
        let (service, _cache) = service(MockQuoteFetcher::new());
        assert!(service.is_predefined("MSFT"));
        assert!(!service.is_predefined("msft"));
        assert_eq!(service.predefined_symbols().len(), 2);
    }
}
