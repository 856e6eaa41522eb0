//! In-memory TTL cache and a caching provider wrapper.
//!
//! Entries expire after a fixed maximum age. Errors are never cached, so a
//! failed fetch is retried on the next request.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Fundamentals, Period, PriceSeries};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Key → value map whose entries are served only while younger than `max_age`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    max_age: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`. An entry aged exactly `max_age` is already stale.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        (now.saturating_duration_since(entry.stored_at) < self.max_age).then(|| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, stored_at: Instant) {
        self.lock().insert(key, CacheEntry { value, stored_at });
    }

    /// Serve a fresh entry, or run `fetch` and store its success.
    ///
    /// The lock is not held during `fetch`; concurrent misses may fetch twice.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every entry older than `max_age`. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < self.max_age);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Maximum ages for cached answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicy {
    /// Multi-month series and fundamentals.
    pub series_max_age: Duration,
    /// Short look-backs used for quotes (scanner, market pulse).
    pub quote_max_age: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            series_max_age: Duration::from_secs(300),
            quote_max_age: Duration::from_secs(60),
        }
    }
}

/// Wraps any provider with per-(symbol, period) series caching and
/// per-symbol fundamentals caching.
pub struct CachedProvider<P> {
    inner: P,
    series: TtlCache<(String, Period), PriceSeries>,
    quotes: TtlCache<(String, Period), PriceSeries>,
    fundamentals: TtlCache<String, Fundamentals>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, policy: CachePolicy) -> Self {
        Self {
            inner,
            series: TtlCache::new(policy.series_max_age),
            quotes: TtlCache::new(policy.quote_max_age),
            fundamentals: TtlCache::new(policy.series_max_age),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn cache_for(&self, period: Period) -> &TtlCache<(String, Period), PriceSeries> {
        if period == Period::FiveDays {
            &self.quotes
        } else {
            &self.series
        }
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_series(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        let key = (symbol.to_string(), period);
        let mut fetched = false;
        let series = self.cache_for(period).get_or_try_insert_with(key, || {
            fetched = true;
            self.inner.fetch_series(symbol, period)
        })?;
        if !fetched {
            debug!(symbol, %period, "series cache hit");
        }
        Ok(series)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        if let Some(f) = self.fundamentals.get(&symbol.to_string()) {
            return f;
        }
        let f = self.inner.fetch_fundamentals(symbol);
        // An empty record is usually a transient failure; ask again next time.
        if !f.is_empty() {
            self.fundamentals.insert(symbol.to_string(), f.clone());
        }
        f
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn entry_expires_at_max_age() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("2330.TW", 1005.0, t0);
        assert_eq!(cache.get_at(&"2330.TW", t0 + Duration::from_secs(59)), Some(1005.0));
        assert_eq!(cache.get_at(&"2330.TW", t0 + Duration::from_secs(60)), None);
        assert_eq!(cache.get_at(&"2317.TW", t0), None);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let first: Result<u32, &str> = cache.get_or_try_insert_with("k", || Err("boom"));
        assert!(first.is_err());
        assert!(cache.is_empty());
        let second: Result<u32, &str> = cache.get_or_try_insert_with("k", || Ok(7));
        assert_eq!(second, Ok(7));
        let third: Result<u32, &str> = cache.get_or_try_insert_with("k", || Ok(8));
        assert_eq!(third, Ok(7));
    }

    #[test]
    fn purge_removes_stale_entries() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert(1, "old");
        std::thread::sleep(Duration::from_millis(30));
        cache.insert(2, "new");
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    struct CountingProvider {
        series_calls: AtomicUsize,
        fundamentals_calls: AtomicUsize,
    }

    impl MarketDataProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch_series(&self, symbol: &str, _period: Period) -> Result<PriceSeries, DataError> {
            self.series_calls.fetch_add(1, Ordering::SeqCst);
            let bar = Bar {
                date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1000,
            };
            Ok(PriceSeries::new(symbol, vec![bar])?)
        }

        fn fetch_fundamentals(&self, _symbol: &str) -> Fundamentals {
            self.fundamentals_calls.fetch_add(1, Ordering::SeqCst);
            Fundamentals {
                trailing_pe: Some(18.0),
                ..Fundamentals::default()
            }
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn cached_provider_reuses_answers_per_symbol_and_period() {
        let provider = CachedProvider::new(
            CountingProvider {
                series_calls: AtomicUsize::new(0),
                fundamentals_calls: AtomicUsize::new(0),
            },
            CachePolicy::default(),
        );

        provider.fetch_series("2330.TW", Period::OneYear).unwrap();
        provider.fetch_series("2330.TW", Period::OneYear).unwrap();
        provider.fetch_series("2330.TW", Period::FiveDays).unwrap();
        provider.fetch_series("2317.TW", Period::OneYear).unwrap();
        assert_eq!(provider.inner().series_calls.load(Ordering::SeqCst), 3);

        provider.fetch_fundamentals("2330.TW");
        provider.fetch_fundamentals("2330.TW");
        assert_eq!(provider.inner().fundamentals_calls.load(Ordering::SeqCst), 1);
    }

    /// Fails the first series request, then answers.
    struct FlakyProvider {
        series_calls: AtomicUsize,
    }

    impl MarketDataProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch_series(&self, symbol: &str, _period: Period) -> Result<PriceSeries, DataError> {
            if self.series_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(DataError::NetworkUnreachable("connection reset".into()));
            }
            let bar = Bar {
                date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                open: 50.0,
                high: 50.0,
                low: 50.0,
                close: 50.0,
                volume: 10,
            };
            Ok(PriceSeries::new(symbol, vec![bar])?)
        }

        fn fetch_fundamentals(&self, _symbol: &str) -> Fundamentals {
            Fundamentals::default()
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn cached_provider_retries_after_error_then_serves_from_cache() {
        let provider = CachedProvider::new(
            FlakyProvider {
                series_calls: AtomicUsize::new(0),
            },
            CachePolicy::default(),
        );

        assert!(provider.fetch_series("6488.TWO", Period::OneMonth).is_err());
        let fetched = provider.fetch_series("6488.TWO", Period::OneMonth).unwrap();
        let cached = provider.fetch_series("6488.TWO", Period::OneMonth).unwrap();
        assert_eq!(fetched, cached);
        assert_eq!(provider.inner().series_calls.load(Ordering::SeqCst), 2);
    }
}
