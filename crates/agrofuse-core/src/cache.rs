//! TTL-bounded response cache for source calls.
//!
//! A generic memoizer plus thin per-trait decorators that wrap a source in
//! caching without the source knowing. Only successful snapshots are stored;
//! a [`SourceFailure`] is never served from cache. Lookups and inserts are
//! short local critical sections; the lock is never held across an external
//! call, so concurrent misses for the same key independently re-fetch
//! (duplicate-call tolerance, not request coalescing).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use time::Date;

use crate::domain::{format_day, MarketRow, SoilSnapshot, WeatherSnapshot};
use crate::sources::{
    CityQuery, MarketDaySource, RegionQuery, SoilSource, SourceFailure, SourceFuture,
    WeatherSource,
};

/// Deterministic cache key derived from a source name and its argument
/// values. Arguments are sorted by name, so keyword order never matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(source: &str, args: &[(&str, &str)]) -> Self {
        let mut pairs: Vec<String> = args
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        pairs.sort();
        Self(format!("{source}?{}", pairs.join("&")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hit/miss counters exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

#[derive(Debug)]
struct Inner<T> {
    map: HashMap<CacheKey, Entry<T>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe TTL memoizer for one result type.
#[derive(Debug, Clone)]
pub struct ResponseCache<T: Clone> {
    ttl: Duration,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(Mutex::new(Inner {
                map: HashMap::new(),
                hits: 0,
                misses: 0,
            })),
        }
    }

    /// Read a live entry. An entry whose age has reached the TTL is removed
    /// on the spot and counted as a miss; a read never returns data staler
    /// than the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        let mut inner = self.inner.lock().expect("cache lock is not poisoned");

        enum Lookup<T> {
            Hit(T),
            Expired,
            Missing,
        }

        let lookup = match inner.map.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Missing,
        };

        match lookup {
            Lookup::Hit(value) => {
                inner.hits += 1;
                Some(value)
            }
            Lookup::Expired => {
                inner.map.remove(key);
                inner.misses += 1;
                None
            }
            Lookup::Missing => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn put(&self, key: CacheKey, value: T) {
        let mut inner = self.inner.lock().expect("cache lock is not poisoned");
        inner.map.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Serve from cache or invoke `fetch`. Only `Ok` results are stored; a
    /// failure is returned to the caller and the next call fetches again.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        fetch: F,
    ) -> Result<T, SourceFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceFailure>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let result = fetch().await;
        if let Ok(value) = &result {
            self.put(key, value.clone());
        }
        result
    }

    /// Drop every expired entry; optional, bounds memory growth in
    /// long-running processes.
    pub fn purge_expired(&self) {
        let mut inner = self.inner.lock().expect("cache lock is not poisoned");
        let ttl = self.ttl;
        inner.map.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache lock is not poisoned");
        inner.map.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock is not poisoned");
        CacheStats {
            entries: inner.map.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

/// Caching decorator for a weather source.
pub struct CachedWeatherSource {
    inner: Arc<dyn WeatherSource>,
    cache: ResponseCache<WeatherSnapshot>,
}

impl CachedWeatherSource {
    pub fn new(inner: Arc<dyn WeatherSource>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl WeatherSource for CachedWeatherSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn fetch<'a>(&'a self, query: &'a CityQuery) -> SourceFuture<'a, WeatherSnapshot> {
        Box::pin(async move {
            let key = CacheKey::new(
                self.inner.name(),
                &[("city", &query.city), ("country", &query.country)],
            );
            self.cache
                .get_or_fetch(key, || self.inner.fetch(query))
                .await
        })
    }
}

/// Caching decorator for a soil source.
pub struct CachedSoilSource {
    inner: Arc<dyn SoilSource>,
    cache: ResponseCache<SoilSnapshot>,
}

impl CachedSoilSource {
    pub fn new(inner: Arc<dyn SoilSource>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl SoilSource for CachedSoilSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn fetch<'a>(&'a self, query: &'a RegionQuery) -> SourceFuture<'a, SoilSnapshot> {
        Box::pin(async move {
            let district = query.district.as_deref().unwrap_or("");
            let key = CacheKey::new(
                self.inner.name(),
                &[("state", query.state.as_str()), ("district", district)],
            );
            self.cache
                .get_or_fetch(key, || self.inner.fetch(query))
                .await
        })
    }
}

/// Caching decorator for a market day source.
pub struct CachedMarketDaySource {
    inner: Arc<dyn MarketDaySource>,
    cache: ResponseCache<Vec<MarketRow>>,
}

impl CachedMarketDaySource {
    pub fn new(inner: Arc<dyn MarketDaySource>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl MarketDaySource for CachedMarketDaySource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn fetch_day<'a>(&'a self, day: Date) -> SourceFuture<'a, Vec<MarketRow>> {
        Box::pin(async move {
            let key = CacheKey::new(self.inner.name(), &[("date", &format_day(day))]);
            self.cache
                .get_or_fetch(key, || self.inner.fetch_day(day))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn key_is_order_independent() {
        let a = CacheKey::new("weather", &[("city", "Kochi"), ("country", "IN")]);
        let b = CacheKey::new("weather", &[("country", "IN"), ("city", "Kochi")]);
        assert_eq!(a, b);
    }

    #[test]
    fn key_distinguishes_sources_and_arguments() {
        let a = CacheKey::new("weather", &[("city", "Kochi")]);
        let b = CacheKey::new("soil", &[("city", "Kochi")]);
        let c = CacheKey::new("weather", &[("city", "Chennai")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn identical_calls_within_ttl_invoke_the_source_once() {
        let cache = ResponseCache::<u32>::new(Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let key = CacheKey::new("demo", &[("arg", "1")]);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .expect("fetch succeeds");
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let cache = ResponseCache::<u32>::new(Duration::from_millis(50));
        let calls = AtomicU32::new(0);
        let key = CacheKey::new("demo", &[("arg", "1")]);

        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        cache.get_or_fetch(key.clone(), fetch).await.expect("ok");
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.get_or_fetch(key.clone(), fetch).await.expect("ok");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_never_cached() {
        let cache = ResponseCache::<u32>::new(Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let key = CacheKey::new("demo", &[("arg", "1")]);

        for _ in 0..2 {
            let result = cache
                .get_or_fetch(key.clone(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(SourceFailure::timeout("upstream timed out"))
                })
                .await;
            assert!(result.is_err());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn purge_and_clear_bound_the_map() {
        let cache = ResponseCache::<u32>::new(Duration::from_secs(60));
        cache.put(CacheKey::new("demo", &[("arg", "1")]), 1);
        cache.put(CacheKey::new("demo", &[("arg", "2")]), 2);
        assert_eq!(cache.stats().entries, 2);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
