//! Cache-fronted fetching.
//!
//! [`CachedFetcher`] answers pages out of a shared [`FetchCache`] while they
//! are fresh; [`cached_fetch`] does the same for a single keyed value.
//!
//! [`FetchCache`]: crate::cache::FetchCache

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::SharedCache;
use crate::error::FetchError;
use crate::fetch::PageFetcher;

// == Cached Fetch ==
/// Returns the fresh cached value for `key`, or runs `fetch` and caches its
/// result for `ttl_ms`. Failures are returned as-is and never cached.
pub async fn cached_fetch<V, F, Fut>(
    cache: &SharedCache<V>,
    key: &str,
    ttl_ms: u64,
    fetch: F,
) -> Result<V, FetchError>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, FetchError>>,
{
    if let Some(value) = cache.write().await.get(key) {
        return Ok(value);
    }

    let value = fetch().await?;
    cache.write().await.set(key, value.clone(), ttl_ms);
    Ok(value)
}

// == Cached Fetcher ==
/// Page fetcher that consults a shared cache before its inner fetcher.
///
/// Pages are stored under `"<namespace>:page:<n>"`. Clones share the inner
/// fetcher, the cache and the invalidation epoch.
///
/// A page whose fetch started before the latest [`invalidate`] is returned
/// to its caller but not cached, so a slow request cannot repopulate the
/// cache with data from before the invalidation.
///
/// [`invalidate`]: CachedFetcher::invalidate
pub struct CachedFetcher<T> {
    inner: Arc<dyn PageFetcher<T>>,
    cache: SharedCache<Vec<T>>,
    namespace: String,
    ttl_ms: u64,
    epoch: Arc<AtomicU64>,
}

impl<T> Clone for CachedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cache: Arc::clone(&self.cache),
            namespace: self.namespace.clone(),
            ttl_ms: self.ttl_ms,
            epoch: Arc::clone(&self.epoch),
        }
    }
}

impl<T: 'static> CachedFetcher<T> {
    pub fn new(
        inner: impl PageFetcher<T> + 'static,
        cache: SharedCache<Vec<T>>,
        namespace: impl Into<String>,
        ttl_ms: u64,
    ) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
            namespace: namespace.into(),
            ttl_ms,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn cache(&self) -> &SharedCache<Vec<T>> {
        &self.cache
    }

    /// Cache key for page `page`.
    pub fn key_for(&self, page: u32) -> String {
        format!("{}:page:{}", self.namespace, page)
    }

    /// Drops every cached page in this fetcher's namespace.
    ///
    /// Returns the number of pages removed.
    pub async fn invalidate(&self) -> usize {
        let prefix = format!("{}:", self.namespace);
        let mut cache = self.cache.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let removed = cache.remove_prefix(&prefix);
        drop(cache);

        debug!(namespace = %self.namespace, removed, "invalidated cached pages");
        removed
    }
}

#[async_trait]
impl<T> PageFetcher<T> for CachedFetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, page: u32) -> Result<Vec<T>, FetchError> {
        let key = self.key_for(page);
        let started_in = {
            let mut cache = self.cache.write().await;
            if let Some(items) = cache.get(&key) {
                return Ok(items);
            }
            self.epoch.load(Ordering::SeqCst)
        };

        let items = self.inner.fetch_page(page).await?;

        // Epoch is bumped under the same lock by `invalidate`
        let mut cache = self.cache.write().await;
        if self.epoch.load(Ordering::SeqCst) == started_in {
            cache.set(key, items.clone(), self.ttl_ms);
        } else {
            debug!(key = %key, "page fetched before invalidation, not caching");
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchCache;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn counting_fetcher(calls: Arc<AtomicUsize>) -> impl PageFetcher<u32> + 'static {
        move |page: u32| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, FetchError>(vec![page * 10, page * 10 + 1])
            }
        }
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = FetchCache::new().into_shared();
        let fetcher = CachedFetcher::new(counting_fetcher(calls.clone()), cache, "feed", 60_000);

        assert_eq!(fetcher.fetch_page(2).await.unwrap(), vec![20, 21]);
        assert_eq!(fetcher.fetch_page(2).await.unwrap(), vec![20, 21]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        fetcher.fetch_page(3).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_page_is_refetched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let clock = ManualClock::new(0);
        let cache = FetchCache::with_clock(Arc::new(clock.clone())).into_shared();
        let fetcher = CachedFetcher::new(counting_fetcher(calls.clone()), cache, "feed", 100);

        fetcher.fetch_page(1).await.unwrap();
        clock.advance(101);
        fetcher.fetch_page(1).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_only_touches_namespace() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: SharedCache<Vec<u32>> = FetchCache::new().into_shared();
        cache.write().await.set("other:page:1", vec![9], 60_000);

        let fetcher =
            CachedFetcher::new(counting_fetcher(calls.clone()), cache.clone(), "feed", 60_000);
        fetcher.fetch_page(1).await.unwrap();
        fetcher.fetch_page(2).await.unwrap();

        assert_eq!(fetcher.invalidate().await, 2);
        assert_eq!(cache.read().await.keys(), vec!["other:page:1".to_string()]);

        fetcher.fetch_page(1).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_started_before_invalidate_is_not_cached() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let cache: SharedCache<Vec<u32>> = FetchCache::new().into_shared();
        let fetcher = CachedFetcher::new(
            {
                let (started, release) = (started.clone(), release.clone());
                move |page: u32| {
                    let (started, release) = (started.clone(), release.clone());
                    async move {
                        started.notify_one();
                        release.notified().await;
                        Ok::<_, FetchError>(vec![page])
                    }
                }
            },
            cache.clone(),
            "feed",
            60_000,
        );

        let slow = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch_page(2).await }
        });
        started.notified().await;

        fetcher.invalidate().await;
        release.notify_one();

        assert_eq!(slow.await.unwrap(), Ok(vec![2]));
        assert!(!cache.read().await.contains_key("feed:page:2"));

        // Fetches started after the invalidation are cached again
        release.notify_one();
        fetcher.fetch_page(2).await.unwrap();
        assert!(cache.read().await.contains_key("feed:page:2"));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let cache = FetchCache::new().into_shared();
        let fetcher = CachedFetcher::new(
            move |_page: u32| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(FetchError::network("network error"))
                    } else {
                        Ok(vec!["x"])
                    }
                }
            },
            cache.clone(),
            "feed",
            60_000,
        );

        assert!(fetcher.fetch_page(1).await.is_err());
        assert!(cache.read().await.is_empty());
        assert_eq!(fetcher.fetch_page(1).await.unwrap(), vec!["x"]);
    }

    #[tokio::test]
    async fn test_cached_fetch_single_key() {
        let cache: SharedCache<String> = FetchCache::new().into_shared();

        let first = cached_fetch(&cache, "profile", 60_000, || async {
            Ok("ada".to_string())
        })
        .await
        .unwrap();
        let second = cached_fetch(&cache, "profile", 60_000, || async {
            Err(FetchError::network("should not be called"))
        })
        .await
        .unwrap();

        assert_eq!(first, "ada");
        assert_eq!(second, "ada");
    }
}
