//! API Handlers
//!
//! HTTP request handlers for each feed server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{FetchCache, SharedCache};
use crate::catalog::{Catalog, CatalogItem};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::fetch::{CachedFetcher, RetryFetcher};
use crate::loader::PaginatedLoader;
use crate::models::{
    DeleteResponse, FeedResponse, HealthResponse, KeysResponse, LoadResponse, StatsResponse,
};

/// Cache namespace for catalogue pages.
pub const FEED_NAMESPACE: &str = "catalog";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loader driving the feed
    pub loader: Arc<PaginatedLoader<CatalogItem>>,
    /// Cache-fronted page source the loader reads through
    pub pages: CachedFetcher<CatalogItem>,
}

impl AppState {
    /// Creates a new AppState over an existing loader and its page source.
    pub fn new(
        loader: Arc<PaginatedLoader<CatalogItem>>,
        pages: CachedFetcher<CatalogItem>,
    ) -> Self {
        Self { loader, pages }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires catalogue -> retry -> page cache -> loader.
    pub fn from_config(config: &Config) -> Self {
        let catalog = Catalog::new(config.catalog_size, config.page_size, config.initial_page)
            .with_latency(Duration::from_millis(config.catalog_latency_ms));
        let source = RetryFetcher::new(catalog, config.retry_policy());
        let pages = CachedFetcher::new(
            source,
            FetchCache::new().into_shared(),
            FEED_NAMESPACE,
            config.cache_ttl_ms,
        );
        let loader = PaginatedLoader::new(pages.clone(), config.loader_options());

        Self::new(Arc::new(loader), pages)
    }

    /// The page cache.
    pub fn cache(&self) -> &SharedCache<Vec<CatalogItem>> {
        self.pages.cache()
    }
}

/// Handler for GET /feed
pub async fn feed_handler(State(state): State<AppState>) -> Json<FeedResponse<CatalogItem>> {
    Json(state.loader.snapshot().await.into())
}

/// Handler for POST /feed/more
///
/// Fetch failures are reported inside the body (`outcome: "failed"` plus
/// `last_error`), not as an HTTP error.
pub async fn load_more_handler(
    State(state): State<AppState>,
) -> Json<LoadResponse<CatalogItem>> {
    let outcome = state.loader.load_more().await;
    Json(LoadResponse::new(&outcome, state.loader.snapshot().await))
}

/// Handler for POST /feed/refresh
///
/// Cached pages are dropped first so the refresh reaches the source.
pub async fn refresh_handler(State(state): State<AppState>) -> Json<LoadResponse<CatalogItem>> {
    let dropped = state.pages.invalidate().await;
    info!(dropped, "pull-to-refresh");

    let outcome = state.loader.refresh().await;
    Json(LoadResponse::new(&outcome, state.loader.snapshot().await))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache().read().await.stats();
    Json(stats.into())
}

/// Handler for GET /cache/keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let mut keys = state.cache().read().await.keys();
    keys.sort();
    Json(KeysResponse { keys })
}

/// Handler for DELETE /cache/:key
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if key.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Key cannot be empty".to_string()));
    }

    if state.cache().write().await.remove(&key) {
        Ok(Json(DeleteResponse::new(format!("Key '{}' deleted", key), 1)))
    } else {
        Err(ApiError::NotFound(key))
    }
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<DeleteResponse> {
    let mut cache = state.cache().write().await;
    let removed = cache.len();
    cache.clear();

    Json(DeleteResponse::new("Cache cleared", removed))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        AppState::from_config(&Config {
            catalog_size: 25,
            catalog_latency_ms: 0,
            retry_base_delay_ms: 1,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_load_more_then_feed() {
        let state = test_state();

        let response = load_more_handler(State(state.clone())).await;
        assert_eq!(response.outcome, "loaded");
        assert_eq!(response.page, Some(1));

        let feed = feed_handler(State(state)).await;
        assert_eq!(feed.items.len(), 10);
        assert_eq!(feed.page_cursor, 2);
        assert!(feed.has_more);
    }

    #[tokio::test]
    async fn test_load_until_exhausted() {
        let state = test_state();

        for _ in 0..3 {
            load_more_handler(State(state.clone())).await;
        }
        let response = load_more_handler(State(state.clone())).await;

        assert_eq!(response.outcome, "skipped");
        assert_eq!(response.feed.items.len(), 25);
        assert!(!response.feed.has_more);
        assert_eq!(response.feed.status, "exhausted");
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cached_pages() {
        let state = test_state();

        load_more_handler(State(state.clone())).await;
        load_more_handler(State(state.clone())).await;
        assert_eq!(state.cache().read().await.len(), 2);

        let response = refresh_handler(State(state.clone())).await;
        assert_eq!(response.outcome, "loaded");
        assert_eq!(response.feed.items.len(), 10);
        assert_eq!(response.feed.page_cursor, 2);

        let keys = keys_handler(State(state)).await;
        assert_eq!(keys.keys, vec!["catalog:page:1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_key_handler() {
        let state = test_state();
        load_more_handler(State(state.clone())).await;

        let result =
            delete_key_handler(State(state.clone()), Path("catalog:page:1".to_string())).await;
        assert!(result.is_ok());

        let result = delete_key_handler(State(state), Path("catalog:page:1".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_and_stats_handlers() {
        let state = test_state();
        load_more_handler(State(state.clone())).await;

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);

        let cleared = clear_handler(State(state.clone())).await;
        assert_eq!(cleared.removed, 1);
        assert!(state.cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
