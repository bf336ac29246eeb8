//! Response DTOs for the demo feed server
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::loader::{LoadOutcome, LoaderSnapshot};

/// Loader state as seen by a list UI (GET /feed)
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse<T> {
    pub items: Vec<T>,
    pub page_cursor: u32,
    pub is_loading: bool,
    pub has_more: bool,
    /// Message of the last failed fetch, if the last attempt failed
    pub last_error: Option<String>,
    pub status: &'static str,
}

impl<T> From<LoaderSnapshot<T>> for FeedResponse<T> {
    fn from(snapshot: LoaderSnapshot<T>) -> Self {
        Self {
            items: snapshot.items,
            page_cursor: snapshot.page_cursor,
            is_loading: snapshot.is_loading,
            has_more: snapshot.has_more,
            last_error: snapshot.last_error.map(|err| err.to_string()),
            status: snapshot.status.as_str(),
        }
    }
}

/// Result of POST /feed/more and POST /feed/refresh
#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse<T> {
    /// What the call did: loaded, exhausted, failed, skipped or discarded
    pub outcome: &'static str,
    /// Page the call requested, when it requested one
    pub page: Option<u32>,
    pub feed: FeedResponse<T>,
}

impl<T> LoadResponse<T> {
    pub fn new(outcome: &LoadOutcome, snapshot: LoaderSnapshot<T>) -> Self {
        let page = match outcome {
            LoadOutcome::Loaded { page, .. }
            | LoadOutcome::Exhausted { page }
            | LoadOutcome::Failed { page, .. }
            | LoadOutcome::Discarded { page } => Some(*page),
            LoadOutcome::Skipped => None,
        };

        Self {
            outcome: outcome.as_str(),
            page,
            feed: snapshot.into(),
        }
    }
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// Hit rate as a ratio (0.0 to 1.0)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for GET /cache/keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

/// Response body for the cache DELETE endpoints
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl DeleteResponse {
    pub fn new(message: impl Into<String>, removed: usize) -> Self {
        Self {
            message: message.into(),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
