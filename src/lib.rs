//! Mini Pager - paginated loading over a time-boxed fetch cache
//!
//! [`PaginatedLoader`] accumulates a list one page at a time behind a
//! `load_more` / `refresh` contract. [`FetchCache`] keeps fetched values
//! fresh for a per-key TTL and can front any page source through
//! [`CachedFetcher`]. A small axum server in [`api`] exposes a loader over
//! a demo catalogue.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{FetchCache, SharedCache, TieredCache};
pub use config::Config;
pub use error::{FetchError, StorageError};
pub use fetch::{cached_fetch, CachedFetcher, PageFetcher, RetryFetcher, RetryPolicy};
pub use loader::{LoadOutcome, LoaderOptions, LoaderSnapshot, LoaderStatus, PaginatedLoader};
pub use tasks::spawn_sweep_task;
