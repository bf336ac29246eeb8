//! Fetch Module
//!
//! The page-fetch abstraction consumed by loaders, and the decorators that
//! wrap it with caching and retries.

mod cached;
mod fetcher;
mod retry;

pub use cached::{cached_fetch, CachedFetcher};
pub use fetcher::PageFetcher;
pub use retry::{RetryFetcher, RetryPolicy};
