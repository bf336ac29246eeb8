//! Cache Module
//!
//! Time-boxed in-memory caching plus an optional durable layer.

mod entry;
mod stats;
mod storage;
mod store;
mod tiered;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
pub use store::{FetchCache, SharedCache};
pub use tiered::TieredCache;
