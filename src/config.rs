//! Configuration Module
//!
//! Handles loading and managing demo server configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::fetch::RetryPolicy;
use crate::loader::LoaderOptions;

/// Demo server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Items per page, for both the catalogue and the loader
    pub page_size: usize,
    /// First page number
    pub initial_page: u32,
    /// Freshness window for cached pages, in milliseconds
    pub cache_ttl_ms: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Number of titles the demo catalogue serves
    pub catalog_size: usize,
    /// Simulated latency of each catalogue request, in milliseconds
    pub catalog_latency_ms: u64,
    /// Attempts per page fetch, including the first
    pub retry_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub retry_base_delay_ms: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`env_or`], but a value below `min` falls back to `default`.
fn env_at_least<T>(name: &str, default: T, min: T) -> T
where
    T: FromStr + PartialOrd + Copy + Display,
{
    let value = env_or(name, default);
    if value < min {
        warn!("{}={} is below the minimum of {}, using {}", name, value, min, default);
        return default;
    }
    value
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PAGE_SIZE` - Items per page, at least 1 (default: 10)
    /// - `INITIAL_PAGE` - First page number (default: 1)
    /// - `CACHE_TTL_MS` - Cached page freshness in ms (default: 60000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds, at least 1 (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CATALOG_SIZE` - Titles in the demo catalogue (default: 95)
    /// - `CATALOG_LATENCY_MS` - Simulated request latency (default: 150)
    /// - `RETRY_ATTEMPTS` - Attempts per page fetch (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First retry delay in ms (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            page_size: env_at_least("PAGE_SIZE", defaults.page_size, 1),
            initial_page: env_or("INITIAL_PAGE", defaults.initial_page),
            cache_ttl_ms: env_or("CACHE_TTL_MS", defaults.cache_ttl_ms),
            sweep_interval: env_at_least("SWEEP_INTERVAL", defaults.sweep_interval, 1),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            catalog_size: env_or("CATALOG_SIZE", defaults.catalog_size),
            catalog_latency_ms: env_or("CATALOG_LATENCY_MS", defaults.catalog_latency_ms),
            retry_attempts: env_or("RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::new()
            .with_page_size(self.page_size)
            .with_initial_page(self.initial_page)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.retry_attempts)
            .with_base_delay(Duration::from_millis(self.retry_base_delay_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 10,
            initial_page: 1,
            cache_ttl_ms: 60_000,
            sweep_interval: 30,
            server_port: 3000,
            catalog_size: 95,
            catalog_latency_ms: 150,
            retry_attempts: 3,
            retry_base_delay_ms: 200,
        }
    }
}
