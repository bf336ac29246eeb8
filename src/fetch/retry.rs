//! Retry-with-backoff decorator for page fetchers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::FetchError;
use crate::fetch::PageFetcher;

// == Retry Policy ==
/// How many times to attempt a fetch and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; zero behaves like one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Deadline for each individual attempt
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// A policy that tries once and never waits.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Doubles from `base_delay` and saturates at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            attempt_timeout: None,
        }
    }
}

// == Retry Fetcher ==
/// Page fetcher that repeats retryable failures of its inner fetcher.
pub struct RetryFetcher<T> {
    inner: Arc<dyn PageFetcher<T>>,
    policy: RetryPolicy,
}

impl<T: 'static> RetryFetcher<T> {
    pub fn new(inner: impl PageFetcher<T> + 'static, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(inner),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, page: u32) -> Result<Vec<T>, FetchError> {
        match self.policy.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.fetch_page(page))
                .await
                .unwrap_or(Err(FetchError::Timeout(limit.as_millis() as u64))),
            None => self.inner.fetch_page(page).await,
        }
    }
}

#[async_trait]
impl<T> PageFetcher<T> for RetryFetcher<T>
where
    T: Send + 'static,
{
    async fn fetch_page(&self, page: u32) -> Result<Vec<T>, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(page).await {
                Ok(items) => return Ok(items),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        page,
                        attempt,
                        error = %err,
                        "page fetch failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
