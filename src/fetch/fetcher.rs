//! Page fetcher trait.

use std::future::Future;

use async_trait::async_trait;

use crate::error::FetchError;

/// Produces one page of items for a page number.
///
/// Implemented for any `Fn(u32) -> impl Future<Output = Result<Vec<T>, FetchError>>`
/// closure, so ad hoc sources need no wrapper type.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    /// Fetches page `page`. An empty vector means there is nothing on that page.
    async fn fetch_page(&self, page: u32) -> Result<Vec<T>, FetchError>;
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for F
where
    T: Send + 'static,
    F: Fn(u32) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
    async fn fetch_page(&self, page: u32) -> Result<Vec<T>, FetchError> {
        (self)(page).await
    }
}
