//! Demo catalogue source
//!
//! A synthetic, page-numbered title listing that stands in for a remote
//! browse API. It serves fixed-size pages with an optional artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::fetch::PageFetcher;

/// One title in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    page_size: usize,
    first_page: u32,
    latency: Duration,
}

impl Catalog {
    /// Builds a catalogue of `size` titles served `page_size` at a time,
    /// numbering pages from `first_page`.
    pub fn new(size: usize, page_size: usize, first_page: u32) -> Self {
        let items = (1..=size as u32)
            .map(|id| CatalogItem {
                id,
                title: format!("Title #{id:03}"),
            })
            .collect();

        Self {
            items,
            page_size,
            first_page,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items on `page`, or an empty page past the end.
    pub fn page(&self, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        if page < self.first_page || self.page_size == 0 {
            return Err(FetchError::InvalidPage(page));
        }

        let start = (page - self.first_page) as usize * self.page_size;
        Ok(self
            .items
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PageFetcher<CatalogItem> for Catalog {
    async fn fetch_page(&self, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.page(page)
    }
}
