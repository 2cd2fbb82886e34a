/// Placeholder image source
///
/// Generates picsum.photos URLs instead of calling a real listing API.
/// A configurable delay stands in for network latency, and `flaky_page`
/// makes one page fail transiently the first time it is requested.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ImageSource;
use crate::config::GalleryConfig;
use crate::error::FetchError;
use crate::state::data::ImageItem;

#[derive(Debug)]
pub struct PlaceholderSource {
    batch_size: usize,
    delay: Duration,
    url_template: String,
    flaky_page: Option<u32>,
    flaked: AtomicBool,
}

impl PlaceholderSource {
    pub fn new(batch_size: usize, delay: Duration, url_template: impl Into<String>) -> Self {
        Self {
            batch_size,
            delay,
            url_template: url_template.into(),
            flaky_page: None,
            flaked: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &GalleryConfig) -> Self {
        Self::new(
            config.batch_size,
            Duration::from_millis(config.fetch_delay_ms),
            config.url_template.clone(),
        )
        .with_flaky_page(config.flaky_page)
    }

    /// Fail `page` once with a transient error
    pub fn with_flaky_page(mut self, page: Option<u32>) -> Self {
        self.flaky_page = page;
        self
    }

    /// Build a page without waiting
    pub fn page_items(&self, page: u32) -> Vec<ImageItem> {
        (0..self.batch_size)
            .map(|index| {
                let n = page as u64 * self.batch_size as u64 + index as u64;
                let url = self.url_template.replace("{n}", &n.to_string());
                ImageItem::for_slot(page, index, url)
            })
            .collect()
    }
}

#[async_trait]
impl ImageSource for PlaceholderSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<ImageItem>, FetchError> {
        if page == 0 {
            return Err(FetchError::Permanent("pages start at 1".into()));
        }

        let items = self.page_items(page);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.flaky_page == Some(page) && !self.flaked.swap(true, Ordering::Relaxed) {
            warn!(page, "placeholder source simulating a dropped connection");
            return Err(FetchError::Transient(format!("connection reset on page {}", page)));
        }

        debug!(page, count = items.len(), "placeholder page ready");
        Ok(items)
    }
}
