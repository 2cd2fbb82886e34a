/// Image sources
///
/// An image source turns a page number into a batch of image descriptors.
/// The gallery only ever talks to the `ImageSource` trait, so a real
/// image-listing API can replace the placeholder without touching the pager.
/// `ImageLoader` downloads the bytes behind each item's URL.

pub mod loader;
pub mod placeholder;

pub use loader::{HttpImageLoader, ImageLoader};
pub use placeholder::PlaceholderSource;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::state::data::ImageItem;

#[async_trait]
pub trait ImageSource: Send + Sync + std::fmt::Debug {
    /// Fetch page `page` (1-based). Items must be returned in display order
    /// and their ids must be unique across pages.
    async fn fetch_page(&self, page: u32) -> Result<Vec<ImageItem>, FetchError>;
}
