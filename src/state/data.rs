/// Shared data structures for the gallery state
///
/// These structs represent the data model that flows between
/// the image source, the pager and the UI layer.

use super::pager::FetchFailure;

/// Represents a single image in the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    /// Unique within the accumulated list, derived from (page, index)
    pub id: String,
    /// Where the image can be loaded from
    pub url: String,
}

impl ImageItem {
    /// Build the item at `index` within `page`.
    /// The id is `"{page}-{index}"` so it never repeats across pages.
    pub fn for_slot(page: u32, index: usize, url: String) -> Self {
        Self {
            id: format!("{}-{}", page, index),
            url,
        }
    }
}

/// Borrowed view of the pager, consumed by the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagerState<'a> {
    /// Accumulated items in display order
    pub items: &'a [ImageItem],
    /// Next page to fetch (starts at 1)
    pub page: u32,
    /// True while a fetch is in flight
    pub loading: bool,
    /// Set when the last fetch failed and paging is halted
    pub failure: Option<&'a FetchFailure>,
}
