/// Infinite-scrolling gallery widget
///
/// Ties the pager, the sentinel, an image source and an image loader
/// together. Tiles show their id until the image bytes arrive. The host
/// mounts it, forwards its messages and viewport changes, and calls
/// `unmount` before dropping it.

use iced::alignment::{Horizontal, Vertical};
use iced::widget::{
    button, column, container, image, row, scrollable, text, Column, Row, Space,
};
use iced::{ContentFit, Element, Length, Size, Task, Theme};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::style::GalleryStyle;
use crate::error::FetchError;
use crate::sentinel::{Sentinel, Trigger, ViewportGeometry};
use crate::source::{ImageLoader, ImageSource};
use crate::state::data::{ImageItem, PagerState};
use crate::state::pager::{Completion, FetchTicket, ScrollPager};

#[derive(Debug, Clone)]
pub enum Message {
    /// The scrollable moved or changed size
    Scrolled(ViewportGeometry),
    /// The space available to the gallery changed
    Resized(Size),
    /// A fetch finished
    PageLoaded(FetchTicket, Result<Vec<ImageItem>, FetchError>),
    /// The bytes for one tile arrived
    ImageLoaded {
        session: u64,
        id: String,
        result: Result<image::Handle, FetchError>,
    },
    /// User asked to retry a failed page
    Retry,
}

impl From<scrollable::Viewport> for ViewportGeometry {
    fn from(viewport: scrollable::Viewport) -> Self {
        let bounds = viewport.bounds();
        Self {
            width: bounds.width,
            height: bounds.height,
            offset_y: viewport.absolute_offset().y,
        }
    }
}

/// Download state of a tile's image
#[derive(Debug, Clone)]
pub enum Thumbnail {
    Loading,
    Ready(image::Handle),
    Unavailable,
}

/// What the sentinel row shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indicator {
    Hidden,
    Loading,
    Failed { message: String, retryable: bool },
}

impl Indicator {
    pub fn for_state(state: &PagerState<'_>) -> Self {
        if state.loading {
            return Indicator::Loading;
        }
        match state.failure {
            Some(failure) => Indicator::Failed {
                message: failure.error.to_string(),
                retryable: failure.error.is_retryable(),
            },
            None => Indicator::Hidden,
        }
    }
}

pub struct Gallery {
    pager: ScrollPager,
    sentinel: Sentinel,
    source: Arc<dyn ImageSource>,
    loader: Arc<dyn ImageLoader>,
    thumbnails: HashMap<String, Thumbnail>,
    style: GalleryStyle,
    viewport: ViewportGeometry,
    scrollable_id: scrollable::Id,
}

impl Gallery {
    /// Mount a fresh gallery and start observing its boundary.
    ///
    /// The boundary of an empty gallery is usually in view right away, so the
    /// returned task normally fetches the first page.
    pub fn mount(
        source: Arc<dyn ImageSource>,
        loader: Arc<dyn ImageLoader>,
        style: GalleryStyle,
        threshold: f32,
        available: Size,
    ) -> (Self, Task<Message>) {
        let mut gallery = Gallery {
            pager: ScrollPager::new(),
            sentinel: Sentinel::new(threshold),
            source,
            loader,
            thumbnails: HashMap::new(),
            style,
            viewport: ViewportGeometry::new(available.width, available.height),
            scrollable_id: scrollable::Id::unique(),
        };

        gallery.sentinel.attach();
        info!(session = gallery.pager.session(), "gallery mounted");

        let task = gallery.observe();
        (gallery, task)
    }

    /// Detach the sentinel and drop any pending fetch on the floor
    pub fn unmount(&mut self) {
        self.sentinel.detach();
        self.pager.teardown();
        info!(
            session = self.pager.session(),
            items = self.pager.items().len(),
            "gallery unmounted"
        );
    }

    pub fn pager(&self) -> &ScrollPager {
        &self.pager
    }

    #[cfg(test)]
    pub fn sentinel(&self) -> &Sentinel {
        &self.sentinel
    }

    pub fn thumbnail(&self, id: &str) -> Option<&Thumbnail> {
        self.thumbnails.get(id)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Scrolled(viewport) => {
                self.viewport = viewport;
                self.observe()
            }
            Message::Resized(size) => {
                self.viewport.width = size.width;
                self.viewport.height = size.height;
                self.observe()
            }
            Message::PageLoaded(ticket, result) => match self.pager.complete(ticket, result) {
                Completion::Applied { added } => {
                    let total = self.pager.items().len();
                    let fresh: Vec<ImageItem> = self.pager.items()[total - added..].to_vec();
                    let mut tasks: Vec<Task<Message>> =
                        fresh.into_iter().map(|item| self.load_image(item)).collect();
                    // Content grew; the boundary may still be in view
                    tasks.push(self.observe());
                    Task::batch(tasks)
                }
                Completion::Failed | Completion::Ignored => Task::none(),
            },
            Message::ImageLoaded {
                session,
                id,
                result,
            } => {
                if session != self.pager.session() {
                    debug!(session, %id, "ignoring image from another mount");
                    return Task::none();
                }
                if let Some(slot) = self.thumbnails.get_mut(&id) {
                    *slot = match result {
                        Ok(handle) => Thumbnail::Ready(handle),
                        Err(e) => {
                            warn!(%id, error = %e, "image download failed");
                            Thumbnail::Unavailable
                        }
                    };
                }
                Task::none()
            }
            Message::Retry => match self.pager.retry() {
                Some(ticket) => self.fetch(ticket),
                None => Task::none(),
            },
        }
    }

    fn observe(&mut self) -> Task<Message> {
        let boundary = self
            .style
            .layout
            .boundary_span(self.pager.items().len(), self.viewport.width);

        match self.sentinel.check(&self.viewport, boundary) {
            Some(Trigger) => match self.pager.request_next_page() {
                Some(ticket) => self.fetch(ticket),
                None => Task::none(),
            },
            None => Task::none(),
        }
    }

    fn fetch(&self, ticket: FetchTicket) -> Task<Message> {
        debug!(page = ticket.page, "fetching page");
        let source = Arc::clone(&self.source);
        Task::perform(
            async move { source.fetch_page(ticket.page).await },
            move |result| Message::PageLoaded(ticket, result),
        )
    }

    fn load_image(&mut self, item: ImageItem) -> Task<Message> {
        self.thumbnails.insert(item.id.clone(), Thumbnail::Loading);

        let loader = Arc::clone(&self.loader);
        let session = self.pager.session();
        let ImageItem { id, url } = item;
        Task::perform(
            async move { loader.load(&url).await },
            move |result| Message::ImageLoaded {
                session,
                id: id.clone(),
                result: result.map(image::Handle::from_bytes),
            },
        )
    }

    pub fn view(&self) -> Element<'_, Message> {
        let state = self.pager.state();
        let layout = self.style.layout;
        let columns = layout.columns(self.viewport.width);
        let edge = layout.tile_edge(self.viewport.width);

        let mut content = Column::new()
            .spacing(layout.spacing)
            .padding(layout.padding)
            .max_width(layout.max_width)
            .width(Length::Fill);

        if !state.items.is_empty() {
            let mut grid = Column::new().spacing(layout.spacing);
            for chunk in state.items.chunks(columns) {
                let tiles = chunk.iter().map(|item| self.tile(item, edge));
                grid = grid.push(Row::with_children(tiles).spacing(layout.spacing));
            }
            content = content.push(grid);
        }

        content = content.push(
            container(self.indicator(Indicator::for_state(&state)))
                .width(Length::Fill)
                .height(Length::Fixed(layout.boundary_height))
                .align_x(Horizontal::Center)
                .align_y(Vertical::Center),
        );

        scrollable(container(content).width(Length::Fill).align_x(Horizontal::Center))
            .id(self.scrollable_id.clone())
            .on_scroll(|viewport| Message::Scrolled(viewport.into()))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Square tile: the image once downloaded, its id until then
    fn tile<'a>(&self, item: &'a ImageItem, edge: f32) -> Element<'a, Message> {
        let style = self.style;
        let body: Element<'a, Message> = match self.thumbnails.get(&item.id) {
            Some(Thumbnail::Ready(handle)) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .into(),
            Some(Thumbnail::Unavailable) => column![
                text(&item.id).size(16),
                text("Image unavailable").size(11)
            ]
            .spacing(6)
            .align_x(Horizontal::Center)
            .into(),
            Some(Thumbnail::Loading) | None => text(&item.id).size(16).into(),
        };

        container(body)
            .width(Length::Fixed(edge))
            .height(Length::Fixed(edge))
            .align_x(Horizontal::Center)
            .align_y(Vertical::Center)
            .clip(true)
            .style(move |theme: &Theme| style.tile(theme))
            .into()
    }

    /// Loading pill, error banner, or nothing
    fn indicator(&self, indicator: Indicator) -> Element<'_, Message> {
        let style = self.style;

        match indicator {
            Indicator::Loading => container(text("Loading...").size(14))
                .padding([10, 20])
                .style(move |theme: &Theme| style.loader(theme))
                .into(),
            Indicator::Failed { message, retryable } => {
                let mut banner = row![text(message).size(14)]
                    .spacing(12)
                    .align_y(Vertical::Center);
                if retryable {
                    banner =
                        banner.push(button("Retry").on_press(Message::Retry).padding([4, 12]));
                }
                container(banner)
                    .padding([10, 20])
                    .style(move |theme: &Theme| style.error(theme))
                    .into()
            }
            Indicator::Hidden => Space::with_height(Length::Fixed(0.0)).into(),
        }
    }
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("session", &self.pager.session())
            .field("items", &self.pager.items().len())
            .field("phase", self.pager.phase())
            .field("sentinel", &self.sentinel.state())
            .field("thumbnails", &self.thumbnails.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::sentinel::SentinelState;
    use crate::source::loader::OfflineLoader;
    use crate::source::PlaceholderSource;
    use crate::state::pager::{FetchFailure, FetchPhase};
    use std::time::Duration;

    fn source() -> Arc<PlaceholderSource> {
        Arc::new(PlaceholderSource::new(10, Duration::ZERO, "https://img/{n}"))
    }

    fn mount(width: f32, height: f32) -> Gallery {
        let style = GalleryStyle::from_config(&GalleryConfig::default());
        let (gallery, _task) = Gallery::mount(
            source(),
            Arc::new(OfflineLoader),
            style,
            1.0,
            Size::new(width, height),
        );
        gallery
    }

    fn in_flight(gallery: &Gallery) -> FetchTicket {
        match gallery.pager().phase() {
            FetchPhase::Fetching(ticket) => *ticket,
            other => panic!("expected a fetch in flight, got {:?}", other),
        }
    }

    fn resolve(gallery: &mut Gallery) {
        let ticket = in_flight(gallery);
        let items = source().page_items(ticket.page);
        let _ = gallery.update(Message::PageLoaded(ticket, Ok(items)));
    }

    #[test]
    fn test_mount_fetches_first_page() {
        let gallery = mount(800.0, 600.0);
        assert_eq!(gallery.sentinel().state(), SentinelState::Observing);
        assert!(gallery.pager().is_loading());
        assert_eq!(in_flight(&gallery).page, 1);
    }

    #[test]
    fn test_first_page_completes() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);

        let state = gallery.pager().state();
        assert_eq!(state.items.len(), 10);
        assert_eq!(state.page, 2);
        assert!(!state.loading);
    }

    #[test]
    fn test_repeated_visibility_while_loading_fetches_once() {
        let mut gallery = mount(800.0, 600.0);
        let first = in_flight(&gallery);

        let _ = gallery.update(Message::Resized(Size::new(800.0, 600.0)));
        let _ = gallery.update(Message::Scrolled(ViewportGeometry::new(800.0, 600.0)));
        assert_eq!(in_flight(&gallery), first);

        resolve(&mut gallery);
        assert_eq!(gallery.pager().items().len(), 10);
    }

    #[test]
    fn test_scrolling_to_boundary_loads_next_page() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);
        assert!(!gallery.pager().is_loading());

        let layout = GalleryStyle::from_config(&GalleryConfig::default()).layout;
        let (_, bottom) = layout.boundary_span(10, 800.0);
        let _ = gallery.update(Message::Scrolled(ViewportGeometry {
            width: 800.0,
            height: 600.0,
            offset_y: bottom - 600.0,
        }));

        assert_eq!(in_flight(&gallery).page, 2);
    }

    #[test]
    fn test_tall_viewport_keeps_loading_until_filled() {
        // Four columns: one page ends at 965px, two pages at 1555px
        let mut gallery = mount(1600.0, 1200.0);
        resolve(&mut gallery);
        assert_eq!(in_flight(&gallery).page, 2);

        resolve(&mut gallery);
        assert_eq!(gallery.pager().items().len(), 20);
        assert!(!gallery.pager().is_loading());
    }

    #[test]
    fn test_unmount_while_pending_ignores_completion() {
        let mut gallery = mount(800.0, 600.0);
        let ticket = in_flight(&gallery);

        gallery.unmount();
        let items = source().page_items(1);
        let _ = gallery.update(Message::PageLoaded(ticket, Ok(items)));

        assert!(gallery.pager().items().is_empty());
        assert_eq!(gallery.pager().page(), 1);
        assert_eq!(gallery.sentinel().state(), SentinelState::Idle);

        let _ = gallery.update(Message::Scrolled(ViewportGeometry::new(800.0, 600.0)));
        assert_eq!(gallery.pager().phase(), &FetchPhase::TornDown);
    }

    #[test]
    fn test_completion_from_previous_mount_is_ignored() {
        let old = mount(800.0, 600.0);
        let stale = in_flight(&old);

        let mut gallery = mount(800.0, 600.0);
        let _ = gallery.update(Message::PageLoaded(stale, Ok(source().page_items(1))));

        assert!(gallery.pager().items().is_empty());
        assert!(gallery.pager().is_loading());
    }

    #[test]
    fn test_failed_page_waits_for_retry() {
        let mut gallery = mount(800.0, 600.0);
        let ticket = in_flight(&gallery);
        let _ = gallery.update(Message::PageLoaded(
            ticket,
            Err(FetchError::Transient("connection reset".into())),
        ));
        assert!(gallery.pager().failure().is_some());

        // Sentinel is still visible but failures are not refetched automatically
        let _ = gallery.update(Message::Scrolled(ViewportGeometry::new(800.0, 600.0)));
        assert!(!gallery.pager().is_loading());

        let _ = gallery.update(Message::Retry);
        assert_eq!(in_flight(&gallery).page, 1);

        resolve(&mut gallery);
        assert_eq!(gallery.pager().items().len(), 10);
    }

    #[test]
    fn test_loaded_page_queues_image_downloads() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);

        for item in gallery.pager().items() {
            assert!(matches!(gallery.thumbnail(&item.id), Some(Thumbnail::Loading)));
        }
    }

    #[test]
    fn test_image_bytes_fill_tile() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);
        let session = gallery.pager().session();

        let _ = gallery.update(Message::ImageLoaded {
            session,
            id: "1-0".into(),
            result: Ok(image::Handle::from_bytes(vec![0u8; 16])),
        });
        let _ = gallery.update(Message::ImageLoaded {
            session,
            id: "1-1".into(),
            result: Err(FetchError::Transient("timeout".into())),
        });

        assert!(matches!(gallery.thumbnail("1-0"), Some(Thumbnail::Ready(_))));
        assert!(matches!(gallery.thumbnail("1-1"), Some(Thumbnail::Unavailable)));
        assert!(matches!(gallery.thumbnail("1-2"), Some(Thumbnail::Loading)));
    }

    #[test]
    fn test_image_from_other_mount_is_ignored() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);

        let _ = gallery.update(Message::ImageLoaded {
            session: gallery.pager().session() + 1000,
            id: "1-0".into(),
            result: Ok(image::Handle::from_bytes(vec![0u8; 16])),
        });
        assert!(matches!(gallery.thumbnail("1-0"), Some(Thumbnail::Loading)));

        // Unknown ids never create entries
        let _ = gallery.update(Message::ImageLoaded {
            session: gallery.pager().session(),
            id: "9-9".into(),
            result: Ok(image::Handle::from_bytes(vec![0u8; 16])),
        });
        assert!(gallery.thumbnail("9-9").is_none());
    }

    #[test]
    fn test_indicator_shows_loading_while_fetching() {
        let gallery = mount(800.0, 600.0);
        assert_eq!(Indicator::for_state(&gallery.pager().state()), Indicator::Loading);
    }

    #[test]
    fn test_indicator_hidden_when_idle() {
        let mut gallery = mount(800.0, 600.0);
        resolve(&mut gallery);
        assert_eq!(Indicator::for_state(&gallery.pager().state()), Indicator::Hidden);
    }

    #[test]
    fn test_indicator_offers_retry_only_for_transient_failures() {
        let transient = FetchFailure {
            page: 3,
            error: FetchError::Transient("reset".into()),
        };
        let state = PagerState {
            items: &[],
            page: 3,
            loading: false,
            failure: Some(&transient),
        };
        assert_eq!(
            Indicator::for_state(&state),
            Indicator::Failed {
                message: transient.error.to_string(),
                retryable: true,
            }
        );

        let permanent = FetchFailure {
            page: 3,
            error: FetchError::Permanent("gone".into()),
        };
        let state = PagerState {
            failure: Some(&permanent),
            ..state
        };
        assert!(matches!(
            Indicator::for_state(&state),
            Indicator::Failed { retryable: false, .. }
        ));
    }
}
