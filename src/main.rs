use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length, Size, Subscription, Task, Theme};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod sentinel;
mod source;
mod state;
mod ui;

use config::GalleryConfig;
use error::GalleryError;
use source::{HttpImageLoader, ImageLoader, ImageSource, PlaceholderSource};
use ui::gallery;
use ui::style::GalleryStyle;
use ui::Gallery;

/// Height reserved for the header bar above the gallery
const HEADER_HEIGHT: f32 = 56.0;

/// Minimal host application that embeds the gallery
struct GalleryHost {
    /// The mounted gallery, if any
    gallery: Option<Gallery>,
    source: Arc<dyn ImageSource>,
    loader: Arc<dyn ImageLoader>,
    style: GalleryStyle,
    threshold: f32,
    /// Last known window size
    window: Size,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the show/hide button
    ToggleGallery,
    WindowResized(Size),
    /// Message addressed to the mounted gallery
    Gallery(gallery::Message),
}

impl GalleryHost {
    fn new(
        config: GalleryConfig,
        style: GalleryStyle,
        loader: Arc<dyn ImageLoader>,
    ) -> (Self, Task<Message>) {
        let source: Arc<dyn ImageSource> = Arc::new(PlaceholderSource::from_config(&config));
        info!(
            batch_size = config.batch_size,
            fetch_delay_ms = config.fetch_delay_ms,
            "gallery host initialized"
        );

        let mut host = GalleryHost {
            gallery: None,
            source,
            loader,
            style,
            threshold: config.visibility_threshold,
            window: Size::new(config.window_width, config.window_height),
        };

        let task = host.mount_gallery();
        (host, task)
    }

    /// Space left for the gallery below the header
    fn gallery_area(&self) -> Size {
        Size::new(self.window.width, (self.window.height - HEADER_HEIGHT).max(0.0))
    }

    fn mount_gallery(&mut self) -> Task<Message> {
        let (gallery, task) = Gallery::mount(
            Arc::clone(&self.source),
            Arc::clone(&self.loader),
            self.style,
            self.threshold,
            self.gallery_area(),
        );
        self.gallery = Some(gallery);
        task.map(Message::Gallery)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleGallery => match self.gallery.take() {
                Some(mut gallery) => {
                    gallery.unmount();
                    Task::none()
                }
                None => self.mount_gallery(),
            },
            Message::WindowResized(size) => {
                self.window = size;
                let area = self.gallery_area();
                match self.gallery.as_mut() {
                    Some(gallery) => gallery
                        .update(gallery::Message::Resized(area))
                        .map(Message::Gallery),
                    None => Task::none(),
                }
            }
            Message::Gallery(message) => match self.gallery.as_mut() {
                Some(gallery) => gallery.update(message).map(Message::Gallery),
                None => {
                    // A fetch finished after the gallery was hidden
                    debug!(?message, "dropping message for unmounted gallery");
                    Task::none()
                }
            },
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let (label, status) = match &self.gallery {
            Some(gallery) => {
                let state = gallery.pager().state();
                ("Hide gallery", format!("{} images, page {}", state.items.len(), state.page))
            }
            None => ("Show gallery", "Gallery hidden".to_string()),
        };

        let header = container(
            row![
                text("Infinite Gallery").size(22),
                Space::with_width(Length::Fill),
                text(status).size(14),
                button(label).on_press(Message::ToggleGallery).padding([6, 14]),
            ]
            .spacing(16)
            .align_y(Alignment::Center),
        )
        .padding([0, 20])
        .height(Length::Fixed(HEADER_HEIGHT))
        .align_y(Alignment::Center);

        let body: Element<'_, Message> = match &self.gallery {
            Some(gallery) => gallery.view().map(Message::Gallery),
            None => container(text("Press \"Show gallery\" to mount it again.").size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        column![header, body].into()
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::window::resize_events().map(|(_id, size)| Message::WindowResized(size))
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

fn main() -> Result<(), GalleryError> {
    init_tracing();

    let config = GalleryConfig::load_or_default();
    // Styles are registered once, here, before anything is mounted
    let style = *ui::style::register(&config)?;
    let window = Size::new(config.window_width, config.window_height);
    let loader: Arc<dyn ImageLoader> = Arc::new(HttpImageLoader::new(Duration::from_millis(
        config.image_timeout_ms,
    ))?);

    iced::application("Infinite Gallery", GalleryHost::update, GalleryHost::view)
        .theme(GalleryHost::theme)
        .subscription(GalleryHost::subscription)
        .window_size(window)
        .centered()
        .run_with(move || GalleryHost::new(config, style, loader))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::loader::OfflineLoader;
    use crate::state::pager::FetchPhase;

    fn host() -> GalleryHost {
        let config = GalleryConfig {
            fetch_delay_ms: 0,
            ..GalleryConfig::default()
        };
        let style = GalleryStyle::from_config(&config);
        let (host, _task) = GalleryHost::new(config, style, Arc::new(OfflineLoader));
        host
    }

    #[test]
    fn test_host_mounts_gallery_at_startup() {
        let host = host();
        let gallery = host.gallery.as_ref().unwrap();
        assert!(gallery.pager().is_loading());
    }

    #[test]
    fn test_late_completion_after_hide_is_dropped() {
        let mut host = host();
        let ticket = match host.gallery.as_ref().unwrap().pager().phase() {
            FetchPhase::Fetching(ticket) => *ticket,
            other => panic!("unexpected phase {:?}", other),
        };

        let _ = host.update(Message::ToggleGallery);
        assert!(host.gallery.is_none());

        let items = PlaceholderSource::from_config(&GalleryConfig::default()).page_items(1);
        let _ = host.update(Message::Gallery(gallery::Message::PageLoaded(ticket, Ok(items))));
        assert!(host.gallery.is_none());

        // Remounting starts a new session that ignores the old ticket
        let _ = host.update(Message::ToggleGallery);
        let items = PlaceholderSource::from_config(&GalleryConfig::default()).page_items(1);
        let _ = host.update(Message::Gallery(gallery::Message::PageLoaded(ticket, Ok(items))));
        let gallery = host.gallery.as_ref().unwrap();
        assert!(gallery.pager().items().is_empty());
        assert!(gallery.pager().is_loading());
    }

    #[test]
    fn test_gallery_area_excludes_header() {
        let host = host();
        assert_eq!(host.gallery_area(), Size::new(1280.0, 800.0 - HEADER_HEIGHT));
    }
}
