/// Gallery styles
///
/// Styles are registered once by the host at startup and handed to every
/// gallery it mounts. Nothing is applied globally on import.

use iced::widget::container;
use iced::{Background, Border, Color, Shadow, Theme, Vector};
use std::sync::OnceLock;

use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::sentinel::GridLayout;

static REGISTERED: OnceLock<GalleryStyle> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalleryStyle {
    pub layout: GridLayout,
    pub tile_radius: f32,
    pub loader_radius: f32,
}

impl GalleryStyle {
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            layout: GridLayout {
                tile_size: config.tile_size,
                spacing: config.spacing,
                padding: config.padding,
                max_width: config.max_width,
                boundary_height: config.boundary_height,
            },
            tile_radius: 8.0,
            loader_radius: 20.0,
        }
    }

    /// Square image tile with rounded corners and a soft shadow
    pub fn tile(&self, theme: &Theme) -> container::Style {
        let palette = theme.extended_palette();
        container::Style {
            text_color: Some(palette.background.weak.text),
            background: Some(Background::Color(palette.background.weak.color)),
            border: Border {
                radius: self.tile_radius.into(),
                ..Border::default()
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.1),
                offset: Vector::new(0.0, 2.0),
                blur_radius: 4.0,
            },
        }
    }

    /// Pill shown next to the sentinel while a page loads
    pub fn loader(&self, theme: &Theme) -> container::Style {
        let palette = theme.extended_palette();
        container::Style {
            text_color: Some(palette.background.strong.text),
            background: Some(Background::Color(palette.background.strong.color)),
            border: Border {
                radius: self.loader_radius.into(),
                ..Border::default()
            },
            ..container::Style::default()
        }
    }

    pub fn error(&self, theme: &Theme) -> container::Style {
        let palette = theme.extended_palette();
        container::Style {
            text_color: Some(palette.danger.weak.text),
            background: Some(Background::Color(palette.danger.weak.color)),
            border: Border {
                radius: self.loader_radius.into(),
                ..Border::default()
            },
            ..container::Style::default()
        }
    }
}

/// Register the gallery styles for the whole process.
/// Must be called once by the host before mounting any gallery.
pub fn register(config: &GalleryConfig) -> Result<&'static GalleryStyle, GalleryError> {
    let mut fresh = false;
    let style = REGISTERED.get_or_init(|| {
        fresh = true;
        GalleryStyle::from_config(config)
    });
    if fresh {
        Ok(style)
    } else {
        Err(GalleryError::StyleAlreadyRegistered)
    }
}
