/// Gallery configuration
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/infinite-gallery/config.json
/// - macOS: ~/Library/Application Support/infinite-gallery/config.json
/// - Windows: %APPDATA%\infinite-gallery\config.json
///
/// Every field has a default, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::GalleryError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    /// Images per page
    pub batch_size: usize,
    /// Simulated latency of the placeholder source
    pub fetch_delay_ms: u64,
    /// Visible fraction of the sentinel needed to trigger a fetch (0, 1]
    pub visibility_threshold: f32,
    /// `{n}` is replaced with `page * batch_size + index`
    pub url_template: String,
    /// Page the placeholder source fails once with a transient error
    pub flaky_page: Option<u32>,
    /// Timeout for downloading a single image
    pub image_timeout_ms: u64,

    // ========== Layout ==========
    /// Minimum tile edge in pixels
    pub tile_size: f32,
    pub spacing: f32,
    pub padding: f32,
    pub max_width: f32,
    /// Height of the sentinel row below the grid
    pub boundary_height: f32,

    // ========== Window ==========
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            fetch_delay_ms: 1000,
            visibility_threshold: 1.0,
            url_template: "https://picsum.photos/300/300?random={n}".to_string(),
            flaky_page: None,
            image_timeout_ms: 15_000,
            tile_size: 250.0,
            spacing: 20.0,
            padding: 20.0,
            max_width: 1200.0,
            boundary_height: 60.0,
            window_width: 1280.0,
            window_height: 800.0,
        }
    }
}

impl GalleryConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("infinite-gallery");
            path.push("config.json");
            path
        })
    }

    /// Load the config from the default location, falling back to defaults
    /// when the file is missing or broken
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("could not determine config directory, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(Some(config)) => {
                info!(path = %path.display(), "loaded gallery config");
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unusable config, using defaults");
                Self::default()
            }
        }
    }

    /// Read and validate a config file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>, GalleryError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GalleryError::ConfigIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let config = Self::from_json(&json).map_err(|source| GalleryError::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(Some(config))
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[cfg(test)]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), GalleryError> {
        if self.batch_size == 0 {
            return Err(GalleryError::ConfigInvalid("batch_size must be at least 1".into()));
        }
        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(GalleryError::ConfigInvalid(format!(
                "visibility_threshold must be in (0, 1], got {}",
                self.visibility_threshold
            )));
        }
        if self.image_timeout_ms == 0 {
            return Err(GalleryError::ConfigInvalid("image_timeout_ms must be at least 1".into()));
        }
        if !self.url_template.contains("{n}") {
            return Err(GalleryError::ConfigInvalid("url_template must contain {n}".into()));
        }
        let lengths = [
            self.tile_size,
            self.max_width,
            self.boundary_height,
            self.window_width,
            self.window_height,
        ];
        if lengths.iter().any(|v| !(*v > 0.0)) || self.spacing < 0.0 || self.padding < 0.0 {
            return Err(GalleryError::ConfigInvalid("layout sizes must be positive".into()));
        }
        Ok(())
    }
}
