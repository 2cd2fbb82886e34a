use thiserror::Error;

/// Failure reported by an image source for a single page.
///
/// Carried inside iced messages, so it is `Clone` and holds plain strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Worth retrying (timeouts, dropped connections)
    #[error("temporary failure fetching page: {0}")]
    Transient(String),
    /// Retrying the same request will not help
    #[error("failed to fetch page: {0}")]
    Permanent(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("gallery styles were already registered")]
    StyleAlreadyRegistered,

    #[error("iced runtime error: {0}")]
    Iced(#[from] iced::Error),
}
