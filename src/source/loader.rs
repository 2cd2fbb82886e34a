//! Image byte loader with an HTTP client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;

/// Downloads the bytes behind an image URL
#[async_trait]
pub trait ImageLoader: Send + Sync + std::fmt::Debug {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP-based image loader with connection pooling
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn supports_url(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !Self::supports_url(url) {
            return Err(FetchError::Permanent(format!("unsupported url: {}", url)));
        }

        let response = self.client.get(url).send().await.map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, url));
        }

        let bytes = response.bytes().await.map_err(classify_request_error)?;
        debug!(url, size = bytes.len(), "image downloaded");
        Ok(bytes.to_vec())
    }
}

fn classify_request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() || e.is_connect() || e.is_body() {
        FetchError::Transient(e.to_string())
    } else {
        FetchError::Permanent(e.to_string())
    }
}

/// Server errors and throttling are worth retrying, other failures are not
fn classify_status(status: StatusCode, url: &str) -> FetchError {
    let message = format!("HTTP {}: {}", status, url);
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::Transient(message)
    } else {
        FetchError::Permanent(message)
    }
}

/// Loader that never touches the network, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct OfflineLoader;

#[cfg(test)]
#[async_trait]
impl ImageLoader for OfflineLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Permanent(format!("offline: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::BAD_GATEWAY, "u").is_retryable());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "u").is_retryable());
        assert!(!classify_status(StatusCode::NOT_FOUND, "u").is_retryable());
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let loader = HttpImageLoader::new(Duration::from_secs(1)).unwrap();
        let err = loader.load("file:///etc/passwd").await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
