use std::time::Duration;

use iced::widget::image::Handle;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::listing::{self, ImageRecord, ListingError};

/// Timeout applied to every HTTP request (listing and image bytes alike)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for all fetches.
/// Building it can only fail on TLS backend misconfiguration, which the app
/// cannot function without.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
});

/// A fetched and decoded image, ready for display
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: Handle,
    /// Natural pixel width as decoded
    pub width: u32,
    /// Natural pixel height as decoded
    pub height: u32,
}

/// Failure anywhere on the fetch-and-resolve path.
///
/// Carries rendered strings rather than source errors so it stays `Clone`,
/// which iced messages require.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Fetch a bucket listing and resolve it into image records.
///
/// One GET, no retries. Network failures, non-success statuses, and
/// malformed XML all come back as a `FetchError`; the caller surfaces them
/// with a single generic message. An empty record set is a success.
pub async fn load_listing(url: String) -> Result<Vec<ImageRecord>, FetchError> {
    let body = fetch_text(&url).await?;
    Ok(listing::resolve(&body, &url)?)
}

/// Fetch and decode one image, reporting its natural pixel dimensions.
pub async fn load_image(url: String) -> Result<LoadedImage, FetchError> {
    let response = send_get(&url).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let decoded = image::load_from_memory(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());
    let rgba = decoded.into_rgba8();

    Ok(LoadedImage {
        handle: Handle::from_rgba(width, height, rgba.into_raw()),
        width,
        height,
    })
}

async fn fetch_text(url: &str) -> Result<String, FetchError> {
    send_get(url)
        .await?
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))
}

async fn send_get(url: &str) -> Result<reqwest::Response, FetchError> {
    let response = CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }
    Ok(response)
}
