//! Media resolution, content-type probing and byte fetching.

use crate::error::{LoadError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

/// Content type that selects the animated path. Matched exactly.
pub const GIF_MIME: &str = "image/gif";

/// Whether a reported content type should be played as an animated GIF
pub fn is_gif(content_type: Option<&str>) -> bool {
    content_type == Some(GIF_MIME)
}

/// Network access used by the loader.
///
/// Methods block; the loader runs them off the main context with `smol::unblock`.
pub trait MediaFetcher: Send + Sync + 'static {
    /// Resolve a resource locator to a fetchable URL for the raw media
    fn resolve(&self, src: &str) -> Result<String>;

    /// Content type of the media from a header-only request
    fn content_type(&self, url: &str) -> Result<Option<String>>;

    /// Download the complete resource
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Serialize)]
struct MediaRequest<'a> {
    media: MediaLocator<'a>,
}

#[derive(Serialize)]
struct MediaLocator<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct MediaResponse {
    images: MediaImages,
}

#[derive(Deserialize)]
struct MediaImages {
    raw: String,
}

/// [`MediaFetcher`] over HTTP, resolving media through a media service endpoint
pub struct HttpFetcher {
    client: Client,
    media_endpoint: String,
}

impl HttpFetcher {
    pub fn new(media_endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            media_endpoint: media_endpoint.into(),
        }
    }
}

fn network_error(url: &str, err: impl std::fmt::Display) -> LoadError {
    LoadError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    if !response.status().is_success() {
        return Err(network_error(url, format!("HTTP error: {}", response.status())));
    }
    Ok(response)
}

impl MediaFetcher for HttpFetcher {
    fn resolve(&self, src: &str) -> Result<String> {
        log::info!("Resolving media for {}", src);

        let response = self
            .client
            .post(&self.media_endpoint)
            .json(&MediaRequest {
                media: MediaLocator { url: src },
            })
            .send()
            .map_err(|e| network_error(&self.media_endpoint, e))?;
        let response = check_status(&self.media_endpoint, response)?;

        let body: MediaResponse = response.json().map_err(|e| LoadError::Resolve {
            src: src.to_string(),
            reason: e.to_string(),
        })?;

        log::info!("Resolved {} to {}", src, body.images.raw);
        Ok(body.images.raw)
    }

    fn content_type(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.head(url).send().map_err(|e| network_error(url, e))?;
        let response = check_status(url, response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        log::debug!("Content type of {}: {:?}", url, content_type);
        Ok(content_type)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Downloading {}", url);

        let response = self.client.get(url).send().map_err(|e| network_error(url, e))?;
        let response = check_status(url, response)?;
        let bytes = response.bytes().map_err(|e| network_error(url, e))?;

        log::info!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
