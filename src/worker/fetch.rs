//! Resource Fetching
//!
//! The cache worker never talks to the network directly; it goes through
//! the [`Fetcher`] capability. The production implementation wraps reqwest;
//! tests script outcomes per URL.
//!
//! A note on failure shape: a served error page (404, 500) is still a
//! *completed* fetch and comes back as `Ok` with that status. `FetchError`
//! means the request never produced a response at all, which is what the
//! fallback policies key on.

use async_trait::async_trait;
use thiserror::Error;

/// What the request is for; selects the caching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A full-page load
    Navigation,
    /// An image resource
    Image,
    /// Any other asset or API-adjacent resource
    Asset,
}

/// An outbound resource request seen by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Full request URL
    pub url: String,
    /// Request destination
    pub kind: RequestKind,
}

impl ResourceRequest {
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RequestKind::Navigation,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RequestKind::Image,
        }
    }

    pub fn asset(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RequestKind::Asset,
        }
    }
}

/// A fetched (or cached) resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResponse {
    /// URL the response was produced for
    pub url: String,
    /// HTTP status
    pub status: u16,
    /// Content type of the body
    pub content_type: String,
    /// Response body
    pub body: Vec<u8>,
    /// Cross-origin response whose contents are not readable
    pub opaque: bool,
}

impl ResourceResponse {
    /// Whether the runtime cache may keep a copy: successful, not an error
    /// page, not opaque.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && !self.opaque
    }

    /// The synthetic placeholder served for unreachable images
    pub fn placeholder_image(url: &str) -> Self {
        const PLACEHOLDER_SVG: &str = "<svg role=\"img\" aria-label=\"Imagen no disponible\" \
             xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 100 100\"></svg>";
        Self {
            url: url.to_string(),
            status: 200,
            content_type: "image/svg+xml".to_string(),
            body: PLACEHOLDER_SVG.as_bytes().to_vec(),
            opaque: false,
        }
    }
}

/// The request never produced a response
#[derive(Debug, Error)]
#[error("network unreachable: {0}")]
pub struct FetchError(pub String);

/// Capability the worker fetches through
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &ResourceRequest)
        -> std::result::Result<ResourceResponse, FetchError>;
}

/// Production fetcher over reqwest.
///
/// Relative URLs (the shell manifest) are resolved against the configured
/// origin before the request goes out.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: origin.into(),
        }
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            url.to_string()
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        request: &ResourceRequest,
    ) -> std::result::Result<ResourceResponse, FetchError> {
        let response = self
            .client
            .get(self.absolute(&request.url))
            .send()
            .await
            .map_err(|e| FetchError(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError(e.to_string()))?
            .to_vec();

        Ok(ResourceResponse {
            url: request.url.clone(),
            status,
            content_type,
            body,
            opaque: false,
        })
    }
}
