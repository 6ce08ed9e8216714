//! Page fetcher abstraction for retrieving result pages.

use async_trait::async_trait;

use crate::Result;

/// Status code and body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 200 OK.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching a URL within one browsing session.
///
/// Implementations keep their cookies between calls. Headers, proxy and TLS
/// settings are fixed at construction; `fetch` is URL in, status and body out.
/// HTTP error statuses, 429 included, are returned as responses. Only
/// transport failures become errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the given URL.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}
