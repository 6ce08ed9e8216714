//! HTTP page fetcher using reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetcher::{FetchResponse, PageFetcher};
use crate::{Result, SearchConfig, SearchError};

/// Connect plus read timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Consent value Google accepts in place of a pending EU consent cookie.
const CONSENT_ACCEPTED_PREFIX: &str = "YES+shp.gws-20211108-0-RC1.fr+F+";

/// A page fetcher backed by one reqwest client and its cookie jar.
///
/// Every request made through the same fetcher shares cookies, so the ones
/// picked up on the home page travel with the search requests that follow.
pub struct HttpFetcher {
    client: Client,
    jar: Arc<Jar>,
    proxy: Option<String>,
    verify_ssl: bool,
}

impl HttpFetcher {
    /// Builds a fetcher with an empty cookie jar.
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self> {
        Self::with_jar(config, user_agent, Arc::new(Jar::default()))
    }

    /// Builds a fetcher around an existing cookie jar, so a rebuilt client
    /// keeps the cookies the previous one collected.
    pub fn with_jar(config: &SearchConfig, user_agent: &str, jar: Arc<Jar>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .default_headers(header_map(config)?)
            .cookie_provider(Arc::clone(&jar))
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_ssl);

        let proxy = config.proxy_config()?;
        if let Some(proxy_config) = &proxy {
            debug!("Using proxy: {}:{}", proxy_config.host, proxy_config.port);
            builder = builder.proxy(proxy_config.to_reqwest()?);
        }

        if !config.verify_ssl {
            warn!("TLS certificate verification is disabled");
        }

        let client = builder
            .build()
            .map_err(|e| SearchError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let fetcher = Self {
            client,
            jar,
            proxy: proxy.map(|p| p.url()),
            verify_ssl: config.verify_ssl,
        };

        if let Some(exemption) = &config.google_exemption {
            let home = Url::parse(&config.home_url())?;
            fetcher.add_cookie(&format!("GOOGLE_ABUSE_EXEMPTION={}", exemption), &home);
        }

        Ok(fetcher)
    }

    /// Stores a `Set-Cookie` style string in the jar for `url`.
    pub fn add_cookie(&self, cookie: &str, url: &Url) {
        self.jar.add_cookie_str(cookie, url);
    }

    /// Swaps a pending EU consent cookie for an accepted one.
    fn accept_pending_consent(&self, pending: Option<PendingConsent>, url: &Url) {
        let Some(pending) = pending else { return };
        let Some(cookie) = pending.accepted_cookie(url) else { return };

        warn!("Consent page detected for this IP location, updating the CONSENT cookie to get past it");
        info!("Updating cookie to: {}", cookie);
        self.add_cookie(&cookie, url);
    }
}

/// A `CONSENT=PENDING+<n>` cookie as the server set it.
struct PendingConsent {
    value: String,
    domain: Option<String>,
    path: Option<String>,
}

impl PendingConsent {
    /// The accepted cookie, scoped to the same domain and path so it replaces
    /// the pending entry in the jar instead of sitting next to it.
    fn accepted_cookie(&self, url: &Url) -> Option<String> {
        let number = self.value.split('+').nth(1)?;
        let mut cookie = format!("CONSENT={}{}", CONSENT_ACCEPTED_PREFIX, number);
        if let Some(domain) = &self.domain {
            cookie.push_str(&format!("; Domain={}", domain));
        }
        let path = self.path.clone().unwrap_or_else(|| default_cookie_path(url));
        cookie.push_str(&format!("; Path={}", path));
        Some(cookie)
    }
}

/// Path a cookie without a `Path` attribute is stored under (RFC 6265 5.1.4).
fn default_cookie_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

fn header_map(config: &SearchConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SearchError::Configuration(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SearchError::Configuration(format!("Invalid header value for '{}': {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        info!("Requesting URL: {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let pending_consent = response
            .cookies()
            .find(|c| c.name() == "CONSENT" && c.value().starts_with("PENDING+"))
            .map(|c| PendingConsent {
                value: c.value().to_string(),
                domain: c.domain().map(str::to_string),
                path: c.path().map(str::to_string),
            });

        debug!("    status_code: {}", status);
        debug!("    proxy: {:?}", self.proxy);
        debug!("    verify_ssl: {}", self.verify_ssl);

        self.accept_pending_consent(pending_consent, &final_url);

        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}
