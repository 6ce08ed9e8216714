//! Search client configuration.
//!
//! Field names and defaults follow the long-standing Python client so existing
//! JSON configs and habits carry over.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// Largest page size Google accepts for `num`.
pub const MAX_RESULTS_PER_PAGE: u32 = 100;

/// Roughly how deep Google lets a single query page before results dry up.
const PRACTICAL_RESULT_CEILING: usize = 400;

/// GET parameters the client sets itself; extra parameters may not reuse them.
pub const BUILTIN_URL_PARAMETERS: &[&str] =
    &["btnG", "cr", "hl", "num", "q", "safe", "start", "tbs", "lr"];

const RESULT_LANGUAGES_FILE: &str = include_str!("../data/result_languages.txt");

/// Returns the `lr` values Google's advanced search offers.
pub fn result_languages() -> Vec<&'static str> {
    RESULT_LANGUAGES_FILE
        .lines()
        .filter_map(|line| line.trim().split('=').next())
        .filter(|code| !code.is_empty())
        .collect()
}

/// Normalizes case of a result language, e.g. `LANG_ZH-cn` to `lang_zh-CN`.
pub fn normalize_lang_result(lang: &str) -> String {
    match lang.split_once('-') {
        Some((prefix, region)) => format!("{}-{}", prefix.to_lowercase(), region.to_uppercase()),
        None => lang.to_lowercase(),
    }
}

/// Configuration for a [`SearchClient`](crate::SearchClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Query text, not URL-encoded.
    #[serde(default)]
    pub query: String,
    /// Top level domain, e.g. `com` or `co.uk`.
    #[serde(default = "default_tld")]
    pub tld: String,
    /// Interface language (`hl`).
    #[serde(default = "default_lang_html_ui")]
    pub lang_html_ui: String,
    /// Result language (`lr`).
    #[serde(default = "default_lang_result")]
    pub lang_result: String,
    /// Verbatim or time-range filter (`tbs`), see [`Tbs`](crate::Tbs).
    #[serde(default = "default_tbs")]
    pub tbs: String,
    /// Safe search (`safe`).
    #[serde(default = "default_safe")]
    pub safe: String,
    /// Offset of the first result to request.
    #[serde(default)]
    pub start: u32,
    /// Results requested per page, at most 100.
    #[serde(default = "default_num")]
    pub num: u32,
    /// Country restriction (`cr`), e.g. `countryCA`.
    #[serde(default)]
    pub country: String,
    /// Extra GET parameters appended verbatim to every search URL.
    #[serde(default)]
    pub extra_params: BTreeMap<String, String>,
    /// Maximum URLs returned for the whole session.
    #[serde(default = "default_max_urls")]
    pub max_search_result_urls_to_return: usize,
    /// Lower bound of the random delay between pages.
    #[serde(default = "default_min_delay")]
    pub minimum_delay_between_paged_results_in_seconds: u64,
    /// Upper bound of the random delay between pages.
    #[serde(default = "default_max_delay")]
    pub maximum_delay_between_paged_results_in_seconds: u64,
    /// Fixed User-Agent. A random bundled one is used when unset.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Additional request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Whether the client sleeps and retries on HTTP 429 itself.
    #[serde(default = "default_true")]
    pub yagooglesearch_manages_http_429s: bool,
    /// First cool-off after an HTTP 429, in minutes.
    #[serde(default = "default_cool_off_minutes")]
    pub http_429_cool_off_time_in_minutes: f64,
    /// Growth factor applied to the cool-off after each HTTP 429.
    #[serde(default = "default_cool_off_factor")]
    pub http_429_cool_off_factor: f64,
    /// Give up after this many consecutive HTTP 429s. Unlimited when unset.
    #[serde(default)]
    pub max_http_429_retries: Option<u32>,
    /// Proxy URL (`http`, `https`, `socks5` or `socks5h`).
    #[serde(default)]
    pub proxy: Option<String>,
    /// Verify TLS certificates.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    /// Logging verbosity, 0 (silent) to 5 (debug).
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
    /// Return rank, title and description along with each URL.
    #[serde(default)]
    pub verbose_output: bool,
    /// `GOOGLE_ABUSE_EXEMPTION` cookie value.
    #[serde(default)]
    pub google_exemption: Option<String>,
}

fn default_tld() -> String {
    "com".to_string()
}

fn default_lang_html_ui() -> String {
    "en".to_string()
}

fn default_lang_result() -> String {
    "lang_en".to_string()
}

fn default_tbs() -> String {
    "0".to_string()
}

fn default_safe() -> String {
    "off".to_string()
}

fn default_num() -> u32 {
    100
}

fn default_max_urls() -> usize {
    100
}

fn default_min_delay() -> u64 {
    7
}

fn default_max_delay() -> u64 {
    17
}

fn default_true() -> bool {
    true
}

fn default_cool_off_minutes() -> f64 {
    60.0
}

fn default_cool_off_factor() -> f64 {
    1.1
}

fn default_verbosity() -> u8 {
    5
}

impl SearchConfig {
    /// Creates a configuration with default tunables for the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tld: default_tld(),
            lang_html_ui: default_lang_html_ui(),
            lang_result: default_lang_result(),
            tbs: default_tbs(),
            safe: default_safe(),
            start: 0,
            num: default_num(),
            country: String::new(),
            extra_params: BTreeMap::new(),
            max_search_result_urls_to_return: default_max_urls(),
            minimum_delay_between_paged_results_in_seconds: default_min_delay(),
            maximum_delay_between_paged_results_in_seconds: default_max_delay(),
            user_agent: None,
            headers: BTreeMap::new(),
            yagooglesearch_manages_http_429s: true,
            http_429_cool_off_time_in_minutes: default_cool_off_minutes(),
            http_429_cool_off_factor: default_cool_off_factor(),
            max_http_429_retries: None,
            proxy: None,
            verify_ssl: true,
            verbosity: default_verbosity(),
            verbose_output: false,
            google_exemption: None,
        }
    }

    /// Sets the top level domain.
    pub fn with_tld(mut self, tld: impl Into<String>) -> Self {
        self.tld = tld.into();
        self
    }

    /// Sets the interface and result languages.
    pub fn with_languages(mut self, html_ui: impl Into<String>, result: impl Into<String>) -> Self {
        self.lang_html_ui = html_ui.into();
        self.lang_result = result.into();
        self
    }

    /// Sets the `tbs` filter.
    pub fn with_tbs(mut self, tbs: impl Into<String>) -> Self {
        self.tbs = tbs.into();
        self
    }

    /// Sets the country restriction.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Sets the number of results per page.
    pub fn with_num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }

    /// Sets the maximum number of URLs to return.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_search_result_urls_to_return = max;
        self
    }

    /// Sets the inter-page delay bounds in seconds.
    pub fn with_delay_range(mut self, min_seconds: u64, max_seconds: u64) -> Self {
        self.minimum_delay_between_paged_results_in_seconds = min_seconds;
        self.maximum_delay_between_paged_results_in_seconds = max_seconds;
        self
    }

    /// Sets the HTTP 429 cool-off base (minutes) and growth factor.
    pub fn with_cool_off(mut self, minutes: f64, factor: f64) -> Self {
        self.http_429_cool_off_time_in_minutes = minutes;
        self.http_429_cool_off_factor = factor;
        self
    }

    /// Caps consecutive HTTP 429 retries.
    pub fn with_max_http_429_retries(mut self, retries: u32) -> Self {
        self.max_http_429_retries = Some(retries);
        self
    }

    /// Chooses whether the client handles HTTP 429s itself.
    pub fn with_manages_http_429s(mut self, manages: bool) -> Self {
        self.yagooglesearch_manages_http_429s = manages;
        self
    }

    /// Sets the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Enables or disables TLS certificate verification.
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Sets a fixed User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds an extra GET parameter.
    pub fn with_extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    /// Returns full records instead of bare URLs.
    pub fn with_verbose_output(mut self, verbose: bool) -> Self {
        self.verbose_output = verbose;
        self
    }

    /// Sets the `GOOGLE_ABUSE_EXEMPTION` cookie value.
    pub fn with_google_exemption(mut self, exemption: impl Into<String>) -> Self {
        self.google_exemption = Some(exemption.into());
        self
    }

    /// Applies the lenient fix-ups: clamps `num`, normalizes `lang_result`
    /// and falls back to `lang_en` when it is unknown.
    pub fn normalized(mut self) -> Self {
        self.lang_result = normalize_lang_result(&self.lang_result);
        if !result_languages().contains(&self.lang_result.as_str()) {
            error!(
                "{} is not a valid language result. Setting lang_result to \"lang_en\".",
                self.lang_result
            );
            self.lang_result = default_lang_result();
        }

        if self.num > MAX_RESULTS_PER_PAGE {
            warn!("The largest value allowed by Google for num is 100. Setting num to 100.");
            self.num = MAX_RESULTS_PER_PAGE;
        }

        if self.max_search_result_urls_to_return > PRACTICAL_RESULT_CEILING {
            warn!("Google usually only returns a maximum of ~400 results for a single query.");
        }

        self
    }

    /// Rejects combinations that cannot produce a working session.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }

        if self.num == 0 {
            return Err(SearchError::Configuration("num must be at least 1".into()));
        }

        if self.minimum_delay_between_paged_results_in_seconds
            > self.maximum_delay_between_paged_results_in_seconds
        {
            return Err(SearchError::Configuration(format!(
                "minimum delay ({}s) exceeds maximum delay ({}s)",
                self.minimum_delay_between_paged_results_in_seconds,
                self.maximum_delay_between_paged_results_in_seconds
            )));
        }

        if !self.http_429_cool_off_time_in_minutes.is_finite()
            || self.http_429_cool_off_time_in_minutes < 0.0
        {
            return Err(SearchError::Configuration(
                "http_429_cool_off_time_in_minutes must be a non-negative number".into(),
            ));
        }

        if !self.http_429_cool_off_factor.is_finite() || self.http_429_cool_off_factor <= 0.0 {
            return Err(SearchError::Configuration(
                "http_429_cool_off_factor must be a positive number".into(),
            ));
        }

        if let Some(key) = self
            .extra_params
            .keys()
            .find(|key| BUILTIN_URL_PARAMETERS.contains(&key.as_str()))
        {
            return Err(SearchError::Configuration(format!(
                "GET parameter \"{}\" is overlapping with the built-in GET parameter",
                key
            )));
        }

        self.proxy_config()?;
        Ok(())
    }

    /// Parses the proxy URL, if one is configured.
    pub fn proxy_config(&self) -> Result<Option<ProxyConfig>> {
        match self.proxy.as_deref().map(str::trim) {
            Some(proxy) if !proxy.is_empty() => ProxyConfig::parse(proxy).map(Some),
            _ => Ok(None),
        }
    }

    /// Inclusive range of whole seconds to wait between pages.
    pub fn delay_range(&self) -> RangeInclusive<u64> {
        self.minimum_delay_between_paged_results_in_seconds
            ..=self.maximum_delay_between_paged_results_in_seconds
    }

    /// Root page used to pick up session cookies.
    pub fn home_url(&self) -> String {
        format!("https://www.google.{}/", self.tld)
    }

    /// Search URL for the page starting at `start`.
    ///
    /// `num` is omitted at Google's default of 10 and `btnG` only appears on
    /// the first page, mirroring what a browser sends.
    pub fn search_url(&self, start: u32) -> String {
        let query: String = url::form_urlencoded::byte_serialize(self.query.as_bytes()).collect();

        let mut url = format!(
            "https://www.google.{}/search?hl={}&lr={}&q={}",
            self.tld,
            urlencoding::encode(&self.lang_html_ui),
            urlencoding::encode(&self.lang_result),
            query
        );
        if start != 0 {
            url.push_str(&format!("&start={}", start));
        }
        if self.num != 10 {
            url.push_str(&format!("&num={}", self.num));
        }
        if start == 0 {
            url.push_str("&btnG=Google+Search");
        }
        url.push_str(&format!(
            "&tbs={}&safe={}&cr={}&filter=0",
            urlencoding::encode(&self.tbs),
            urlencoding::encode(&self.safe),
            urlencoding::encode(&self.country)
        ));

        // Extra parameters are documented as already URL-encoded.
        for (key, value) in &self.extra_params {
            url.push_str(&format!("&{}={}", key, value));
        }
        url
    }
}
