//! Search result types.

use serde::{Deserialize, Serialize};

/// Marker appended to the legacy result list when a 429 ended the session.
pub const HTTP_429_DETECTED: &str = "HTTP_429_DETECTED";

/// A single organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 1-based rank. Position on the page when parsed, session-wide once accepted.
    pub rank: u32,
    /// Result title.
    pub title: String,
    /// Result description/snippet, empty when missing.
    pub description: String,
    /// Target URL with any redirect wrapper removed.
    pub url: String,
}

impl ResultRecord {
    /// Creates a new record.
    pub fn new(
        rank: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            rank,
            title: title.into(),
            description: description.into(),
            url: url.into(),
        }
    }

    /// Returns the record with a different rank.
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}

/// How a search session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Results ran out or the maximum was reached.
    Completed,
    /// An HTTP 429 arrived and the caller asked to handle those itself.
    ThrottledUnhandled,
    /// The session stopped early: retry cap hit or a transport failure after
    /// some results were already collected.
    Aborted,
}

/// Everything a search session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Accepted results in rank order.
    pub results: Vec<ResultRecord>,
    /// Why the session ended.
    pub status: SessionStatus,
    /// Whether callers asked for full records rather than URLs.
    pub verbose_output: bool,
}

impl SessionOutcome {
    /// Returns the result URLs in rank order.
    pub fn urls(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.url.as_str()).collect()
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns whether no results were collected.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether the session ended because of an unhandled HTTP 429.
    pub fn is_throttled(&self) -> bool {
        self.status == SessionStatus::ThrottledUnhandled
    }

    /// Flattens into the list shape older callers expect: URLs or records
    /// depending on `verbose_output`, followed by [`HTTP_429_DETECTED`] when
    /// the session ended on an unhandled 429.
    pub fn into_items(self) -> Vec<SearchItem> {
        let throttled = self.is_throttled();
        let verbose = self.verbose_output;

        let mut items: Vec<SearchItem> = self
            .results
            .into_iter()
            .map(|record| {
                if verbose {
                    SearchItem::Record(record)
                } else {
                    SearchItem::Url(record.url)
                }
            })
            .collect();

        if throttled {
            items.push(SearchItem::Url(HTTP_429_DETECTED.to_string()));
        }
        items
    }
}

/// One element of the flattened result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchItem {
    /// A bare URL, or the [`HTTP_429_DETECTED`] marker.
    Url(String),
    /// A full record.
    Record(ResultRecord),
}

impl SearchItem {
    /// Whether this is the HTTP 429 marker.
    pub fn is_http_429_marker(&self) -> bool {
        matches!(self, SearchItem::Url(url) if url == HTTP_429_DETECTED)
    }
}
