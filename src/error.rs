//! Error types for the search client.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while configuring or running a search.
///
/// Throttling (HTTP 429) and odd result markup are deliberately absent: the
/// former is reported through [`SessionStatus`](crate::SessionStatus), the
/// latter is recovered inside the parser.
#[derive(Error, Debug)]
pub enum SearchError {
    /// DNS, connect, timeout or TLS failure while talking to the server.
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid combination of parameters.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A CSS selector failed to compile.
    #[error("Failed to parse selector: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_configuration() {
        let err = SearchError::Configuration("bad proxy".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad proxy");
    }

    #[test]
    fn test_error_display_invalid_query() {
        let err = SearchError::InvalidQuery("empty query".to_string());
        assert_eq!(err.to_string(), "Invalid query: empty query");
    }

    #[test]
    fn test_error_display_parse() {
        let err = SearchError::Parse("div..g".to_string());
        assert_eq!(err.to_string(), "Failed to parse selector: div..g");
    }

    #[test]
    fn test_error_from_url_parse() {
        let err: SearchError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, SearchError::UrlParse(_)));
        assert!(err.to_string().starts_with("URL parsing error"));
    }

    #[test]
    fn test_error_debug() {
        let err = SearchError::Configuration("x".into());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Configuration"));
    }
}
