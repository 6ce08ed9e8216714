//! # yagooglesearch
//!
//! A polite, rate-limit-aware Google search scraping client.
//!
//! The client pages through Google result pages the way a browser would:
//!
//! - Picks up cookies from the home page before searching
//! - Waits a random delay between result pages
//! - Backs off geometrically on HTTP 429 or hands the 429 back to the caller
//! - Filters Google's own links and duplicates, capped at a maximum
//!
//! ## Example
//!
//! ```rust,no_run
//! use yagooglesearch::{SearchClient, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SearchConfig::new("site:github.com rust async")
//!         .with_max_results(20)
//!         .with_verbose_output(true);
//!     let mut client = SearchClient::new(config)?;
//!
//!     let outcome = client.search().await?;
//!     for record in &outcome.results {
//!         println!("{}. {} - {}", record.rank, record.title, record.url);
//!     }
//!     if outcome.is_throttled() {
//!         eprintln!("Google returned HTTP 429");
//!     }
//!     Ok(())
//! }
//! ```

mod backoff;
mod client;
mod config;
mod error;
mod filter;
mod result;
mod session;
mod tbs;
mod throttle;
mod user_agents;

pub mod fetcher;
pub mod fetcher_http;
pub mod parser;
pub mod proxy;
pub mod sleeper;

pub use backoff::{BackoffController, BackoffDecision, BackoffPhase};
pub use client::SearchClient;
pub use config::{normalize_lang_result, result_languages, SearchConfig, BUILTIN_URL_PARAMETERS, MAX_RESULTS_PER_PAGE};
pub use error::{Result, SearchError};
pub use filter::{filter_records, is_self_referential, Admission, ResultAccumulator, ENGINE_DOMAIN};
pub use result::{ResultRecord, SearchItem, SessionOutcome, SessionStatus, HTTP_429_DETECTED};
pub use tbs::{get_tbs, Tbs, TimeRange};
pub use throttle::{is_throttled, HTTP_TOO_MANY_REQUESTS};
pub use user_agents::{random_user_agent, user_agents, USER_AGENT};
