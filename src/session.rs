//! Pagination driver for one search session.
//!
//! ```text
//! Warmup -> FirstPage -> Paging -> Done
//!               \          /
//!                Throttled
//! ```
//!
//! A session owns its backoff and accumulator state. The fetcher (and with it
//! the cookie jar) is borrowed from the client so cookies survive between
//! pages.

use rand::{Rng, RngCore};
use tracing::{error, info, warn};

use crate::backoff::{BackoffController, BackoffDecision};
use crate::fetcher::{FetchResponse, PageFetcher};
use crate::filter::{Admission, ResultAccumulator};
use crate::parser::ResultParser;
use crate::sleeper::Sleeper;
use crate::throttle::is_throttled;
use crate::{Result, SearchConfig, SessionOutcome, SessionStatus};

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetching the home page for cookies.
    Warmup,
    /// Fetching the first result page.
    FirstPage,
    /// Fetching subsequent result pages.
    Paging,
    /// Finished with the given status.
    Done(SessionStatus),
}

/// Counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Offset of the page being requested.
    pub start: u32,
    /// HTTP 429 responses waited out.
    pub throttle_retries: u32,
    /// Result pages fetched successfully.
    pub pages_fetched: u32,
}

enum PageFetch {
    Page(FetchResponse),
    Stop(SessionStatus),
}

/// Drives one search from warm-up to completion.
pub(crate) struct Session<'a> {
    config: &'a SearchConfig,
    fetcher: &'a dyn PageFetcher,
    sleeper: &'a dyn Sleeper,
    parser: &'a ResultParser,
    rng: &'a mut (dyn RngCore + Send),
    backoff: BackoffController,
    accumulator: ResultAccumulator,
    state: SessionState,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        config: &'a SearchConfig,
        fetcher: &'a dyn PageFetcher,
        sleeper: &'a dyn Sleeper,
        parser: &'a ResultParser,
        rng: &'a mut (dyn RngCore + Send),
    ) -> Self {
        Self {
            config,
            fetcher,
            sleeper,
            parser,
            rng,
            backoff: BackoffController::from_config(config),
            accumulator: ResultAccumulator::new(config.max_search_result_urls_to_return),
            state: SessionState {
                start: config.start,
                ..Default::default()
            },
        }
    }

    /// Runs the session to completion.
    ///
    /// A transport failure is returned as an error only when nothing has been
    /// collected yet; otherwise the partial results come back as `Aborted`.
    pub(crate) async fn run(mut self) -> Result<SessionOutcome> {
        let mut phase = if self.accumulator.is_full() {
            Phase::Done(SessionStatus::Completed)
        } else {
            Phase::Warmup
        };

        loop {
            let step = match phase {
                Phase::Warmup => self.warmup().await,
                Phase::FirstPage => self.first_page().await,
                Phase::Paging => self.next_page().await,
                Phase::Done(status) => return Ok(self.finish(status)),
            };

            phase = match step {
                Ok(next) => next,
                Err(e) if !self.accumulator.is_empty() => {
                    error!(
                        "Search stopped by a transport failure, returning {} results collected so far: {}",
                        self.accumulator.len(),
                        e
                    );
                    Phase::Done(SessionStatus::Aborted)
                }
                Err(e) => return Err(e),
            };
        }
    }

    /// Visits the home page like a browser would before searching.
    async fn warmup(&mut self) -> Result<Phase> {
        let response = self.fetcher.fetch(&self.config.home_url()).await?;
        if !response.is_ok() {
            warn!("Home page returned HTTP {}, continuing with the search", response.status);
        }
        Ok(Phase::FirstPage)
    }

    async fn first_page(&mut self) -> Result<Phase> {
        let response = match self.fetch_results_page().await? {
            PageFetch::Page(response) => response,
            PageFetch::Stop(status) => return Ok(Phase::Done(status)),
        };

        let found = self.accumulate(&response);
        if self.accumulator.is_full() {
            return Ok(Phase::Done(SessionStatus::Completed));
        }
        if (found as u32) < self.config.num {
            info!(
                "The number of valid search results ({}) was less than num={} for this page, so there won't be a next page",
                found, self.config.num
            );
            return Ok(Phase::Done(SessionStatus::Completed));
        }
        Ok(Phase::Paging)
    }

    async fn next_page(&mut self) -> Result<Phase> {
        let delay = self.rng.gen_range(self.config.delay_range());
        info!("Sleeping {} seconds until retrieving the next page of results...", delay);
        self.sleeper.sleep(std::time::Duration::from_secs(delay)).await;

        self.state.start += self.config.num;
        let response = match self.fetch_results_page().await? {
            PageFetch::Page(response) => response,
            PageFetch::Stop(status) => return Ok(Phase::Done(status)),
        };

        let found = self.accumulate(&response);
        if self.accumulator.is_full() {
            return Ok(Phase::Done(SessionStatus::Completed));
        }
        if found == 0 {
            info!("No valid search results found on this page. Moving on...");
            return Ok(Phase::Done(SessionStatus::Completed));
        }
        Ok(Phase::Paging)
    }

    /// Fetches the current page, waiting out 429s when allowed to.
    async fn fetch_results_page(&mut self) -> Result<PageFetch> {
        info!(
            "Stats: start={}, num={}, total_valid_links_found={} / max_search_result_urls_to_return={}",
            self.state.start,
            self.config.num,
            self.accumulator.len(),
            self.config.max_search_result_urls_to_return
        );
        let url = self.config.search_url(self.state.start);

        loop {
            let response = self.fetcher.fetch(&url).await?;
            if !is_throttled(response.status) {
                self.backoff.on_success();
                self.state.pages_fetched += 1;
                return Ok(PageFetch::Page(response));
            }

            warn!("Google is blocking your IP for making too many requests in a specific time period.");
            if !self.config.yagooglesearch_manages_http_429s {
                info!("Since yagooglesearch_manages_http_429s=false, the search is done.");
                return Ok(PageFetch::Stop(SessionStatus::ThrottledUnhandled));
            }

            match self.backoff.on_throttle() {
                BackoffDecision::Retry(cool_off) => {
                    self.state.throttle_retries += 1;
                    self.sleeper.sleep(cool_off).await;
                }
                BackoffDecision::GiveUp => return Ok(PageFetch::Stop(SessionStatus::Aborted)),
            }
        }
    }

    /// Parses a page and offers its records; returns how many were new.
    fn accumulate(&mut self, response: &FetchResponse) -> usize {
        if !response.is_ok() {
            warn!("HTML response code: {}", response.status);
            return 0;
        }

        let mut found = 0;
        for record in self.parser.parse(&response.body) {
            match self.accumulator.offer(record) {
                Admission::Accepted(_) => found += 1,
                Admission::Full => break,
                Admission::SelfReferential | Admission::Duplicate => {}
            }
            if self.accumulator.is_full() {
                break;
            }
        }
        found
    }

    fn finish(self, status: SessionStatus) -> SessionOutcome {
        info!(
            "Search finished ({:?}) with {} results after {} pages and {} HTTP 429 retries",
            status,
            self.accumulator.len(),
            self.state.pages_fetched,
            self.state.throttle_retries
        );
        SessionOutcome {
            results: self.accumulator.into_records(),
            status,
            verbose_output: self.config.verbose_output,
        }
    }
}
