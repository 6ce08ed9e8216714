//! Result filtering, deduplication and capping.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::ResultRecord;

/// Substring identifying the search engine's own hosts.
pub const ENGINE_DOMAIN: &str = "google";

/// Outcome of offering a record to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Kept, with its session-wide rank.
    Accepted(u32),
    /// Points back at the search engine.
    SelfReferential,
    /// URL already collected.
    Duplicate,
    /// The maximum has been reached.
    Full,
}

/// Returns whether `domain` appears anywhere in `url`, ignoring case.
///
/// The whole URL is checked, path and query included, so links that merely
/// pass through the engine are dropped too.
pub fn is_self_referential(url: &str, domain: &str) -> bool {
    url.to_lowercase().contains(&domain.to_lowercase())
}

/// Collects accepted results for one session.
///
/// Records are kept in the order offered; the first occurrence of a URL wins
/// and ranks are reassigned from 1 so they increase across pages.
#[derive(Debug, Clone)]
pub struct ResultAccumulator {
    max: usize,
    seen: HashSet<String>,
    records: Vec<ResultRecord>,
}

impl ResultAccumulator {
    /// Creates an accumulator holding at most `max` records.
    pub fn new(max: usize) -> Self {
        Self {
            max,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Applies the filter rules to one record.
    pub fn offer(&mut self, record: ResultRecord) -> Admission {
        if is_self_referential(&record.url, ENGINE_DOMAIN) {
            debug!("Excluding URL because it contains \"{}\": {}", ENGINE_DOMAIN, record.url);
            return Admission::SelfReferential;
        }

        if self.seen.contains(&record.url) {
            info!("Duplicate URL found: {}", record.url);
            return Admission::Duplicate;
        }

        if self.is_full() {
            return Admission::Full;
        }

        let rank = self.records.len() as u32 + 1;
        info!("Found unique URL #{}: {}", rank, record.url);
        self.seen.insert(record.url.clone());
        self.records.push(record.with_rank(rank));
        Admission::Accepted(rank)
    }

    /// Whether the maximum has been reached.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.max
    }

    /// Number of accepted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been accepted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the accumulator, returning the accepted records.
    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }
}

/// Filters a complete list in one go.
///
/// Idempotent: filtering the output again returns it unchanged.
pub fn filter_records(records: impl IntoIterator<Item = ResultRecord>, max: usize) -> Vec<ResultRecord> {
    let mut accumulator = ResultAccumulator::new(max);
    for record in records {
        if accumulator.is_full() {
            break;
        }
        accumulator.offer(record);
    }
    accumulator.into_records()
}
