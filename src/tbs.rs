//! Builders for the `tbs` query parameter.
//!
//! Google overloads `tbs` for both verbatim search (`li:1`) and time
//! restrictions (`qdr:*` for relative windows, `cdr:1,...` for explicit date
//! ranges).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Relative time window for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    fn code(self) -> char {
        match self {
            TimeRange::Hour => 'h',
            TimeRange::Day => 'd',
            TimeRange::Week => 'w',
            TimeRange::Month => 'm',
            TimeRange::Year => 'y',
        }
    }
}

/// A `tbs` filter token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tbs {
    /// No filtering, sent as `0`.
    None,
    /// Verbatim search.
    Verbatim,
    /// Results from the past hour/day/week/month/year.
    Past(TimeRange),
    /// Results published between two dates, inclusive.
    Custom { from: NaiveDate, to: NaiveDate },
    /// A token passed through untouched.
    Raw(String),
}

impl fmt::Display for Tbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tbs::None => write!(f, "0"),
            Tbs::Verbatim => write!(f, "li:1"),
            Tbs::Past(range) => write!(f, "qdr:{}", range.code()),
            Tbs::Custom { from, to } => write!(f, "{}", get_tbs(*from, *to)),
            Tbs::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<Tbs> for String {
    fn from(tbs: Tbs) -> Self {
        tbs.to_string()
    }
}

/// Formats a custom date range as `cdr:1,cd_min:MM/DD/YYYY,cd_max:MM/DD/YYYY`.
pub fn get_tbs(from_date: NaiveDate, to_date: NaiveDate) -> String {
    format!(
        "cdr:1,cd_min:{},cd_max:{}",
        from_date.format("%m/%d/%Y"),
        to_date.format("%m/%d/%Y")
    )
}
