//! HTTP 429 cool-off policy.
//!
//! Each consecutive 429 sleeps for the current cool-off and then grows it by a
//! fixed factor. Any other response resets the controller.

use std::time::Duration;

use tracing::{info, warn};

use crate::SearchConfig;

/// Phase of the backoff state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPhase {
    /// No recent 429.
    #[default]
    Normal,
    /// At least one 429 since the last successful response.
    CoolingOff,
}

/// What the session should do after a 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Sleep for the duration, then retry the same page.
    Retry(Duration),
    /// The retry cap is exhausted.
    GiveUp,
}

/// Stateful cool-off calculator for one search session.
#[derive(Debug, Clone)]
pub struct BackoffController {
    base_minutes: f64,
    factor: f64,
    max_retries: Option<u32>,
    current_minutes: f64,
    failures: u32,
    phase: BackoffPhase,
}

impl BackoffController {
    /// Creates a controller with a base cool-off in minutes, a growth factor
    /// and an optional cap on consecutive retries.
    pub fn new(base_minutes: f64, factor: f64, max_retries: Option<u32>) -> Self {
        Self {
            base_minutes,
            factor,
            max_retries,
            current_minutes: base_minutes,
            failures: 0,
            phase: BackoffPhase::Normal,
        }
    }

    /// Creates a controller from the client configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.http_429_cool_off_time_in_minutes,
            config.http_429_cool_off_factor,
            config.max_http_429_retries,
        )
    }

    /// Records a 429 and decides whether to retry.
    pub fn on_throttle(&mut self) -> BackoffDecision {
        if let Some(max) = self.max_retries {
            if self.failures >= max {
                warn!(
                    "Giving up after {} consecutive HTTP 429 responses",
                    self.failures
                );
                return BackoffDecision::GiveUp;
            }
        }

        let sleep = minutes(self.current_minutes);
        let next_minutes = saturate(round_to_hundredths(self.current_minutes * self.factor));
        info!(
            "Sleeping for {} minutes, then increasing HTTP 429 cool off time by a factor of {} to {} minutes",
            self.current_minutes, self.factor, next_minutes
        );

        self.current_minutes = next_minutes;
        self.failures += 1;
        self.phase = BackoffPhase::CoolingOff;
        BackoffDecision::Retry(sleep)
    }

    /// Records a non-429 response and resets to the base cool-off.
    pub fn on_success(&mut self) {
        if self.phase == BackoffPhase::CoolingOff {
            info!(
                "Request succeeded after {} HTTP 429 responses, resetting cool off to {} minutes",
                self.failures, self.base_minutes
            );
        }
        self.current_minutes = self.base_minutes;
        self.failures = 0;
        self.phase = BackoffPhase::Normal;
    }

    /// Current phase.
    pub fn phase(&self) -> BackoffPhase {
        self.phase
    }

    /// Consecutive 429s since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Cool-off the next 429 would sleep for.
    pub fn current_cool_off(&self) -> Duration {
        minutes(self.current_minutes)
    }
}

/// Converts minutes to a duration, clamped to what `Duration` can hold.
fn minutes(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0) * 60.0).unwrap_or(Duration::MAX)
}

/// Keeps the cool-off finite once growth overflows.
fn saturate(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::MAX
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
