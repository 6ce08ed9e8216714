//! Waiting between requests.
//!
//! The session never sleeps directly so tests can record the requested
//! durations instead of waiting for minutes.

use std::time::Duration;

use async_trait::async_trait;

/// Something that can pause the session.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`. No requests are issued meanwhile.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(90)).await;
        assert!(start.elapsed() >= Duration::from_secs(90));
    }
}
