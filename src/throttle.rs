//! Throttle detection.

/// Status Google answers with when a client is searching too fast.
pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Returns whether a response status means the client is being throttled.
pub fn is_throttled(status: u16) -> bool {
    status == HTTP_TOO_MANY_REQUESTS
}
