//! Fixed inter-request pacing using the governor crate.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default pacing: one request per second, matching the upstream API's
/// secondary rate limit guidance.
pub const DEFAULT_RPS: u32 = 1;

/// A direct rate limiter that paces outbound API requests.
///
/// Every call site awaits [`RequestPacer::wait`] before issuing a request,
/// so the whole process never exceeds the configured rate.
#[derive(Clone)]
pub struct RequestPacer {
    inner: Arc<GovernorRateLimiter>,
}

impl RequestPacer {
    /// Create a pacer allowing `requests_per_second` requests
    /// (values of 0 are treated as 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until the pacer allows another request.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(DEFAULT_RPS)
    }
}

#[cfg(test)]
impl RequestPacer {
    /// A pacer that effectively never blocks, for tests.
    pub fn unthrottled() -> Self {
        Self::new(u32::MAX)
    }
}
