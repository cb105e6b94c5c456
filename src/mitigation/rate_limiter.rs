// Minimum-interval rate limiter for the image lookup API.
//
// Giphy's free keys are throttled per hour, and a busy workspace can cross
// thresholds in several channels at once. Lookups are fire-and-forget, so a
// lookup that arrives too soon is refused instead of queued; the caller then
// falls back to plain text.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Allows at most one request per `interval`.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    interval: Duration,
    last_granted: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                last_granted: None,
            })),
        }
    }

    /// Claim a slot if one is free right now. Never sleeps.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let ready = match inner.last_granted {
            Some(last) => now.duration_since(last) >= inner.interval,
            None => true,
        };
        if ready {
            inner.last_granted = Some(now);
        }
        ready
    }

    /// Time left until the next slot opens (zero if one is free).
    pub async fn wait_time(&self) -> Duration {
        let inner = self.inner.lock().await;
        match inner.last_granted {
            Some(last) => inner.interval.saturating_sub(Instant::now().duration_since(last)),
            None => Duration::ZERO,
        }
    }
}
