// Request pacing for rate-limited model APIs.
//
// The lock is held across the wait, so concurrent callers are released one
// interval apart in arrival order. A request is only recorded once its wait
// has finished; a caller cancelled mid-wait (e.g. by a per-signal timeout)
// leaves no trace and does not delay anyone behind it.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Clone)]
pub struct RateLimiter {
    interval: Duration,
    /// When the last request was let through
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Allow at most `requests_per_second` calls per second.
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / requests_per_second),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait for this caller's turn.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}
