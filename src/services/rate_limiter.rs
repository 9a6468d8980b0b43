use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};

/// Rate limiter shared by all upstream fetches.
///
/// The sentiment trackers and the quote API all throttle aggressively on
/// free tiers, so requests are spaced out and capped in flight even though
/// assets are analyzed concurrently.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    /// `max_concurrent` bounds in-flight requests; `requests_per_minute`
    /// sets the minimum spacing between request starts.
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Blocks until a permit is free and the spacing delay has elapsed.
    /// The returned guard releases the permit on drop.
    pub async fn acquire(&self) -> RateLimitGuard {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();

        let wait_time = {
            let last = self.last_request.lock();
            let elapsed = last.elapsed();

            if elapsed < self.min_delay {
                Some(self.min_delay - elapsed)
            } else {
                None
            }
        }; // lock dropped before sleeping

        if let Some(delay) = wait_time {
            sleep(delay).await;
        }

        *self.last_request.lock() = Instant::now();

        RateLimitGuard { _permit: permit }
    }
}

pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
