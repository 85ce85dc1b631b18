use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between outbound requests.
///
/// The two engines run as separate processes and are not coordinated, so
/// each must stay within the exchange's published limit on its own.
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until a request slot is available and claim the next one.
    /// Concurrent callers are serialized `min_interval` apart.
    pub async fn acquire(&self) {
        let at = {
            let mut slot = self.next_slot.lock().await;
            let now = Instant::now();
            let at = match *slot {
                Some(t) if t > now => t,
                _ => now,
            };
            *slot = Some(at + self.min_interval);
            at
        };
        tokio::time::sleep_until(at).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(1200));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(1200));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2400));
    }

    #[tokio::test(start_paused = true)]
    async fn slot_is_not_carried_after_a_long_idle_gap() {
        let limiter = RateLimiter::new(Duration::from_millis(1200));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
