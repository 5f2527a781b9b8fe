//! Global ceiling on scan throughput.
//!
//! Independent of per-credential rate limits: this bounds load on the
//! hosting platform itself. Every worker shares one limiter.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::sleep;

pub struct ScanThrottle {
    limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ScanThrottle {
    pub fn per_minute(scans: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(scans).unwrap_or(nonzero!(1u32)));
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Waits until another scan is permitted inside the current window.
    pub async fn acquire(&self) {
        self.acquire_while(|| true).await;
    }

    /// Like [`acquire`](Self::acquire), but gives up once `keep_waiting`
    /// turns false. Returns whether a slot was taken, so a stopping worker
    /// is not parked for the remainder of the window.
    pub async fn acquire_while(&self, keep_waiting: impl Fn() -> bool) -> bool {
        loop {
            if self.limiter.check().is_ok() {
                return true;
            }
            if !keep_waiting() {
                return false;
            }
            sleep(Duration::from_millis(100)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_within_quota_does_not_block() {
        let throttle = ScanThrottle::per_minute(100);
        for _ in 0..100 {
            throttle.acquire().await;
        }
    }

    #[test]
    fn zero_quota_falls_back_to_one() {
        // Must not panic on a misconfigured zero
        let _ = ScanThrottle::per_minute(0);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_beyond_quota_blocks() {
        let throttle = ScanThrottle::per_minute(2);
        throttle.acquire().await;
        throttle.acquire().await;

        // The cells replenish on the wall clock, so the third acquire is
        // still waiting when the virtual deadline fires.
        let third = tokio::time::timeout(Duration::from_secs(1), throttle.acquire()).await;
        assert!(third.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_waiters_can_give_up() {
        let throttle = ScanThrottle::per_minute(1);
        assert!(throttle.acquire_while(|| true).await);
        assert!(!throttle.acquire_while(|| false).await);
    }
}
