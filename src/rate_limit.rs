use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

/// Per-IP token buckets: `burst` requests up front, refilled evenly so a
/// full bucket comes back after `window`.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
    burst: f64,
    per_second: f64,
}

impl RateLimiter {
    pub fn new(burst: u32, window: Duration) -> Self {
        let burst = f64::from(burst);
        let window = window.as_secs_f64();
        Self {
            buckets: Mutex::new(HashMap::new()),
            burst,
            per_second: if window > 0.0 { burst / window } else { 0.0 },
        }
    }

    /// Takes one token for `ip`. Returns `false` when the bucket is empty.
    pub async fn try_acquire(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_second).min(self.burst);
        bucket.last_seen = now;

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }

    /// Forgets addresses not seen for `max_age`. Returns how many remain.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        buckets.retain(|_, bucket| now.duration_since(bucket.last_seen) < max_age);
        buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_then_reject() {
        let limiter = RateLimiter::new(5, Duration::from_secs(600));
        for _ in 0..5 {
            assert!(limiter.try_acquire(ip("10.0.0.1")).await);
        }
        assert!(!limiter.try_acquire(ip("10.0.0.1")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn addresses_have_their_own_buckets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.try_acquire(ip("10.0.0.1")).await);
        assert!(!limiter.try_acquire(ip("10.0.0.1")).await);
        assert!(limiter.try_acquire(ip("10.0.0.2")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_come_back_over_the_window() {
        let limiter = RateLimiter::new(30, Duration::from_secs(60));
        for _ in 0..30 {
            assert!(limiter.try_acquire(ip("::1")).await);
        }
        assert!(!limiter.try_acquire(ip("::1")).await);

        // Half a window refills half the burst.
        tokio::time::advance(Duration::from_secs(30)).await;
        for _ in 0..15 {
            assert!(limiter.try_acquire(ip("::1")).await);
        }
        assert!(!limiter.try_acquire(ip("::1")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_drops_quiet_addresses() {
        let limiter = RateLimiter::new(5, Duration::from_secs(600));
        limiter.try_acquire(ip("10.0.0.1")).await;
        tokio::time::advance(Duration::from_secs(120)).await;
        limiter.try_acquire(ip("10.0.0.2")).await;

        assert_eq!(limiter.cleanup(Duration::from_secs(60)).await, 1);
        assert_eq!(limiter.cleanup(Duration::ZERO).await, 0);
    }
}
