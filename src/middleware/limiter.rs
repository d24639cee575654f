//! Sliding-window request limiter

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitConfig {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Requests per minute
    #[must_use]
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

/// Outcome of one acquire
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left in the window after this one
    pub remaining: u32,
    /// Time until the oldest request in the window expires
    pub reset_after: Duration,
}

/// In-memory sliding-window limiter keyed by string
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Count and record the request if it fits in the window
    pub async fn acquire(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();
        let window_start = now.checked_sub(self.config.window);

        let mut requests = self.requests.write().await;
        let records = requests.entry(key.to_string()).or_default();
        if let Some(start) = window_start {
            records.retain(|t| *t > start);
        }

        let reset_after = records
            .first()
            .map(|oldest| self.config.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO);

        let current = records.len() as u32;
        if current >= self.config.max_requests {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }

        records.push(now);
        RateLimitResult {
            allowed: true,
            remaining: self.config.max_requests - current - 1,
            reset_after,
        }
    }

    /// Return the slot taken by the most recent `acquire` for `key`
    pub async fn release(&self, key: &str) {
        let mut requests = self.requests.write().await;
        if let Some(records) = requests.get_mut(key) {
            records.pop();
        }
    }

    /// Drop keys with no requests left in the window; returns how many
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let Some(window_start) = now.checked_sub(self.config.window) else {
            return 0;
        };

        let mut requests = self.requests.write().await;
        let initial_count = requests.len();
        requests.retain(|_, records| {
            records.retain(|t| *t > window_start);
            !records.is_empty()
        });
        initial_count - requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_under_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::new(5, Duration::from_secs(60)));

        for expected_remaining in (0..5).rev() {
            let result = limiter.acquire("user1").await;
            assert!(result.allowed);
            assert_eq!(result.remaining, expected_remaining);
        }
    }

    #[tokio::test]
    async fn test_denies_over_limit() {
        let limiter = RateLimiter::new(RateLimitConfig::new(3, Duration::from_secs(60)));

        for _ in 0..3 {
            assert!(limiter.acquire("user1").await.allowed);
        }

        let result = limiter.acquire("user1").await;
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert!(result.reset_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_separate_keys() {
        let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_secs(60)));

        limiter.acquire("user1").await;
        limiter.acquire("user1").await;
        assert!(!limiter.acquire("user1").await.allowed);

        assert!(limiter.acquire("user2").await.allowed);
    }

    #[tokio::test]
    async fn test_release_frees_slot() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, Duration::from_secs(60)));

        assert!(limiter.acquire("user1").await.allowed);
        limiter.release("user1").await;
        assert!(limiter.acquire("user1").await.allowed);

        // Unknown keys are ignored
        limiter.release("nobody").await;
    }

    #[tokio::test]
    async fn test_window_expires() {
        let limiter = RateLimiter::new(RateLimitConfig::new(1, Duration::from_millis(50)));

        assert!(limiter.acquire("user1").await.allowed);
        assert!(!limiter.acquire("user1").await.allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.acquire("user1").await.allowed);
    }

    #[tokio::test]
    async fn test_cleanup_removes_idle_keys() {
        let limiter = RateLimiter::new(RateLimitConfig::new(5, Duration::from_millis(30)));
        limiter.acquire("user1").await;
        limiter.acquire("user2").await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(limiter.cleanup().await, 2);
    }
}
