// src/services/rate_limiter.rs - Fixed-window submission limits
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::{mapref::entry::Entry, DashMap};
use log::debug;

use crate::config::RateLimitConfig;

/// Counter for a single client within its current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Outcome of recording one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after_secs: u64,
}

/// In-memory per-key fixed-window counter.
///
/// A key's window opens on its first attempt and lasts `window`; at most
/// `max_requests` attempts are allowed inside it. The window is still active
/// at exactly `reset_at` and expires strictly after it.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            Duration::from_secs(config.window_seconds),
            config.max_submissions,
        )
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Records an attempt for `key`, returning whether it is allowed
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        self.attempt_at(key, now).allowed
    }

    /// Records an attempt and reports the remaining budget alongside the verdict
    pub fn attempt(&self, key: &str) -> RateLimitDecision {
        self.attempt_at(key, Instant::now())
    }

    pub fn attempt_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let fresh = RateLimitEntry {
            count: 1,
            reset_at: now + self.window,
        };

        // The entry guard holds the shard lock, so read-modify-write is atomic per key
        let (allowed, entry) = match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => (true, *vacant.insert(fresh)),
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                let allowed = if now > current.reset_at {
                    *current = fresh;
                    true
                } else if current.count >= self.max_requests {
                    false
                } else {
                    current.count += 1;
                    true
                };
                (allowed, *current)
            }
        };

        let decision = RateLimitDecision {
            allowed,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after_secs: ceil_secs(entry.reset_at.saturating_duration_since(now)),
        };

        if !allowed {
            debug!(
                "Rate limit exceeded, window resets in {}s",
                decision.reset_after_secs
            );
        }
        decision
    }

    /// Attempts left for `key` in its current window
    pub fn remaining(&self, key: &str) -> u32 {
        self.remaining_at(key, Instant::now())
    }

    pub fn remaining_at(&self, key: &str, now: Instant) -> u32 {
        match self.entries.get(key) {
            Some(entry) if now <= entry.reset_at => {
                self.max_requests.saturating_sub(entry.count)
            }
            _ => self.max_requests,
        }
    }

    /// Seconds until the window for `key` resets, rounded up; 0 when none is active
    pub fn reset_after(&self, key: &str) -> u64 {
        self.reset_after_at(key, Instant::now())
    }

    pub fn reset_after_at(&self, key: &str, now: Instant) -> u64 {
        self.entries
            .get(key)
            .map(|entry| ceil_secs(entry.reset_at.saturating_duration_since(now)))
            .unwrap_or(0)
    }

    /// Drops every entry whose window has expired, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.reset_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(1);

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Periodically evicts expired windows so the map does not grow without bound
pub fn spawn_cleanup(limiter: Arc<RateLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    // `interval` panics on a zero period
    let every = every.max(MIN_CLEANUP_INTERVAL);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = limiter.cleanup_expired();
            if removed > 0 {
                debug!(
                    "Rate limiter cleanup removed {} expired entries, {} active",
                    removed,
                    limiter.len()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_allows_up_to_max_then_denies() {
        let limiter = RateLimiter::new(HOUR, 3);
        let now = Instant::now();

        assert!(limiter.check_at("10.0.0.1", now));
        assert!(limiter.check_at("10.0.0.1", now + Duration::from_secs(1)));
        assert!(limiter.check_at("10.0.0.1", now + Duration::from_secs(2)));
        assert!(!limiter.check_at("10.0.0.1", now + Duration::from_secs(3)));
        assert!(!limiter.check_at("10.0.0.1", now + Duration::from_secs(4)));

        // Other clients have their own window
        assert!(limiter.check_at("10.0.0.2", now + Duration::from_secs(4)));
    }

    #[test]
    fn test_window_resets_strictly_after_reset_time() {
        let limiter = RateLimiter::new(HOUR, 1);
        let now = Instant::now();

        assert!(limiter.check_at("ip", now));
        assert!(!limiter.check_at("ip", now + HOUR));
        assert!(limiter.check_at("ip", now + HOUR + Duration::from_millis(1)));
        assert_eq!(limiter.remaining_at("ip", now + HOUR + Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(HOUR, 3);
        let now = Instant::now();

        assert_eq!(limiter.remaining_at("ip", now), 3);
        limiter.check_at("ip", now);
        assert_eq!(limiter.remaining_at("ip", now), 2);
        limiter.check_at("ip", now + Duration::from_secs(1));
        limiter.check_at("ip", now + Duration::from_secs(2));
        limiter.check_at("ip", now + Duration::from_secs(3));
        assert_eq!(limiter.remaining_at("ip", now + Duration::from_secs(3)), 0);

        // Expired windows report the full budget again
        assert_eq!(limiter.remaining_at("ip", now + HOUR + Duration::from_secs(1)), 3);
    }

    #[test]
    fn test_reset_after_rounds_up() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 3);
        let now = Instant::now();

        assert_eq!(limiter.reset_after_at("ip", now), 0);
        limiter.check_at("ip", now);
        assert_eq!(limiter.reset_after_at("ip", now), 10);
        assert_eq!(limiter.reset_after_at("ip", now + Duration::from_millis(1500)), 9);
        assert_eq!(limiter.reset_after_at("ip", now + Duration::from_secs(11)), 0);
    }

    #[test]
    fn test_attempt_reports_decision() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let now = Instant::now();

        let first = limiter.attempt_at("ip", now);
        assert_eq!(
            first,
            RateLimitDecision {
                allowed: true,
                remaining: 1,
                reset_after_secs: 60
            }
        );

        limiter.attempt_at("ip", now);
        let denied = limiter.attempt_at("ip", now + Duration::from_secs(30));
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_after_secs, 30);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();

        limiter.check_at("old", now);
        limiter.check_at("fresh", now + Duration::from_secs(50));
        assert_eq!(limiter.len(), 2);

        let removed = limiter.cleanup_expired_at(now + Duration::from_secs(61));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.remaining_at("fresh", now + Duration::from_secs(61)), 2);
    }

    #[tokio::test]
    async fn test_spawned_cleanup_evicts_entries() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(20), 3));
        limiter.check("ip");
        assert_eq!(limiter.len(), 1);

        let handle = spawn_cleanup(limiter.clone(), Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(limiter.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_cleanup_interval_keeps_sweeping() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(20), 3));
        limiter.check("10.0.0.9");

        let handle = spawn_cleanup(limiter.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!handle.is_finished());
        assert!(limiter.is_empty());
        handle.abort();
    }
}
