//! Sliding-window limiter for login attempts, keyed by client address.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("too many attempts, retry in {retry_after:?}")]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// Every this many checks, keys with no attempt inside the window are dropped.
const SWEEP_EVERY: usize = 256;

#[derive(Debug)]
pub struct LoginRateLimiter {
    attempts: DashMap<String, VecDeque<Instant>>,
    max_attempts: usize,
    window: Duration,
    checks: AtomicUsize,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts: max_attempts as usize,
            window,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn check_and_record(&self, key: &str) -> Result<(), RateLimited> {
        self.check_and_record_at(key, Instant::now())
    }

    /// Records an attempt at `now` unless `key` already used up its window.
    /// Rejected attempts are not recorded.
    pub fn check_and_record_at(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let outcome = self.record(key, now);
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep_at(now);
        }
        outcome
    }

    fn record(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let mut entry = self.attempts.entry(key.to_string()).or_default();
        let log = entry.value_mut();
        while log
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            log.pop_front();
        }

        if log.len() >= self.max_attempts {
            let oldest = log.front().copied().unwrap_or(now);
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(oldest));
            return Err(RateLimited { retry_after });
        }
        log.push_back(now);
        Ok(())
    }

    pub fn attempts(&self, key: &str) -> usize {
        self.attempts.get(key).map_or(0, |l| l.len())
    }

    /// Number of addresses currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }

    /// Drops every key whose latest attempt has left the window.
    pub fn sweep_at(&self, now: Instant) {
        self.attempts.retain(|_, log| {
            log.back()
                .is_some_and(|t| now.saturating_duration_since(*t) < self.window)
        });
    }
}
