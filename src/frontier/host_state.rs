//! Per-host politeness state
//!
//! Each host gets a token bucket with capacity one: a request may go out only
//! when the spacing since the previous request to that host is at least
//! `1 / per-host-rps`. Capacity one means no burst is ever allowed, even after
//! a long idle stretch. A separate counter enforces `per-host-concurrency`.
//!
//! All checks take an explicit `Instant` so tests can drive a simulated clock.

use crate::config::RateLimitConfig;
use std::time::{Duration, Instant};

/// Rate-limit and concurrency state for a single host
#[derive(Debug, Clone)]
pub struct HostState {
    /// When the last request to this host was released
    last_request: Option<Instant>,

    /// Requests currently in flight against this host
    active: usize,

    /// Total requests released to this host
    request_count: u64,
}

impl HostState {
    pub fn new() -> Self {
        Self {
            last_request: None,
            active: 0,
            request_count: 0,
        }
    }

    /// Checks whether a request may be released to this host at `now`
    ///
    /// Both gates must pass: the in-flight count is below the per-host
    /// concurrency cap, and at least the minimum interval has elapsed since
    /// the previous release. A host that has never been contacted is ready
    /// immediately.
    pub fn can_request(&self, limits: &RateLimitConfig, now: Instant) -> bool {
        if self.active >= limits.per_host_concurrency {
            return false;
        }

        match self.last_request {
            None => true,
            Some(last) => now.duration_since(last) >= limits.min_interval(),
        }
    }

    /// Records a request release at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request = Some(now);
        self.active += 1;
        self.request_count += 1;
    }

    /// Records completion of an in-flight request
    pub fn complete_request(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// How long until the spacing gate opens, measured from `now`
    ///
    /// Returns zero when the spacing gate is already open. Says nothing about
    /// the concurrency gate, which has no timed bound.
    pub fn time_until_ready(&self, limits: &RateLimitConfig, now: Instant) -> Duration {
        match self.last_request {
            None => Duration::ZERO,
            Some(last) => {
                let elapsed = now.duration_since(last);
                limits.min_interval().saturating_sub(elapsed)
            }
        }
    }

    /// Requests currently in flight against this host
    pub fn active(&self) -> usize {
        self.active
    }

    /// Total requests released to this host
    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}
