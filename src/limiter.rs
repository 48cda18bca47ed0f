//! Sliding-window admission control for the upstream quota.
//!
//! Tracks the timestamps of admitted requests in a deque, oldest first.
//! Entries are appended in non-decreasing time order and pruned from the
//! front only, so pruning is amortised O(1) per call. This is not a token
//! bucket: bursts up to `max_requests` are admitted as long as they fall
//! outside each other's `time_window`, and the boundary is exact
//! per-timestamp rather than quantised into fixed buckets.
//!
//! The limiter never blocks or rejects — `add_request` always records, and
//! callers are expected to consult `can_make_request`/`wait_time` first.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Sliding-window rate limiter shared across concurrent logical calls.
///
/// The mutex around the window is held only for prune/check/append, never
/// across a sleep or network call.
pub struct RateLimiter {
    max_requests: usize,
    time_window: Duration,
    window: Mutex<VecDeque<Instant>>,
}

/// Point-in-time limiter snapshot for the monitoring surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimiterStats {
    /// Admitted requests still inside the trailing window.
    pub requests_in_window: usize,
    /// Configured quota for the window.
    pub max_requests: usize,
    /// Remaining capacity; never negative.
    pub remaining_requests: usize,
    /// Seconds until a slot frees up, absent when admission would succeed.
    pub wait_time_seconds: Option<f64>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Limiter with the conventional 60-second quota window.
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Whether a request would currently be admitted.
    ///
    /// Prunes stale entries as a side effect; that only removes entries that
    /// are by definition invalid, so repeated calls observe the same answer.
    pub fn can_make_request(&self) -> bool {
        let mut window = self.lock_window();
        Self::prune(&mut window, self.time_window);
        window.len() < self.max_requests
    }

    /// Record an admitted request at the current instant.
    ///
    /// No capacity check happens here — the caller checks
    /// `can_make_request` first. Recording before the network call goes out
    /// biases toward under-running the upstream quota.
    pub fn add_request(&self) {
        self.lock_window().push_back(Instant::now());
    }

    /// Time until the oldest in-window request slides out, or `None` when
    /// admission would already succeed (including the race where pruning
    /// just emptied the window).
    pub fn wait_time(&self) -> Option<Duration> {
        let mut window = self.lock_window();
        Self::prune(&mut window, self.time_window);
        if window.len() < self.max_requests {
            return None;
        }
        let oldest = *window.front()?;
        Some((oldest + self.time_window).saturating_duration_since(Instant::now()))
    }

    /// Snapshot after pruning, computed under a single lock acquisition.
    pub fn stats(&self) -> RateLimiterStats {
        let mut window = self.lock_window();
        Self::prune(&mut window, self.time_window);
        let in_window = window.len();
        let wait = if in_window < self.max_requests {
            None
        } else {
            window
                .front()
                .map(|oldest| (*oldest + self.time_window).saturating_duration_since(Instant::now()))
        };
        RateLimiterStats {
            requests_in_window: in_window,
            max_requests: self.max_requests,
            remaining_requests: self.max_requests.saturating_sub(in_window),
            wait_time_seconds: wait.map(|d| d.as_secs_f64()),
        }
    }

    /// Drop every timestamp strictly older than `now - time_window`.
    fn prune(window: &mut VecDeque<Instant>, time_window: Duration) {
        let now = Instant::now();
        while let Some(front) = window.front() {
            if now.duration_since(*front) > time_window {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock_window(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.window
            .lock()
            .expect("rate limiter window lock poisoned")
    }
}
