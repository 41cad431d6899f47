//! Registration rate limiting.
//!
//! In-memory, process-local state: the window resets on restart. Horizontal
//! scaling needs a shared implementation of [`RegistrationGate`] backed by a
//! common store; everything else goes through the port unchanged.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Admission port for registration attempts, keyed by client IP.
pub trait RegistrationGate: Send + Sync {
    /// Admit or reject one attempt. An admitted attempt consumes a window
    /// slot; a rejected attempt does not.
    fn check(&self, key: &str) -> bool;

    /// Drop all accounting (demo reset).
    fn reset(&self);
}

/// Sliding-window limiter: at most `max_requests` admitted per `window` per
/// key.
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// The default registration policy: 5 per rolling minute.
    pub fn registration_default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// Slots left in the current window for `key`.
    pub fn remaining(&self, key: &str) -> usize {
        let mut hits = self.hits.lock().unwrap();
        let now = Instant::now();
        let window = self.window;
        let used = hits
            .get_mut(key)
            .map(|entries| {
                entries.retain(|t| now.duration_since(*t) < window);
                entries.len()
            })
            .unwrap_or(0);
        self.max_requests.saturating_sub(used)
    }
}

impl RegistrationGate for SlidingWindowLimiter {
    fn check(&self, key: &str) -> bool {
        let mut hits = self.hits.lock().unwrap();
        let now = Instant::now();
        let entries = hits.entry(key.to_string()).or_default();
        entries.retain(|t| now.duration_since(*t) < self.window);

        if entries.len() < self.max_requests {
            entries.push(now);
            true
        } else {
            false
        }
    }

    fn reset(&self) {
        self.hits.lock().unwrap().clear();
    }
}
