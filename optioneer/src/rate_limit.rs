//! Coarse request throttling for the embed surface.
//!
//! This is a best-effort, per-process safeguard keyed by public key, distinct
//! from the durable monthly quota enforced against the database. The trait
//! seam exists so a multi-instance deployment can swap in a shared external
//! counter without touching the handlers; correctness-critical quotas must
//! not be moved here.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Fixed-window request throttle.
pub trait RequestThrottle: Send + Sync {
    /// Record one request for `key`; returns false when the key is over its
    /// per-window budget.
    fn allow(&self, key: &str) -> bool;
}

/// In-process fixed-window throttle backed by a concurrent map.
///
/// Window state is scoped to this process instance; replicas each enforce
/// their own budget.
#[derive(Debug)]
pub struct InProcessThrottle {
    windows: DashMap<String, (Instant, u32)>,
    window: Duration,
    max_per_window: u32,
}

impl InProcessThrottle {
    /// `max_per_window` of 0 disables throttling entirely.
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_per_window,
        }
    }
}

impl RequestThrottle for InProcessThrottle {
    fn allow(&self, key: &str) -> bool {
        if self.max_per_window == 0 {
            return true;
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert((now, 0));
        let (window_start, count) = *entry;

        if now.duration_since(window_start) >= self.window {
            *entry = (now, 1);
            return true;
        }

        if count >= self.max_per_window {
            return false;
        }

        *entry = (window_start, count + 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_disables_throttling() {
        let throttle = InProcessThrottle::new(0, Duration::from_secs(60));
        for _ in 0..1000 {
            assert!(throttle.allow("pk-test"));
        }
    }

    #[test]
    fn test_budget_enforced_within_window() {
        let throttle = InProcessThrottle::new(3, Duration::from_secs(60));
        assert!(throttle.allow("pk-a"));
        assert!(throttle.allow("pk-a"));
        assert!(throttle.allow("pk-a"));
        assert!(!throttle.allow("pk-a"));

        // Separate keys have separate budgets
        assert!(throttle.allow("pk-b"));
    }

    #[test]
    fn test_window_resets() {
        let throttle = InProcessThrottle::new(1, Duration::from_millis(20));
        assert!(throttle.allow("pk-a"));
        assert!(!throttle.allow("pk-a"));

        std::thread::sleep(Duration::from_millis(25));
        assert!(throttle.allow("pk-a"));
    }
}
