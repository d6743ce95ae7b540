//! Per-client fixed-window rate limiting.
//!
//! Each client gets a fixed 60-second window. The window records the
//! account tier in effect when it opened; a tier change takes effect at
//! the next window, never mid-window. Free-tier clients get a fixed
//! budget per window. Pro-tier clients are never denied but their usage
//! is still counted.
//!
//! All state lives behind one mutex. Lookups are a hash probe and an
//! integer bump, so the critical section is nanoseconds.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sentinel_core::protocol::AccountTier;

/// Length of the accounting window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Submissions a free-tier client may make per window.
pub const FREE_TIER_BUDGET: u32 = 100;

/// One client's usage within its current window.
#[derive(Clone, Copy, Debug)]
struct WindowUsage {
    opened: Instant,
    tier: AccountTier,
    count: u32,
}

/// Fixed-window rate limiter keyed by client ID.
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, WindowUsage>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one submission attempt for `client_id` and return whether it
    /// is admitted. A denied attempt leaves the count untouched.
    pub fn allow(&self, client_id: &str, tier: AccountTier) -> bool {
        self.allow_at(client_id, tier, Instant::now())
    }

    /// Clock-injectable core of [`Self::allow`].
    fn allow_at(&self, client_id: &str, tier: AccountTier, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        let usage = windows
            .entry(client_id.to_owned())
            .or_insert(WindowUsage {
                opened: now,
                tier,
                count: 0,
            });

        if now.duration_since(usage.opened) >= WINDOW {
            *usage = WindowUsage {
                opened: now,
                tier,
                count: 0,
            };
        }

        if !usage.tier.is_unmetered() && usage.count >= FREE_TIER_BUDGET {
            return false;
        }
        usage.count += 1;
        true
    }

    /// Submissions counted for `client_id` in its current window, or 0 if
    /// the client has never submitted.
    pub fn usage(&self, client_id: &str) -> u32 {
        self.windows.lock().get(client_id).map_or(0, |w| w.count)
    }

    /// Number of clients with a tracked window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
