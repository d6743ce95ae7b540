//! Persistent bidirectional sessions.
//!
//! A session is one WebSocket connection moving through a three-state
//! machine: it starts unauthenticated, becomes authenticated after a valid
//! handshake frame, and closes on client request, fatal error, or socket
//! drop.
//!
//! - [`controller`]: the state machine, pure frame-in/frames-out logic
//! - [`heartbeat`]: unsolicited server pongs while authenticated
//! - [`socket`]: the async pump tying the controller to a real socket

pub mod controller;
pub mod heartbeat;
pub mod socket;

use std::sync::atomic::{AtomicBool, Ordering};

pub use controller::{Disposition, FrameOutcome, SessionController, SessionState};
pub use socket::run_session;

/// State the heartbeat task observes without holding the controller.
#[derive(Default)]
pub struct SessionShared {
    authenticated: AtomicBool,
}

impl SessionShared {
    /// Create shared state for a new session (unauthenticated).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session authenticated or not.
    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::Release);
    }

    /// Whether the session is currently authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }
}
