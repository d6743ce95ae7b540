//! Live-session registry with idle eviction.
//!
//! Every authenticated session is registered here under a freshly minted
//! [`SessionId`]. Activity on the session touches its entry; a background
//! sweeper evicts entries that have been idle too long so the map cannot
//! grow without bound when clients vanish without closing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use parking_lot::Mutex;
use sentinel_core::ids::SessionId;
use sentinel_core::protocol::AccountTier;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::SESSIONS_SWEPT_TOTAL;

/// How often the sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Idle time after which a session is considered abandoned.
pub const STALE_AFTER: Duration = Duration::from_secs(30 * 60);

/// One registered session.
#[derive(Clone, Debug)]
struct Entry {
    client_id: String,
    project_id: String,
    tier: AccountTier,
    connected_at: Instant,
    last_seen: Instant,
    messages: u64,
}

/// Read-only snapshot of a registered session.
#[derive(Clone, Debug)]
pub struct SessionView {
    /// The caller behind the session.
    pub client_id: String,
    /// The project it submits against.
    pub project_id: String,
    /// Account tier resolved at authentication.
    pub tier: AccountTier,
    /// How long the session has been open.
    pub age: Duration,
    /// Time since the session last showed activity.
    pub idle: Duration,
    /// Frames handled on the session so far.
    pub messages: u64,
}

/// Registry of live persistent sessions.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<SessionId, Entry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly authenticated session and mint its ID.
    pub fn register(&self, client_id: &str, project_id: &str, tier: AccountTier) -> SessionId {
        let id = SessionId::new();
        let now = Instant::now();
        let _ = self.sessions.lock().insert(
            id.clone(),
            Entry {
                client_id: client_id.to_owned(),
                project_id: project_id.to_owned(),
                tier,
                connected_at: now,
                last_seen: now,
                messages: 0,
            },
        );
        id
    }

    /// Mark activity on a session, bumping its message count. Returns
    /// `false` if the session is no longer registered (evicted or
    /// deregistered).
    pub fn touch(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                entry.messages += 1;
                true
            }
            None => false,
        }
    }

    /// Remove a session on orderly close or socket drop.
    pub fn deregister(&self, id: &SessionId) -> bool {
        self.sessions.lock().remove(id).is_some()
    }

    /// Snapshot a session, if registered.
    pub fn get(&self, id: &SessionId) -> Option<SessionView> {
        let sessions = self.sessions.lock();
        sessions.get(id).map(|entry| SessionView {
            client_id: entry.client_id.clone(),
            project_id: entry.project_id.clone(),
            tier: entry.tier,
            age: entry.connected_at.elapsed(),
            idle: entry.last_seen.elapsed(),
            messages: entry.messages,
        })
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Evict every session idle for `stale_after` or longer. Returns the
    /// number evicted.
    pub fn sweep_once(&self, stale_after: Duration) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let stale = entry.last_seen.elapsed() >= stale_after;
            if stale {
                debug!(session_id = %id, client_id = %entry.client_id, "evicting idle session");
            }
            !stale
        });
        before - sessions.len()
    }
}

/// Run the idle sweeper until cancelled.
pub async fn run_sweeper(
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    stale_after: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // Skip the immediate first tick; there is nothing to sweep at startup.
    let _ = ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("session sweeper stopping");
                return;
            }
            _ = ticker.tick() => {
                let evicted = registry.sweep_once(stale_after);
                if evicted > 0 {
                    info!(evicted, "swept idle sessions");
                    counter!(SESSIONS_SWEPT_TOTAL).increment(evicted as u64);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
