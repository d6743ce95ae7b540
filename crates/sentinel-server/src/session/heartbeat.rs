//! Unsolicited server heartbeats.
//!
//! While a session is authenticated the gateway pushes a `pong` frame on a
//! fixed interval so clients can detect a dead connection without asking.
//! Unauthenticated sessions get nothing; the interval keeps ticking and
//! the beat starts on the first tick after authentication.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::protocol::ServerFrame;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::SessionShared;

/// Interval between unsolicited heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Push heartbeat frames into the session's outbound channel until the
/// session is cancelled or the channel closes.
pub async fn run_heartbeat(
    shared: Arc<SessionShared>,
    outbound: mpsc::Sender<ServerFrame>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // Skip the immediate first tick so the first beat lands one full
    // interval after connect.
    let _ = ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("heartbeat stopping");
                return;
            }
            _ = ticker.tick() => {
                if !shared.is_authenticated() {
                    continue;
                }
                if outbound.send(ServerFrame::pong_now()).await.is_err() {
                    // Writer gone; the session is tearing down.
                    return;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
