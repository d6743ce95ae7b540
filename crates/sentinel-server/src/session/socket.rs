//! WebSocket session lifecycle, from upgrade through disconnect.
//!
//! One task reads the socket and drives the [`SessionController`]; a
//! second drains the outbound channel so there is exactly one writer.
//! The heartbeat pushes into the same channel, which is what makes the
//! single-writer rule hold.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use sentinel_core::protocol::{ClientFrame, ServerFrame};
use sentinel_store::CredentialStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::controller::{Disposition, SessionController};
use super::heartbeat::run_heartbeat;
use super::SessionShared;
use crate::metrics::{SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::ratelimit::RateLimiter;
use crate::registry::ConnectionRegistry;

/// Outbound channel depth before backpressure.
const OUTBOUND_BUFFER: usize = 256;

/// Run one WebSocket session to completion.
///
/// 1. Splits the socket and spawns the single outbound writer
/// 2. Spawns the heartbeat, which beats only while authenticated
/// 3. Feeds decoded frames through the controller until it closes,
///    the client disconnects, or the gateway shuts down
/// 4. Deregisters the session on the way out
pub async fn run_session(
    ws: WebSocket,
    store: Arc<dyn CredentialStore>,
    limiter: Arc<RateLimiter>,
    registry: Arc<ConnectionRegistry>,
    heartbeat_interval: Duration,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerFrame>(OUTBOUND_BUFFER);

    let shared = Arc::new(SessionShared::new());
    let mut controller = SessionController::new(store, limiter, registry, Arc::clone(&shared));

    info!("session connected");
    counter!(SESSIONS_TOTAL).increment(1);
    gauge!(SESSIONS_ACTIVE).increment(1.0);

    // Single writer: everything outbound flows through this task.
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let session_cancel = CancellationToken::new();
    let beat = tokio::spawn(run_heartbeat(
        Arc::clone(&shared),
        out_tx.clone(),
        heartbeat_interval,
        session_cancel.clone(),
    ));

    loop {
        let msg = tokio::select! {
            () = shutdown.cancelled() => {
                info!("gateway shutting down, closing session");
                break;
            }
            msg = ws_rx.next() => msg,
        };

        let Some(Ok(msg)) = msg else {
            break;
        };

        let text = match msg {
            Message::Text(ref t) => t.to_string(),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    warn!(len = data.len(), "dropping non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => {
                debug!("client sent websocket close");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let frame = match serde_json::from_str::<ClientFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                // Malformed frames are dropped; the protocol has no frame
                // to report a frame it could not decode.
                warn!(error = %e, "dropping malformed frame");
                continue;
            }
        };

        let outcome = controller.handle_frame(frame);
        for reply in outcome.replies {
            if out_tx.send(reply).await.is_err() {
                break;
            }
        }
        if outcome.disposition == Disposition::Close {
            break;
        }
    }

    controller.on_disconnect();
    session_cancel.cancel();
    let _ = beat.await;
    drop(out_tx);
    let _ = writer.await;

    gauge!(SESSIONS_ACTIVE).decrement(1.0);
    info!("session disconnected");
}
