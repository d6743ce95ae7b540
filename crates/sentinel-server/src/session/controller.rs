//! Session state machine.
//!
//! [`SessionController`] consumes decoded client frames and produces the
//! frames to send back plus a disposition (keep the session or close it).
//! It owns no I/O, so the whole protocol is testable without a socket.
//!
//! Protocol rules:
//!
//! - The first meaningful frame must be `auth`. A handshake with missing
//!   fields or bad credentials is answered and then the session closes.
//! - `log` before authentication draws an in-band `unauthenticated` error
//!   and the session stays open so the client can still authenticate.
//! - After authentication, rate-limit denials and store failures are
//!   reported in-band; the session survives both.
//! - `ping` is answered with `pong` in any state.

use std::sync::Arc;

use metrics::counter;
use sentinel_core::ids::SessionId;
use sentinel_core::protocol::{AccountTier, ClientFrame, ErrorCode, ServerFrame};
use sentinel_store::CredentialStore;
use sentinel_store::repositories::NewLog;
use tracing::{debug, info, warn};

use super::SessionShared;
use crate::auth::{self, Credentials};
use crate::metrics::{LOGS_INGESTED_TOTAL, LOGS_REJECTED_TOTAL, RATE_LIMIT_DENIALS_TOTAL};
use crate::ratelimit::RateLimiter;
use crate::registry::ConnectionRegistry;

/// Where a session is in its lifecycle.
#[derive(Clone, Debug)]
pub enum SessionState {
    /// Connected, handshake not yet completed.
    Unauthenticated,
    /// Handshake accepted; logs are admitted.
    Authenticated {
        /// Registry handle for this session.
        session_id: SessionId,
        /// Credentials presented at handshake.
        creds: Credentials,
        /// Tier resolved at handshake.
        tier: AccountTier,
    },
    /// Terminal. No further frames are processed.
    Closed,
}

/// Whether the session continues after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Keep reading frames.
    Continue,
    /// Stop the session after flushing replies.
    Close,
}

/// Result of feeding one frame to the controller.
#[derive(Debug)]
pub struct FrameOutcome {
    /// Frames to send, in order.
    pub replies: Vec<ServerFrame>,
    /// Whether the session survives the frame.
    pub disposition: Disposition,
}

impl FrameOutcome {
    fn reply(frame: ServerFrame) -> Self {
        Self {
            replies: vec![frame],
            disposition: Disposition::Continue,
        }
    }

    fn closing(frame: ServerFrame) -> Self {
        Self {
            replies: vec![frame],
            disposition: Disposition::Close,
        }
    }

    fn silent_close() -> Self {
        Self {
            replies: Vec::new(),
            disposition: Disposition::Close,
        }
    }
}

/// State machine for one persistent session.
pub struct SessionController {
    store: Arc<dyn CredentialStore>,
    limiter: Arc<RateLimiter>,
    registry: Arc<ConnectionRegistry>,
    shared: Arc<SessionShared>,
    state: SessionState,
}

impl SessionController {
    /// Create a controller for a freshly accepted connection.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        limiter: Arc<RateLimiter>,
        registry: Arc<ConnectionRegistry>,
        shared: Arc<SessionShared>,
    ) -> Self {
        Self {
            store,
            limiter,
            registry,
            shared,
            state: SessionState::Unauthenticated,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Session ID, once authenticated.
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.state {
            SessionState::Authenticated { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    /// Feed one decoded frame through the state machine.
    pub fn handle_frame(&mut self, frame: ClientFrame) -> FrameOutcome {
        if matches!(self.state, SessionState::Closed) {
            return FrameOutcome::silent_close();
        }

        // Any inbound frame is activity for idle accounting, pings included.
        if let SessionState::Authenticated { session_id, .. } = &self.state {
            if !self.registry.touch(session_id) {
                // Evicted by the idle sweeper; the session itself stays usable.
                debug!(session_id = %session_id, "activity on swept session");
            }
        }

        match frame {
            ClientFrame::Ping => FrameOutcome::reply(ServerFrame::pong_now()),
            ClientFrame::Auth {
                api_key,
                client_id,
                project_id,
            } => self.handle_auth(Credentials {
                client_id,
                project_id,
                api_key,
            }),
            ClientFrame::Log { category, message } => self.handle_log(&category, &message),
            ClientFrame::Close { reason } => {
                info!(reason = reason.as_deref().unwrap_or(""), "client closed session");
                self.teardown();
                FrameOutcome::silent_close()
            }
        }
    }

    /// Clean up registry state when the socket drops without a close frame.
    pub fn on_disconnect(&mut self) {
        self.teardown();
    }

    fn handle_auth(&mut self, creds: Credentials) -> FrameOutcome {
        if matches!(self.state, SessionState::Authenticated { .. }) {
            return FrameOutcome::reply(ServerFrame::AuthResponse {
                success: false,
                session_id: None,
                message: "Session already authenticated".into(),
            });
        }

        let missing = creds.missing_fields();
        if !missing.is_empty() {
            counter!(LOGS_REJECTED_TOTAL, "reason" => "missing_fields").increment(1);
            return FrameOutcome::closing(ServerFrame::AuthResponse {
                success: false,
                session_id: None,
                message: format!("Missing required fields: {}", missing.join(", ")),
            });
        }

        match auth::authenticate(self.store.as_ref(), &creds) {
            Ok(tier) => {
                let session_id =
                    self.registry
                        .register(&creds.client_id, &creds.project_id, tier);
                debug!(session_id = %session_id, client_id = %creds.client_id, "session authenticated");
                self.shared.set_authenticated(true);
                let reply = ServerFrame::AuthResponse {
                    success: true,
                    session_id: Some(session_id.clone()),
                    message: "Authentication successful".into(),
                };
                self.state = SessionState::Authenticated {
                    session_id,
                    creds,
                    tier,
                };
                FrameOutcome::reply(reply)
            }
            Err(failure) => {
                counter!(LOGS_REJECTED_TOTAL, "reason" => "auth_failed").increment(1);
                FrameOutcome::closing(ServerFrame::AuthResponse {
                    success: false,
                    session_id: None,
                    message: failure.message().into(),
                })
            }
        }
    }

    fn handle_log(&mut self, category: &str, message: &str) -> FrameOutcome {
        let SessionState::Authenticated { creds, tier, .. } = &self.state else {
            counter!(LOGS_REJECTED_TOTAL, "reason" => "unauthenticated").increment(1);
            return FrameOutcome::reply(ServerFrame::Error {
                code: ErrorCode::Unauthenticated,
                message: "Authenticate before submitting logs".into(),
            });
        };

        if !self.limiter.allow(&creds.client_id, *tier) {
            counter!(RATE_LIMIT_DENIALS_TOTAL).increment(1);
            return FrameOutcome::reply(ServerFrame::Error {
                code: ErrorCode::RateLimitExceeded,
                message: "Rate limit exceeded".into(),
            });
        }

        let log = NewLog {
            project_id: &creds.project_id,
            client_id: &creds.client_id,
            category,
            message,
        };
        match self.store.insert_log(&log) {
            Ok(_) => {
                counter!(LOGS_INGESTED_TOTAL, "path" => "session").increment(1);
                FrameOutcome::reply(ServerFrame::LogResponse {
                    success: true,
                    message: "Log saved successfully".into(),
                })
            }
            Err(e) => {
                warn!(error = %e, "session log insert failed");
                counter!(LOGS_REJECTED_TOTAL, "reason" => "database").increment(1);
                FrameOutcome::reply(ServerFrame::Error {
                    code: ErrorCode::DatabaseError,
                    message: "Failed to save log".into(),
                })
            }
        }
    }

    fn teardown(&mut self) {
        if let SessionState::Authenticated { session_id, .. } = &self.state {
            let _ = self.registry.deregister(session_id);
        }
        self.shared.set_authenticated(false);
        self.state = SessionState::Closed;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
