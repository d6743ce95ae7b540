//! Wire protocol for the Sentinel gateway.
//!
//! Defines the JSON message vocabulary shared by every ingress path:
//!
//! - [`ClientFrame`] / [`ServerFrame`]: tagged frames exchanged over the
//!   persistent bidirectional session
//! - [`LogSubmission`] / [`IngestResponse`]: single-shot HTTP ingest bodies
//! - [`BatchRecord`] / [`BatchResponse`]: streamed batch ingest records
//! - [`AccountTier`]: the two billing tiers the rate limiter distinguishes
//!
//! All frames use a `type` tag in snake_case, so an auth frame serializes as
//! `{"type":"auth","api_key":...}`. Unknown frame types are rejected; extra
//! fields on a known frame are ignored, as are absent credential fields
//! (they deserialize to empty strings and fail validation downstream).

use crate::ids::{ClientId, ProjectId, SessionId};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────
// Account tiers
// ─────────────────────────────────────────────────────────────────────────

/// Billing tier of the account that owns a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountTier {
    /// Budget-capped tier.
    Free,
    /// Unmetered tier; usage is still counted.
    Pro,
}

impl AccountTier {
    /// Whether this tier is exempt from the submission budget.
    #[must_use]
    pub fn is_unmetered(self) -> bool {
        matches!(self, Self::Pro)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Session frames
// ─────────────────────────────────────────────────────────────────────────

/// Frames a client sends over the persistent session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Handshake carrying the caller's credentials. Must be the first frame.
    Auth {
        /// Secret credential for the project.
        #[serde(default)]
        api_key: String,
        /// Caller's own identifier.
        #[serde(default)]
        client_id: String,
        /// Target project.
        #[serde(default)]
        project_id: String,
    },
    /// A log record; only valid after authentication.
    Log {
        /// Free-form category label.
        category: String,
        /// Log body.
        message: String,
    },
    /// Liveness probe; valid in any state.
    Ping,
    /// Orderly shutdown request.
    Close {
        /// Optional reason, echoed into the gateway's logs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Error codes carried in-band on [`ServerFrame::Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A log frame arrived before authentication completed.
    Unauthenticated,
    /// The caller exhausted its submission budget for the window.
    RateLimitExceeded,
    /// The store rejected the write.
    DatabaseError,
}

/// Frames the gateway sends over the persistent session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Reply to [`ClientFrame::Auth`].
    AuthResponse {
        /// Whether authentication succeeded.
        success: bool,
        /// Session identifier, present only on success.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Human-readable outcome.
        message: String,
    },
    /// Per-record acknowledgement for [`ClientFrame::Log`].
    LogResponse {
        /// Whether the record was persisted.
        success: bool,
        /// Human-readable outcome.
        message: String,
    },
    /// Non-fatal in-band error.
    Error {
        /// Machine-readable code.
        code: ErrorCode,
        /// Human-readable detail.
        message: String,
    },
    /// Reply to [`ClientFrame::Ping`], and the unsolicited heartbeat.
    Pong {
        /// Gateway clock at send time, nanoseconds since the Unix epoch.
        timestamp: i64,
    },
}

impl ServerFrame {
    /// Pong stamped with the current gateway clock.
    #[must_use]
    pub fn pong_now() -> Self {
        Self::Pong {
            timestamp: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// HTTP ingest bodies
// ─────────────────────────────────────────────────────────────────────────

/// Single-shot ingest request body. Credentials travel with every record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSubmission {
    /// Target project.
    #[serde(default)]
    pub project_id: ProjectId,
    /// Caller's identifier; the rate-limiter key.
    #[serde(default)]
    pub client_id: ClientId,
    /// Secret credential for the project.
    #[serde(default)]
    pub api_key: String,
    /// Free-form category label.
    #[serde(default)]
    pub category: String,
    /// Log body.
    #[serde(default)]
    pub message: String,
}

/// Single-shot ingest response. The transport status is always success; the
/// outcome lives in the body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Whether the record was persisted.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// One record in a streamed batch. Identical shape to [`LogSubmission`];
/// credentials on every record must match the first.
pub type BatchRecord = LogSubmission;

/// Summary reply after a batch stream is drained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Whether the whole stream was accepted.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Number of records persisted.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_frame_tag() {
        let frame = ClientFrame::Auth {
            api_key: "k".into(),
            client_id: "c".into(),
            project_id: "p".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "auth");
        assert_eq!(json["api_key"], "k");
    }

    #[test]
    fn auth_frame_missing_fields_default_empty() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"auth"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Auth {
                api_key: String::new(),
                client_id: String::new(),
                project_id: String::new(),
            }
        );
    }

    #[test]
    fn ping_frame_roundtrip() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(frame, ClientFrame::Ping);
        assert_eq!(serde_json::to_string(&frame).unwrap(), r#"{"type":"ping"}"#);
    }

    #[test]
    fn close_reason_optional() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"close"}"#).unwrap();
        assert_eq!(frame, ClientFrame::Close { reason: None });

        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"close","reason":"done"}"#).unwrap();
        assert_eq!(
            frame,
            ClientFrame::Close {
                reason: Some("done".into())
            }
        );
    }

    #[test]
    fn unknown_frame_type_rejected() {
        let result = serde_json::from_str::<ClientFrame>(r#"{"type":"subscribe"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn extra_fields_ignored() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"ping","extra":1}"#).unwrap();
        assert_eq!(frame, ClientFrame::Ping);
    }

    #[test]
    fn error_codes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::RateLimitExceeded).unwrap(),
            r#""rate_limit_exceeded""#
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::Unauthenticated).unwrap(),
            r#""unauthenticated""#
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::DatabaseError).unwrap(),
            r#""database_error""#
        );
    }

    #[test]
    fn auth_response_omits_absent_session_id() {
        let frame = ServerFrame::AuthResponse {
            success: false,
            session_id: None,
            message: "Invalid API key".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert!(json.get("session_id").is_none());
        assert_eq!(json["success"], false);
    }

    #[test]
    fn auth_response_carries_session_id_on_success() {
        let frame = ServerFrame::AuthResponse {
            success: true,
            session_id: Some(SessionId::from("s1")),
            message: "Authentication successful".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["session_id"], "s1");
    }

    #[test]
    fn pong_now_is_nanos() {
        let ServerFrame::Pong { timestamp } = ServerFrame::pong_now() else {
            panic!("expected pong");
        };
        // Nanosecond timestamps for any recent date exceed 1e18.
        assert!(timestamp > 1_000_000_000_000_000_000);
    }

    #[test]
    fn tier_metering() {
        assert!(!AccountTier::Free.is_unmetered());
        assert!(AccountTier::Pro.is_unmetered());
    }

    #[test]
    fn tier_serde_lowercase() {
        assert_eq!(serde_json::to_string(&AccountTier::Free).unwrap(), r#""free""#);
        let tier: AccountTier = serde_json::from_str(r#""pro""#).unwrap();
        assert_eq!(tier, AccountTier::Pro);
    }

    #[test]
    fn submission_defaults_empty() {
        let sub: LogSubmission = serde_json::from_str("{}").unwrap();
        assert_eq!(sub.api_key, "");
        assert_eq!(sub.project_id.as_str(), "");
    }

    #[test]
    fn batch_response_shape() {
        let resp = BatchResponse {
            success: true,
            message: "Batch processed successfully".into(),
            count: 3,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["count"], 3);
    }
}
