//! Streamed batch ingest.
//!
//! The request body is newline-delimited JSON, one record per line. The
//! first record's credentials govern the whole call; later records must
//! repeat them exactly. Any failure aborts the stream, but records already
//! persisted are not rolled back. The abort reply carries how many made
//! it in.

use axum::http::StatusCode;
use futures::{Stream, StreamExt};
use metrics::counter;
use sentinel_core::protocol::{AccountTier, BatchRecord, BatchResponse};
use sentinel_store::CredentialStore;
use sentinel_store::repositories::NewLog;
use tracing::warn;

use crate::auth::{self, AuthFailure, Credentials};
use crate::metrics::{BATCHES_TOTAL, LOGS_INGESTED_TOTAL, RATE_LIMIT_DENIALS_TOTAL};
use crate::ratelimit::RateLimiter;

/// Why a batch call aborted. `persisted` is always the number of records
/// committed before the failure.
#[derive(Debug)]
pub enum BatchAbort {
    /// Credential checks on the first record failed.
    Auth {
        /// The specific failure.
        failure: AuthFailure,
        /// Records persisted before the abort (always 0 here).
        persisted: u64,
    },
    /// A later record presented different credentials.
    CredentialMismatch {
        /// Records persisted before the abort.
        persisted: u64,
    },
    /// A line was not valid JSON for a record.
    Malformed {
        /// Records persisted before the abort.
        persisted: u64,
    },
    /// The caller ran out of budget mid-stream.
    RateLimited {
        /// Records persisted before the abort.
        persisted: u64,
    },
    /// The store failed mid-stream.
    Database {
        /// Records persisted before the abort.
        persisted: u64,
    },
    /// The request body stream itself failed.
    Stream {
        /// Records persisted before the abort.
        persisted: u64,
    },
}

impl BatchAbort {
    /// HTTP status for the abort reply.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth {
                failure: AuthFailure::Database,
                ..
            }
            | Self::Database { .. }
            | Self::Stream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::CredentialMismatch { .. } | Self::Malformed { .. } => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message for the abort reply.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Auth { failure, .. } => failure.message().into(),
            Self::CredentialMismatch { .. } => "Credential mismatch in batch".into(),
            Self::Malformed { .. } => "Malformed batch record".into(),
            Self::RateLimited { .. } => "Rate limit exceeded".into(),
            Self::Database { .. } => "Failed to save log".into(),
            Self::Stream { .. } => "Request stream failed".into(),
        }
    }

    /// Records persisted before the abort.
    #[must_use]
    pub fn persisted(&self) -> u64 {
        match self {
            Self::Auth { persisted, .. }
            | Self::CredentialMismatch { persisted }
            | Self::Malformed { persisted }
            | Self::RateLimited { persisted }
            | Self::Database { persisted }
            | Self::Stream { persisted } => *persisted,
        }
    }

    /// The abort reply body.
    #[must_use]
    pub fn response(&self) -> BatchResponse {
        BatchResponse {
            success: false,
            message: self.message(),
            count: self.persisted(),
        }
    }
}

fn record_creds(record: &BatchRecord) -> Credentials {
    Credentials {
        client_id: record.client_id.as_str().to_owned(),
        project_id: record.project_id.as_str().to_owned(),
        api_key: record.api_key.clone(),
    }
}

/// Drain a stream of NDJSON lines, persisting each record.
///
/// Blank lines are skipped. The first record is authenticated once and
/// its tier governs rate limiting for the whole call.
pub async fn run_batch<S, L>(
    store: &S,
    limiter: &RateLimiter,
    mut lines: L,
) -> Result<BatchResponse, BatchAbort>
where
    S: CredentialStore + ?Sized,
    L: Stream<Item = std::io::Result<String>> + Unpin,
{
    let mut persisted: u64 = 0;
    let mut session: Option<(Credentials, AccountTier)> = None;

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "batch body stream failed");
                counter!(BATCHES_TOTAL, "outcome" => "stream_error").increment(1);
                return Err(BatchAbort::Stream { persisted });
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<BatchRecord>(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "malformed batch record");
                counter!(BATCHES_TOTAL, "outcome" => "malformed").increment(1);
                return Err(BatchAbort::Malformed { persisted });
            }
        };
        let creds = record_creds(&record);

        let tier = match &session {
            None => {
                let tier = auth::authenticate(store, &creds).map_err(|failure| {
                    counter!(BATCHES_TOTAL, "outcome" => "auth_failed").increment(1);
                    BatchAbort::Auth { failure, persisted }
                })?;
                session = Some((creds.clone(), tier));
                tier
            }
            Some((first, tier)) => {
                if creds != *first {
                    counter!(BATCHES_TOTAL, "outcome" => "mismatch").increment(1);
                    return Err(BatchAbort::CredentialMismatch { persisted });
                }
                *tier
            }
        };

        if !limiter.allow(&creds.client_id, tier) {
            counter!(RATE_LIMIT_DENIALS_TOTAL).increment(1);
            counter!(BATCHES_TOTAL, "outcome" => "rate_limited").increment(1);
            return Err(BatchAbort::RateLimited { persisted });
        }

        let log = NewLog {
            project_id: &creds.project_id,
            client_id: &creds.client_id,
            category: &record.category,
            message: &record.message,
        };
        if let Err(e) = store.insert_log(&log) {
            warn!(error = %e, "batch insert failed");
            counter!(BATCHES_TOTAL, "outcome" => "database").increment(1);
            return Err(BatchAbort::Database { persisted });
        }
        counter!(LOGS_INGESTED_TOTAL, "path" => "batch").increment(1);
        persisted += 1;
    }

    counter!(BATCHES_TOTAL, "outcome" => "ok").increment(1);
    Ok(BatchResponse {
        success: true,
        message: "Batch processed successfully".into(),
        count: persisted,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
