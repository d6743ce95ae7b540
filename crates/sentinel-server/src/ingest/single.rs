//! Single-shot ingest.
//!
//! Stateless fallback for callers that do not hold a session open. Every
//! request carries full credentials and runs the same admission sequence
//! as the session path: credential checks, rate limit, insert. The
//! outcome is always a boolean plus message; the HTTP status never
//! varies, so clients branch on the body alone.

use metrics::counter;
use sentinel_core::protocol::{IngestResponse, LogSubmission};
use sentinel_store::CredentialStore;
use sentinel_store::repositories::NewLog;
use tracing::warn;

use crate::auth::{self, Credentials};
use crate::metrics::{LOGS_INGESTED_TOTAL, LOGS_REJECTED_TOTAL, RATE_LIMIT_DENIALS_TOTAL};
use crate::ratelimit::RateLimiter;

/// Admit and persist one record, folding every outcome into the response
/// body.
pub fn process<S: CredentialStore + ?Sized>(
    store: &S,
    limiter: &RateLimiter,
    submission: &LogSubmission,
) -> IngestResponse {
    let creds = Credentials {
        client_id: submission.client_id.as_str().to_owned(),
        project_id: submission.project_id.as_str().to_owned(),
        api_key: submission.api_key.clone(),
    };

    let tier = match auth::authenticate(store, &creds) {
        Ok(tier) => tier,
        Err(failure) => {
            counter!(LOGS_REJECTED_TOTAL, "reason" => "auth_failed").increment(1);
            return IngestResponse {
                success: false,
                message: failure.message().into(),
            };
        }
    };

    if !limiter.allow(&creds.client_id, tier) {
        counter!(RATE_LIMIT_DENIALS_TOTAL).increment(1);
        return IngestResponse {
            success: false,
            message: "Rate limit exceeded".into(),
        };
    }

    let log = NewLog {
        project_id: &creds.project_id,
        client_id: &creds.client_id,
        category: &submission.category,
        message: &submission.message,
    };
    match store.insert_log(&log) {
        Ok(_) => {
            counter!(LOGS_INGESTED_TOTAL, "path" => "single").increment(1);
            IngestResponse {
                success: true,
                message: "Log saved successfully".into(),
            }
        }
        Err(e) => {
            warn!(error = %e, "single-shot insert failed");
            counter!(LOGS_REJECTED_TOTAL, "reason" => "database").increment(1);
            IngestResponse {
                success: false,
                message: "Failed to save log".into(),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::FakeStore;
    use crate::ratelimit::FREE_TIER_BUDGET;
    use sentinel_core::protocol::AccountTier;

    fn submission(client: &str, project: &str, key: &str) -> LogSubmission {
        LogSubmission {
            project_id: project.into(),
            client_id: client.into(),
            api_key: key.into(),
            category: "info".into(),
            message: "hello".into(),
        }
    }

    #[test]
    fn valid_submission_is_saved() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("u1", "p1", "secret"));
        assert!(resp.success);
        assert_eq!(resp.message, "Log saved successfully");
        assert_eq!(store.inserted_count(), 1);
    }

    #[test]
    fn unknown_project() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("u1", "ghost", "secret"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Project not found");
        assert_eq!(store.inserted_count(), 0);
    }

    #[test]
    fn wrong_api_key() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("u1", "p1", "wrong"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Invalid API key");
    }

    #[test]
    fn non_owner_client() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("intruder", "p1", "secret"));
        assert!(!resp.success);
        assert_eq!(
            resp.message,
            "Invalid client ID or user doesn't own this project"
        );
    }

    #[test]
    fn database_failure_during_checks() {
        let store = FakeStore {
            fail_find: true,
            ..FakeStore::with_free_account()
        };
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("u1", "p1", "secret"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Database error when checking project");
    }

    #[test]
    fn rate_limit_denial() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        for _ in 0..FREE_TIER_BUDGET {
            let resp = process(&store, &limiter, &submission("u1", "p1", "secret"));
            assert!(resp.success);
        }
        let resp = process(&store, &limiter, &submission("u1", "p1", "secret"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Rate limit exceeded");
        assert_eq!(store.inserted_count(), FREE_TIER_BUDGET as usize);
    }

    #[test]
    fn pro_tier_not_rate_limited() {
        let store = FakeStore::with_account("u2", "p2", "key", AccountTier::Pro);
        let limiter = RateLimiter::new();
        for _ in 0..FREE_TIER_BUDGET * 2 {
            let resp = process(&store, &limiter, &submission("u2", "p2", "key"));
            assert!(resp.success);
        }
    }

    #[test]
    fn insert_failure() {
        let store = FakeStore {
            fail_insert: true,
            ..FakeStore::with_free_account()
        };
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("u1", "p1", "secret"));
        assert!(!resp.success);
        assert_eq!(resp.message, "Failed to save log");
    }

    #[test]
    fn empty_credentials_read_as_unknown_project() {
        let store = FakeStore::with_free_account();
        let limiter = RateLimiter::new();
        let resp = process(&store, &limiter, &submission("", "", ""));
        assert!(!resp.success);
        assert_eq!(resp.message, "Project not found");
    }
}
