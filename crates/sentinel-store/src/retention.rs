//! Periodic retention purge for free-tier logs.
//!
//! Free-tier accounts keep logs for a bounded window; a background task
//! deletes anything older on a fixed schedule. Pro-tier logs are kept
//! indefinitely.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::connection::ConnectionPool;
use crate::errors::Result;
use crate::repositories::LogRepo;

/// How often the purge runs.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long free-tier logs are kept.
pub const FREE_TIER_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Run one purge pass: delete free-tier logs older than `max_age`.
pub fn purge_once(pool: &ConnectionPool, max_age: Duration) -> Result<usize> {
    let cutoff = chrono::Utc::now()
        - chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::zero());
    let conn = pool.get()?;
    LogRepo::delete_expired_free_tier(&conn, &cutoff.to_rfc3339())
}

/// Run the retention loop until cancelled.
///
/// The first pass runs immediately, then once per `interval`. A failed pass
/// is logged and the loop continues; transient database errors must not
/// kill retention for the life of the process.
pub async fn run_retention(
    pool: ConnectionPool,
    interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!("retention task stopping");
                return;
            }
            _ = ticker.tick() => {
                match purge_once(&pool, max_age) {
                    Ok(0) => {}
                    Ok(deleted) => info!(deleted, "purged expired free-tier logs"),
                    Err(e) => error!(error = %e, "retention purge failed"),
                }
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
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::migrations::run_migrations;
    use crate::repositories::test_support::seed_account;

    fn seeded_pool() -> ConnectionPool {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            let _ = run_migrations(&conn).unwrap();
            seed_account(&conn, "free_u", "free", "free_p", "k1");
            seed_account(&conn, "pro_u", "pro", "pro_p", "k2");
            let _ = conn
                .execute_batch(
                    "INSERT INTO logs (id, project_id, client_id, category, message, created_at)
                     VALUES ('l1', 'free_p', 'free_u', 'info', 'old', '2020-01-01T00:00:00Z');
                     INSERT INTO logs (id, project_id, client_id, category, message, created_at)
                     VALUES ('l2', 'pro_p', 'pro_u', 'info', 'old', '2020-01-01T00:00:00Z');",
                )
                .unwrap();
        }
        pool
    }

    #[test]
    fn purge_once_deletes_expired_free_tier() {
        let pool = seeded_pool();
        let deleted = purge_once(&pool, FREE_TIER_MAX_AGE).unwrap();
        assert_eq!(deleted, 1);

        let conn = pool.get().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn purge_once_is_idempotent() {
        let pool = seeded_pool();
        assert_eq!(purge_once(&pool, FREE_TIER_MAX_AGE).unwrap(), 1);
        assert_eq!(purge_once(&pool, FREE_TIER_MAX_AGE).unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retention_loop_runs_first_pass_immediately() {
        let pool = seeded_pool();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_retention(
            pool.clone(),
            Duration::from_secs(60),
            FREE_TIER_MAX_AGE,
            cancel.clone(),
        ));

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_millis(10)).await;
        {
            let conn = pool.get().unwrap();
            let remaining: i64 = conn
                .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
                .unwrap();
            assert_eq!(remaining, 1);
        }

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn retention_loop_stops_on_cancel() {
        let pool = seeded_pool();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_retention(
            pool,
            Duration::from_secs(60),
            FREE_TIER_MAX_AGE,
            cancel.clone(),
        ));

        cancel.cancel();
        handle.await.unwrap();
    }
}
