//! Log repository. Append-heavy; reads exist for tooling and tests, and
//! the retention purge deletes in bulk by age and tier.

use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::row_types::LogRow;

/// A log record ready for insertion.
#[derive(Clone, Debug)]
pub struct NewLog<'a> {
    /// Project the record belongs to.
    pub project_id: &'a str,
    /// Caller that submitted it.
    pub client_id: &'a str,
    /// Free-form category label.
    pub category: &'a str,
    /// Log body.
    pub message: &'a str,
}

/// Log repository, stateless, every method takes `&Connection`.
pub struct LogRepo;

impl LogRepo {
    /// Insert a log record, minting its ID and timestamp.
    pub fn insert(conn: &Connection, log: &NewLog<'_>) -> Result<LogRow> {
        let id = format!("log_{}", Uuid::now_v7());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO logs (id, project_id, client_id, category, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, log.project_id, log.client_id, log.category, log.message, now],
        )?;
        Ok(LogRow {
            id,
            project_id: log.project_id.to_owned(),
            client_id: log.client_id.to_owned(),
            category: log.category.to_owned(),
            message: log.message.to_owned(),
            created_at: now,
        })
    }

    /// Number of logs stored for a project.
    pub fn count_for_project(conn: &Connection, project_id: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM logs WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete logs older than `cutoff` (RFC 3339) that belong to projects
    /// owned by free-tier users. Returns the number of rows removed.
    ///
    /// Pro-tier logs are never purged.
    pub fn delete_expired_free_tier(conn: &Connection, cutoff: &str) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM logs
             WHERE created_at < ?1
               AND project_id IN (
                     SELECT p.id FROM projects p
                     JOIN users u ON u.id = p.user_id
                     WHERE u.account_tier = 'free'
                   )",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
