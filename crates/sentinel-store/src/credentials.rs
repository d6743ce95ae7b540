//! Credential verification surface for the server.
//!
//! [`CredentialStore`] is the narrow trait the transport layer authenticates
//! and persists through; it exists so session and ingest logic can be tested
//! against an in-memory fake without a database. [`SqliteCredentialStore`]
//! is the production implementation over the `r2d2` pool.

use sentinel_core::protocol::AccountTier;

use crate::connection::ConnectionPool;
use crate::errors::Result;
use crate::repositories::{LogRepo, NewLog, ProjectRepo, UserRepo};
use crate::row_types::{LogRow, ProjectRow};

/// Row-level operations the gateway needs to admit and persist a log.
///
/// Methods are synchronous; `SQLite` calls complete in microseconds under
/// WAL and the pool's busy timeout bounds contention.
pub trait CredentialStore: Send + Sync {
    /// Fetch a project, or `None` if it does not exist.
    fn find_project(&self, project_id: &str) -> Result<Option<ProjectRow>>;

    /// Whether the presented client ID names a user that owns the project.
    fn client_owns_project(&self, client_id: &str, project_id: &str) -> Result<bool>;

    /// The account tier of the user behind a client ID.
    fn account_tier(&self, client_id: &str) -> Result<AccountTier>;

    /// Persist one log record.
    fn insert_log(&self, log: &NewLog<'_>) -> Result<LogRow>;
}

/// Production [`CredentialStore`] backed by the `SQLite` pool.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: ConnectionPool,
}

impl SqliteCredentialStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (for migrations and retention).
    #[must_use]
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn find_project(&self, project_id: &str) -> Result<Option<ProjectRow>> {
        let conn = self.pool.get()?;
        ProjectRepo::get(&conn, project_id)
    }

    fn client_owns_project(&self, client_id: &str, project_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let Some(project) = ProjectRepo::get(&conn, project_id)? else {
            return Ok(false);
        };
        if project.user_id != client_id {
            return Ok(false);
        }
        Ok(UserRepo::get(&conn, client_id)?.is_some())
    }

    fn account_tier(&self, client_id: &str) -> Result<AccountTier> {
        let conn = self.pool.get()?;
        UserRepo::tier(&conn, client_id)
    }

    fn insert_log(&self, log: &NewLog<'_>) -> Result<LogRow> {
        let conn = self.pool.get()?;
        LogRepo::insert(&conn, log)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::errors::StoreError;
    use crate::migrations::run_migrations;
    use crate::repositories::test_support::seed_account;

    fn store() -> SqliteCredentialStore {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            let _ = run_migrations(&conn).unwrap();
            seed_account(&conn, "u1", "free", "p1", "secret");
            seed_account(&conn, "u2", "pro", "p2", "other");
        }
        SqliteCredentialStore::new(pool)
    }

    #[test]
    fn find_project_present_and_absent() {
        let store = store();
        let project = store.find_project("p1").unwrap().unwrap();
        assert_eq!(project.api_key, "secret");
        assert!(store.find_project("ghost").unwrap().is_none());
    }

    #[test]
    fn ownership_checks() {
        let store = store();
        assert!(store.client_owns_project("u1", "p1").unwrap());
        assert!(!store.client_owns_project("u2", "p1").unwrap());
        assert!(!store.client_owns_project("u1", "ghost").unwrap());
        assert!(!store.client_owns_project("ghost", "p1").unwrap());
    }

    #[test]
    fn tier_lookup() {
        let store = store();
        assert_eq!(store.account_tier("u1").unwrap(), AccountTier::Free);
        assert_eq!(store.account_tier("u2").unwrap(), AccountTier::Pro);
        assert!(matches!(
            store.account_tier("ghost").unwrap_err(),
            StoreError::UserNotFound(_)
        ));
    }

    #[test]
    fn insert_log_persists() {
        let store = store();
        let row = store
            .insert_log(&NewLog {
                project_id: "p1",
                client_id: "u1",
                category: "info",
                message: "hello",
            })
            .unwrap();
        assert_eq!(row.project_id, "p1");

        let conn = store.pool().get().unwrap();
        assert_eq!(LogRepo::count_for_project(&conn, "p1").unwrap(), 1);
    }
}
