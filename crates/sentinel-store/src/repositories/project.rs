//! Project repository. A project is the unit logs are submitted against;
//! each belongs to exactly one user and carries the API key callers must
//! present.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::row_types::ProjectRow;

/// Project repository, stateless, every method takes `&Connection`.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project.
    pub fn create(
        conn: &Connection,
        id: &str,
        user_id: &str,
        api_key: &str,
        name: Option<&str>,
    ) -> Result<ProjectRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO projects (id, user_id, api_key, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user_id, api_key, name, now],
        )?;
        Ok(ProjectRow {
            id: id.to_owned(),
            user_id: user_id.to_owned(),
            api_key: api_key.to_owned(),
            name: name.map(str::to_owned),
            created_at: now,
        })
    }

    /// Fetch a project by ID, or `None` if absent.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<ProjectRow>> {
        let row = conn
            .query_row(
                "SELECT id, user_id, api_key, name, created_at FROM projects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProjectRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        api_key: row.get(2)?,
                        name: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Whether a project with this ID exists.
    pub fn exists(conn: &Connection, id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{migrated_conn, seed_account};

    #[test]
    fn create_and_get() {
        let conn = migrated_conn();
        seed_account(&conn, "u1", "free", "p0", "k0");

        let created = ProjectRepo::create(&conn, "p1", "u1", "secret", Some("api")).unwrap();
        assert_eq!(created.user_id, "u1");

        let fetched = ProjectRepo::get(&conn, "p1").unwrap().unwrap();
        assert_eq!(fetched.api_key, "secret");
        assert_eq!(fetched.name.as_deref(), Some("api"));
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = migrated_conn();
        assert!(ProjectRepo::get(&conn, "ghost").unwrap().is_none());
    }

    #[test]
    fn exists() {
        let conn = migrated_conn();
        seed_account(&conn, "u1", "free", "p1", "k1");
        assert!(ProjectRepo::exists(&conn, "p1").unwrap());
        assert!(!ProjectRepo::exists(&conn, "p2").unwrap());
    }

    #[test]
    fn create_requires_existing_user() {
        let conn = migrated_conn();
        let result = ProjectRepo::create(&conn, "p1", "nobody", "k", None);
        assert!(result.is_err());
    }
}
