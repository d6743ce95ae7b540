//! User repository. Users are the accounts that own projects; callers
//! present a user ID as their `client_id`.

use rusqlite::{Connection, OptionalExtension, params};
use sentinel_core::protocol::AccountTier;

use crate::errors::{Result, StoreError};
use crate::row_types::UserRow;

/// User repository, stateless, every method takes `&Connection`.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user.
    pub fn create(conn: &Connection, id: &str, username: &str, tier: AccountTier) -> Result<UserRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let tier_str = tier_to_str(tier);
        let _ = conn.execute(
            "INSERT INTO users (id, username, account_tier, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, tier_str, now],
        )?;
        Ok(UserRow {
            id: id.to_owned(),
            username: username.to_owned(),
            account_tier: tier_str.to_owned(),
            created_at: now,
        })
    }

    /// Fetch a user by ID, or `None` if absent.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
        let row = conn
            .query_row(
                "SELECT id, username, account_tier, created_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        account_tier: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Fetch a user's account tier, failing if the user does not exist.
    pub fn tier(conn: &Connection, id: &str) -> Result<AccountTier> {
        let row = Self::get(conn, id)?.ok_or_else(|| StoreError::UserNotFound(id.to_owned()))?;
        tier_from_str(&row.account_tier)
    }
}

fn tier_to_str(tier: AccountTier) -> &'static str {
    match tier {
        AccountTier::Free => "free",
        AccountTier::Pro => "pro",
    }
}

fn tier_from_str(s: &str) -> Result<AccountTier> {
    match s {
        "free" => Ok(AccountTier::Free),
        "pro" => Ok(AccountTier::Pro),
        other => Err(StoreError::UnknownTier(other.to_owned())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
