//! Database row types for mapping between `SQLite` rows and Rust structs.
//!
//! These represent the raw database row shape, not the public API types.
//! Conversion to protocol types (e.g. [`sentinel_core::protocol::AccountTier`])
//! happens in the repository layer.

use serde::{Deserialize, Serialize};

/// Raw user row from the `users` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRow {
    /// User ID. Callers present this as their `client_id`.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Account tier, `free` or `pro`.
    pub account_tier: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Raw project row from the `projects` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRow {
    /// Project ID.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Secret credential callers must present.
    pub api_key: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Raw log row from the `logs` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRow {
    /// Log ID (UUID v7, time-ordered).
    pub id: String,
    /// Project the record belongs to.
    pub project_id: String,
    /// Caller that submitted it.
    pub client_id: String,
    /// Free-form category label.
    pub category: String,
    /// Log body.
    pub message: String,
    /// Ingest timestamp (RFC 3339).
    pub created_at: String,
}
