//! Error types for the store subsystem.
//!
//! [`StoreError`] is returned by every store operation. The variants stay
//! coarse enough for exhaustive matching at the server layer, which mostly
//! cares about "not found" versus "the database broke".

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested project was not found.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Requested user was not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Stored tier value was not a recognized tier name.
    #[error("unknown account tier: {0}")]
    UnknownTier(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Whether this error means the row simply does not exist, as opposed
    /// to the database failing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::UserNotFound(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
