//! # sentinel-store
//!
//! `SQLite`-backed persistence for the Sentinel log-ingestion gateway.
//!
//! Provides:
//!
//! - **Connection pooling**: [`connection`] builds `r2d2` pools with WAL
//!   mode, foreign keys, and busy-timeout pragmas applied per connection
//! - **Migrations**: [`migrations`] embeds versioned schema SQL and applies
//!   it idempotently
//! - **Repositories**: [`repositories`] holds stateless row-level access to
//!   the `users`, `projects`, and `logs` tables
//! - **Credential checks**: [`credentials::CredentialStore`] is the trait the
//!   server authenticates against; [`credentials::SqliteCredentialStore`]
//!   backs it with the pool
//! - **Retention**: [`retention`] runs the periodic free-tier log purge
//!
//! ## Crate Position
//!
//! Sits between `sentinel-core` (types) and `sentinel-server` (transport).
//! The server never touches SQL directly.

#![deny(unsafe_code)]

pub mod connection;
pub mod credentials;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod retention;
pub mod row_types;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use credentials::{CredentialStore, SqliteCredentialStore};
pub use errors::{Result, StoreError};
