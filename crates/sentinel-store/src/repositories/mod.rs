//! Repository implementations for `SQLite` database operations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`
//! parameter. This makes every operation a pure function from
//! (connection, input) → output, trivially testable in isolation.

pub mod log;
pub mod project;
pub mod user;

pub use log::{LogRepo, NewLog};
pub use project::ProjectRepo;
pub use user::UserRepo;
