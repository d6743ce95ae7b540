//! HTTP ingest paths.
//!
//! - [`single`]: one credential-carrying record per request, outcome always
//!   delivered in the body with transport status 200
//! - [`batch`]: newline-delimited JSON stream of records sharing the first
//!   record's credentials; any failure aborts the call while records already
//!   persisted stand

pub mod batch;
pub mod single;
