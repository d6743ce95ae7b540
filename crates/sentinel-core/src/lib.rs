//! # sentinel-core
//!
//! Foundation types for the Sentinel log-ingestion gateway.
//!
//! This crate provides the shared vocabulary the other sentinel crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::SessionId`], [`ids::ProjectId`], [`ids::ClientId`]
//!   as newtypes over `String`
//! - **Protocol**: [`protocol::ClientFrame`] / [`protocol::ServerFrame`] for
//!   the bidirectional session, plus the HTTP ingest request/response bodies,
//!   [`protocol::ErrorCode`], and [`protocol::AccountTier`]
//!
//! Failure types live with the subsystems that produce them
//! (`sentinel-store::errors`, `sentinel-server::auth`); this crate only
//! defines what goes on the wire.
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `sentinel-store`, `sentinel-server`,
//! and the `sentinel-gatewayd` binary.

#![deny(unsafe_code)]

pub mod ids;
pub mod protocol;
