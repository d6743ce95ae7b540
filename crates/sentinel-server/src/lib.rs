//! # sentinel-server
//!
//! HTTP and `WebSocket` ingest surface for the Sentinel gateway.
//!
//! - HTTP endpoints: single-shot ingest, streamed batch ingest, health
//!   check, Prometheus metrics
//! - `WebSocket` gateway: authenticated persistent sessions with server
//!   heartbeats and in-band error frames
//! - Admission control: per-client fixed-window rate limiting and a
//!   liveness registry that evicts idle sessions
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`
//!
//! ## Crate Position
//!
//! Depends on `sentinel-core` for the wire vocabulary and `sentinel-store`
//! for persistence. The `sentinel-gatewayd` binary wires this crate to a
//! real database and socket.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod health;
pub mod ingest;
pub mod metrics;
pub mod ratelimit;
pub mod registry;
pub mod server;
pub mod session;
pub mod shutdown;

pub use config::GatewayConfig;
pub use server::{AppState, GatewayServer};
