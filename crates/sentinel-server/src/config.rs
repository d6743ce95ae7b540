//! Gateway configuration.
//!
//! Defaults are overridable from an optional JSON file and `SENTINEL_`
//! environment variables via [`figment`], in that precedence order.

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};

/// Configuration for the gateway server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Path to the `SQLite` database file.
    pub database_path: String,
    /// Heartbeat interval for authenticated sessions, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: "sentinel.db".into(),
            heartbeat_interval_secs: 30,
            max_message_size: 1024 * 1024, // 1 MB
        }
    }
}

impl GatewayConfig {
    /// Load configuration: defaults, then an optional JSON file, then
    /// `SENTINEL_`-prefixed environment variables.
    pub fn load(file: Option<&str>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed("SENTINEL_")).extract()
    }
}
