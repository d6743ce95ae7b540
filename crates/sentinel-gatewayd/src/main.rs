//! # sentinel-gatewayd
//!
//! Sentinel gateway daemon: wires the store and server crates together,
//! runs the background tasks, and serves until interrupted.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentinel_server::config::GatewayConfig;
use sentinel_server::metrics::install_recorder;
use sentinel_server::server::GatewayServer;
use sentinel_store::connection::{ConnectionConfig, new_file};
use sentinel_store::credentials::SqliteCredentialStore;
use sentinel_store::migrations::run_migrations;
use sentinel_store::retention::{self, FREE_TIER_MAX_AGE, PURGE_INTERVAL};
use tracing_subscriber::EnvFilter;

/// Sentinel log-ingestion gateway.
#[derive(Parser, Debug)]
#[command(name = "sentinel-gatewayd", about = "Sentinel log-ingestion gateway")]
struct Cli {
    /// Path to a JSON configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database (overrides config).
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    /// Load config and fold in command-line overrides.
    fn resolve_config(&self) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db_path) = &self.db_path {
            config.database_path = db_path.to_string_lossy().into_owned();
        }
        Ok(config)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = args.resolve_config()?;

    ensure_parent_dir(Path::new(&config.database_path))?;
    let pool = new_file(&config.database_path, &ConnectionConfig::default())
        .context("Failed to open database")?;
    {
        let conn = pool.get().context("Failed to get DB connection")?;
        let _ = run_migrations(&conn).context("Failed to run migrations")?;
    }
    let store = Arc::new(SqliteCredentialStore::new(pool.clone()));

    let metrics = install_recorder();
    let server = GatewayServer::new(config, store, metrics);

    let sweeper = server.spawn_sweeper();
    let purger = tokio::spawn(retention::run_retention(
        pool,
        PURGE_INTERVAL,
        FREE_TIER_MAX_AGE,
        server.shutdown().token(),
    ));

    let shutdown = Arc::clone(server.shutdown());
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            shutdown.trigger();
        }
    });

    server.listen().await.context("Server failed")?;
    server.shutdown().drain(vec![sweeper, purger], None).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_win() {
        let cli = Cli {
            config: None,
            host: Some("0.0.0.0".into()),
            port: Some(9300),
            db_path: Some(PathBuf::from("/tmp/sentinel-test.db")),
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9300);
        assert_eq!(config.database_path, "/tmp/sentinel-test.db");
    }

    #[test]
    fn defaults_without_overrides() {
        let cli = Cli {
            config: None,
            host: None,
            port: None,
            db_path: None,
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.heartbeat_interval_secs, 30);
    }

    #[test]
    fn parent_dir_created_for_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sentinel.db");
        ensure_parent_dir(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn bare_filename_needs_no_parent() {
        ensure_parent_dir(Path::new("sentinel.db")).unwrap();
    }

    #[test]
    fn cli_parses_flags() {
        use clap::Parser as _;
        let cli = Cli::parse_from([
            "sentinel-gatewayd",
            "--host",
            "10.0.0.1",
            "--port",
            "8080",
        ]);
        assert_eq!(cli.host.as_deref(), Some("10.0.0.1"));
        assert_eq!(cli.port, Some(8080));
    }
}
