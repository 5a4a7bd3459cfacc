use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::Mutex;

use anyhow::Context;
use nba_api_rs::api::{Api, ApiState};
use nba_api_rs::config_handler;
use nba_api_rs::db::Db;
use nba_api_rs::models::Collection;
use serde_json::Value;
use tracing::log;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        // Set the RUST_LOG, if it hasn't been explicitly defined
        std::env::set_var("RUST_LOG", "info,tower_http=debug")
    }

    let config = config_handler::get_config()?;
    init_tracing(&config.security_log_path)?;

    let db: Db<Collection, Value> = Db::new(&config.data_path);
    for collection in Collection::get_all() {
        if db.exists(&collection) {
            log::info!("[MAIN] Found {}", db.get_path(&collection).display());
        } else {
            log::warn!("[MAIN] Missing {}, requests for it will fail", db.get_path(&collection).display());
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    Api::serve(ApiState::new(config), addr).await
}

/// Stdout for everything, plus the `security` target appended to its own file.
fn init_tracing(security_log_path: &str) -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .compact();

    let security_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(security_log_path)
        .with_context(|| format!("Could not open security log at {security_log_path}"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer()
            .event_format(format)
            .with_filter(EnvFilter::from_default_env()))
        .with(tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(security_log))
            .with_filter(Targets::new().with_target("security", LevelFilter::WARN)))
        .init();
    Ok(())
}
