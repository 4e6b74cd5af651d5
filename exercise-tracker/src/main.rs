//! # exercise-tracker
//!
//! Exercise tracking REST API.
//!
//! Clients register users, log exercises against a user, and read back a
//! date-filtered exercise log.
//!
//! ## Architecture
//!
//! - **Store**: `Store` trait over the Users and Exercises collections, backed by SQLite or memory
//! - **HTTP**: Axum router with five endpoints, CORS, request IDs, and graceful shutdown
//! - **Dates**: lenient date parsing and `Mon Jan 01 1990` rendering

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod config;
mod dates;
mod http;
mod store;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Cli};
use crate::http::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        database_url = %config.database_url,
        static_dir = %config.static_dir.display(),
        public_dir = %config.public_dir.display(),
        store_timeout = ?config.store_timeout,
        "configuration loaded"
    );

    let store = store::connect(&config.database_url, config.store_timeout)
        .await
        .with_context(|| format!("failed to open store {}", config.database_url))?;

    let state = AppState {
        store,
        static_dir: config.static_dir,
        public_dir: config.public_dir,
    };

    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "exercise-tracker listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
