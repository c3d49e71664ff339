//! Regex Advent · Calendar Backend
//!
//! - Axum HTTP + WebSocket API around one calendar session
//! - 24 regex lessons loaded from a JSON catalog at startup (fatal if broken)
//! - Revealed doors persisted to a small JSON file
//! - Static presentation layer served from ./static
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   ADVENT_CONFIG_PATH  : path to TOML config (catalog/progress paths, unlock policy)
//!   CATALOG_PATH        : lesson catalog JSON (default ./static/regex-data.json)
//!   PROGRESS_PATH       : revealed-doors file (default ./data/progress.json)
//!   UNLOCK_ALL          : "1"/"true" opens every door regardless of date
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod catalog;
mod progress;
mod calendar;
mod tester;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::config::load_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env().map_err(|e| {
    error!(target: "regex_advent", error = %e, "Invalid configuration");
    e
  })?;

  // The interactive surface must not come up without a complete catalog.
  let state = match AppState::from_config(&cfg).await {
    Ok(s) => Arc::new(s),
    Err(e) => {
      error!(target: "regex_advent", error = %e, catalog = %cfg.catalog_path.display(), "Startup failed");
      return Err(e.into());
    }
  };

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "regex_advent", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "regex_advent", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "regex_advent", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "regex_advent", "Shutdown requested");
}
