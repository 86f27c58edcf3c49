//! XP Progression · Level and experience service
//!
//! - Axum HTTP + WebSocket API over an append-only XP ledger
//! - Level table validated at startup and on every admin replacement
//! - Summaries (current/next level, remaining XP, progress %) computed on read
//!
//! Important env variables:
//!   PORT                     : u16 (default 3000)
//!   PROGRESSION_CONFIG_PATH  : path to TOML config (grant policy + optional level table)
//!   LOG_LEVEL                : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT               : "pretty" (default) or "json"

mod telemetry;
mod domain;
mod error;
mod config;
mod seeds;
mod levels;
mod progression;
mod ledger;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // A bad level table must stop the service rather than serve wrong levels.
  let state = match AppState::from_env() {
    Ok(s) => Arc::new(s),
    Err(e) => {
      error!(target: "xp_progression", error = %e, "Startup configuration rejected");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "xp_progression", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "xp_progression", error = %e, "Failed to listen for shutdown signal");
  }
  info!(target: "xp_progression", "Shutdown signal received");
}
