//! MathEZ · arithmetic practice backend
//!
//! - Axum HTTP + WebSocket API
//! - Problem generation for the grade 1-3 curriculum, with visuals
//! - In-memory wrong-answer notebook, chapter progress and daily streak
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   MATHEZ_CONFIG_PATH : path to TOML config (rng seed, issued capacity, extra chapters)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seed;
mod topic;
mod curriculum;
mod operands;
mod visual;
mod engine;
mod similar;
mod place_value;
mod store;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (catalog, generator, in-memory stores).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "mathez_backend", %addr, "HTTP server listening");
  serve_until(listener, app, shutdown_signal()).await?;
  Ok(())
}

/// Serve until `signal` resolves, then drain in-flight requests.
async fn serve_until<F>(listener: TcpListener, app: axum::Router, signal: F) -> std::io::Result<()>
where
  F: std::future::Future<Output = ()> + Send + 'static,
{
  axum::serve(listener, app).with_graceful_shutdown(signal).await?;
  info!(target: "mathez_backend", "HTTP server stopped");
  Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "mathez_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "mathez_backend", "Shutdown signal received");
}
