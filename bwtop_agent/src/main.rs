//! bwtop_agent: samples host network throughput and serves it on the manager endpoint.

mod config;
mod format;
mod history;
mod manager;
mod sampler;
mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use sysinfo::Networks;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{history_capacity, parse_port, sample_period, DEFAULT_PORT};
use crate::manager::manager_handler;
use crate::sampler::spawn_sampler;
use crate::state::AppState;

fn router(state: AppState) -> Router {
    Router::new()
        .route("/manager", get(manager_handler))
        .route("/manager/", get(manager_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|a| a == "-h" || a == "--help") {
        println!("Usage: bwtop_agent [--port PORT|-p PORT]");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = parse_port(std::env::args(), DEFAULT_PORT);
    let period = sample_period();
    let state = AppState::new(Networks::new_with_refreshed_list(), history_capacity());

    let _sampler = spawn_sampler(state.clone(), period);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "listening on http://{} (sample every {:?}, {} samples kept)",
        listener.local_addr()?,
        period,
        history_capacity()
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
