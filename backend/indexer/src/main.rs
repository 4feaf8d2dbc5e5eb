//! `crowdsale-indexer` binary.
//!
//! Follows one crowdsale contract's events into SQLite in the background
//! and serves them, with aggregated sale totals, over HTTP.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod rpc;
mod summary;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::Indexer;
use rpc::RpcClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; it must load before RUST_LOG is read.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::init_pool(&config.database_url).await?;

    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let shutdown = CancellationToken::new();

    let indexer = Indexer {
        pool: pool.clone(),
        rpc: RpcClient::new(http, &config),
        poll_interval: Duration::from_secs(config.poll_interval_secs),
        start_ledger: config.start_ledger,
    };
    let indexer_task = tokio::spawn(indexer.run(shutdown.clone()));

    let state = Arc::new(api::ApiState { pool });
    let routes = Router::new()
        .route("/health", get(api::health))
        .route("/events", get(api::get_all_events))
        .route("/beneficiaries/:address/events", get(api::get_beneficiary_events))
        .route("/summary", get(api::get_summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port)).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");

    let signal = shutdown.clone();
    axum::serve(listener, routes)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
                // The indexer cancels on its own when it cannot continue.
                _ = signal.cancelled() => {}
            }
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    indexer_task.await??;

    Ok(())
}
