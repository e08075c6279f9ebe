mod client;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;
mod sweeper;
mod worker;

use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::models::ForwardJob;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::worker::{StoreClient, forward_worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    let limit_config = args.rate_limit_config();
    let (forward_tx, forward_rx) = mpsc::channel::<ForwardJob>(args.queue_size.max(1));

    let rate_limiter = Arc::new(RateLimiter::new(limit_config));
    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        forward_tx,
        trust_proxy_headers: args.trust_proxy_headers,
    });

    // spawn the background worker
    let store = StoreClient::new(reqwest::Client::new(), &args.store_url, args.store_key.clone());
    tokio::spawn(forward_worker(forward_rx, store));

    match args.sweep_interval() {
        Some(every) => {
            tokio::spawn(sweeper::sweeper(Arc::clone(&rate_limiter), every));
        }
        None => tracing::warn!("rate limit sweeper disabled, limiter state will grow unbounded"),
    }

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(port = args.port, "contact gateway running");
    tracing::info!(store = %args.store_url, "forwarding contact messages");
    tracing::info!(
        max_requests = limit_config.max_requests,
        window_secs = limit_config.window.as_secs(),
        block_secs = limit_config.block_duration.as_secs(),
        "rate limit configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
