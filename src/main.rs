use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fedart_gateway::build_router;
use fedart_gateway::config::Args;
use fedart_gateway::expiry::ExpiryChecker;
use fedart_gateway::state::AppState;
use fedart_gateway::toast::toast_worker;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    if let Err(e) = run(args).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run(args: Args) -> std::io::Result<()> {
    let (state, toast_rx) = AppState::new(&args);
    let state = Arc::new(state);

    // spawn the background workers
    tokio::spawn(toast_worker(toast_rx, Arc::clone(&state.toasts)));
    let expiry = ExpiryChecker::start(Arc::clone(&state), args.expiry_interval());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Gateway running on http://localhost:{}", args.port);
    info!("Linkify cache TTL: {} seconds", args.cache_ttl);
    info!("Expiry check every {} seconds", args.expiry_interval().as_secs());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(expiry);
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
}
