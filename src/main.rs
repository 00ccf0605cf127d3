use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use disclosure_analyzer::config::Args;
use disclosure_analyzer::rate_limit::sweep_expired;
use disclosure_analyzer::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();

    let state = match AppState::from_args(&args) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("failed to initialize model client: {}", e);
            std::process::exit(1);
        }
    };
    if state.model.is_none() {
        warn!("ANTHROPIC_API_KEY not configured, analyze requests will fail");
    }

    // spawn the background sweeper
    if let Some(every) = args.sweep_interval() {
        let limiter = state.rate_limiter.clone();
        tokio::spawn(async move {
            sweep_expired(limiter, every).await;
        });
    }

    let app = disclosure_analyzer::app(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Analyzer running on http://localhost:{}", args.port);
    info!("Model: {} at {}", args.model, args.anthropic_base_url);
    info!("Document budget: {} characters", args.max_document_chars);
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("server error: {}", e);
    }
}
