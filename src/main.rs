mod api;
mod config;
mod models;
mod services;
mod sources;
mod utils;

use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_rest_router, AppState};
use config::Config;
use services::QuoteService;
use sources::rpc::FailoverProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,token_quote_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🚀 Token Price API Starting...\n");

    let config = Config::load()?;
    tracing::info!(
        "✓ Configuration loaded ({} RPC endpoints, fee tier {})",
        config.chain.rpc_urls.len(),
        utils::format_fee_tier(config.uniswap.fee_tier)
    );

    // Endpoints are probed per request; nothing is connected up front.
    let provider = FailoverProvider::from_urls(
        &config.chain.rpc_urls,
        Duration::from_secs(config.chain.request_timeout_secs),
    )?;
    let service = Arc::new(QuoteService::from_config(&config, Arc::new(provider)));

    let state = Arc::new(AppState { service });
    let app = create_rest_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("\n✓ Server running on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
