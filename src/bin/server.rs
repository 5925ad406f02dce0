//! Proxy server for the nearby restaurant finder.
//! Holds the provider API keys and exposes the JSON routes the browser build calls.
//!
//! Run with: PLACES_API_KEY=... cargo run --bin server -- --port 3401

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use eat_nearby::config::{AppConfig, ServerConfig};
use eat_nearby::handlers::{ProxyState, build_router};

#[derive(Parser)]
#[command(name = "eat-nearby-server")]
#[command(about = "Places and generation proxy for the nearby restaurant finder")]
struct Args {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let mut server = ServerConfig::from_env().context("Failed to load server configuration")?;
    if let Some(host) = args.host {
        server.host = host;
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    tracing::info!(
        language = %server.language,
        assistant = server.generation_api_key.is_some(),
        "Starting eat-nearby proxy server..."
    );

    let state = ProxyState::from_config(&server, &AppConfig::default());
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", server.host, server.port))?;
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
