mod cache;
mod config;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod orchestrator;
mod routes;
mod simulation;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::models::session::Session;
use crate::orchestrator::Orchestrator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crucible API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM backend
    let backend = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.llm_timeout,
    ));
    info!(
        "LLM backend initialized (reporting: {}, interactive: {})",
        config.reporting_model, config.interactive_model
    );

    // Initialize the orchestrator and the single in-memory session
    let orchestrator = Arc::new(Orchestrator::new(backend, &config));
    let state = AppState {
        session: Arc::new(Mutex::new(Session::new())),
        orchestrator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
