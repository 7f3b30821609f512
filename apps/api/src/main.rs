mod auth;
mod config;
mod errors;
mod generation;
mod layout;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{HttpTokenVerifier, TokenVerifier};
use crate::config::Config;
use crate::layout::FontSet;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
        config.llm_timeout,
    )?;
    info!(
        model = %llm.model(),
        timeout_secs = config.llm_timeout.as_secs(),
        "LLM client initialized"
    );

    // Resolve fonts once; falls back to Helvetica when DejaVu is unavailable
    let font_dir = config.font_dir.clone();
    let fonts = tokio::task::spawn_blocking(move || FontSet::load(&font_dir)).await?;
    info!(family = ?fonts.family(), "Layout fonts ready");

    // Initialize auth delegation
    let token_verifier: Option<Arc<dyn TokenVerifier>> = match &config.auth_service_url {
        Some(url) => {
            info!(%url, "Session verification enabled");
            Some(Arc::new(HttpTokenVerifier::new(url.clone())?))
        }
        None => {
            warn!("AUTH_SERVICE_URL is not set; API routes are unauthenticated");
            None
        }
    };

    // Build app state
    let state = AppState {
        llm,
        fonts,
        token_verifier,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
