mod advisor;
mod config;
mod db;
mod errors;
mod llm_client;
mod marketplace;
mod models;
mod profiles;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::advisor::Advisor;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::marketplace::AffiliateLinks;
use crate::profiles::{InMemoryProfileStore, PgProfileStore, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bark Advisor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize profile storage
    let profiles: Arc<dyn ProfileStore> = match &config.database_url {
        Some(url) => Arc::new(PgProfileStore::new(create_pool(url).await?)),
        None => {
            info!("DATABASE_URL not set; dog profiles are kept in memory");
            Arc::new(InMemoryProfileStore::new())
        }
    };

    // Initialize completion client
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_base_url)?;
    info!(
        "Completion client initialized (model: {}, timeout: {:?})",
        config.completion.model, config.completion.timeout
    );

    let state = AppState {
        advisor: Advisor::new(Arc::new(llm), config.completion.clone()),
        profiles,
        links: AffiliateLinks::new(config.affiliate_tag.clone()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
