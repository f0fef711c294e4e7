mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::keyword_matcher::KeywordMatcher;
use crate::analysis::pipeline::Analyzer;
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::extraction::FileTextExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{EvaluationStore, JobDescriptionStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model client (one client backs both generation and embeddings)
    let llm = Arc::new(LlmClient::new(
        config.google_api_key.clone(),
        &config.llm_model,
        &config.embedding_model,
    )?);
    info!(
        "LLM client initialized (model: {}, embeddings: {})",
        llm.model(),
        config.embedding_model
    );

    let analyzer = Analyzer::new(Arc::new(FileTextExtractor), llm.clone(), llm)
        .with_keyword_matcher(KeywordMatcher::new(config.keyword_match_threshold))
        .with_penalty_exponent(config.embedding_penalty_exponent)
        .with_max_concurrent(config.max_concurrent_analyses);
    info!(
        "Analyzer ready (keyword threshold {}, penalty exponent {}, max {} concurrent)",
        config.keyword_match_threshold,
        config.embedding_penalty_exponent,
        config.max_concurrent_analyses
    );

    // Initialize persistence
    let (evaluations, jobs): (Arc<dyn EvaluationStore>, Arc<dyn JobDescriptionStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                init_schema(&pool).await?;
                let store = Arc::new(PgStore::new(pool));
                (store.clone() as Arc<dyn EvaluationStore>, store as Arc<dyn JobDescriptionStore>)
            }
            None => {
                warn!("DATABASE_URL not set; evaluations and jobs are kept in memory only");
                let store = Arc::new(MemoryStore::new());
                (store.clone() as Arc<dyn EvaluationStore>, store as Arc<dyn JobDescriptionStore>)
            }
        };

    // Build app state
    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(analyzer),
        evaluations,
        jobs,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
