mod candidates;
mod config;
mod documents;
mod errors;
mod llm_client;
mod matching;
mod resume_parser;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::{HeuristicScorer, LlmMatchScorer, MatchConfig, MatchEngine, MatchScorer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{AirtableStore, CachedStore, CandidateStore, InMemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matcher v{}", env!("CARGO_PKG_VERSION"));

    let match_config = match &config.match_config_path {
        Some(path) => MatchConfig::from_json_file(path)
            .with_context(|| format!("loading match config from {}", path.display()))?,
        None => MatchConfig::default(),
    };
    info!(
        skills = match_config.skill_vocabulary.len(),
        titles = match_config.title_vocabulary.len(),
        strategy = ?config.default_strategy,
        "Match config loaded"
    );
    let engine = MatchEngine::new(match_config);

    // Resume store
    let inner: Arc<dyn CandidateStore> = match &config.airtable {
        Some(airtable) => {
            info!(table = %airtable.table_name, "Using Airtable candidate store");
            Arc::new(AirtableStore::new(airtable.clone(), config.request_timeout)?)
        }
        None => {
            warn!("AIRTABLE_API_KEY not set; serving the in-memory sample pool");
            Arc::new(InMemoryStore::with_sample_candidates())
        }
    };
    let store: Arc<dyn CandidateStore> = Arc::new(CachedStore::new(inner, config.request_timeout));

    // LLM client (optional)
    let llm = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone(), config.request_timeout)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(client)
        }
        None => None,
    };

    let scorer: Arc<dyn MatchScorer> = match (&llm, config.enable_llm_scoring) {
        (Some(client), true) => {
            info!("Using LLM-assisted match scorer");
            Arc::new(LlmMatchScorer::new(
                Arc::new(client.clone()),
                engine.clone(),
                config.request_timeout,
            ))
        }
        (None, true) => {
            warn!("ENABLE_LLM_SCORING is set but ANTHROPIC_API_KEY is not; using heuristic scorer");
            Arc::new(HeuristicScorer::new(engine.clone()))
        }
        (_, false) => Arc::new(HeuristicScorer::new(engine.clone())),
    };

    let state = AppState {
        engine,
        store,
        scorer,
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
