use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::{MatchEngine, MatchScorer};
use crate::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    /// Resume pool. In production an `AirtableStore` behind a `CachedStore`.
    pub store: Arc<dyn CandidateStore>,
    /// Pluggable scorer. Default: HeuristicScorer. Swap via ENABLE_LLM_SCORING.
    pub scorer: Arc<dyn MatchScorer>,
    /// Present only when ANTHROPIC_API_KEY is set.
    pub llm: Option<LlmClient>,
    pub config: Config,
}
