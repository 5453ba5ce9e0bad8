//! Axum route handlers for the Matching API.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::matching::engine::{MatchError, PreparedMatch};
use crate::matching::keywords::JobRequirements;
use crate::matching::report::{build_report, MatchReport};
use crate::matching::scoring::{MissingSkillsPolicy, ScoringPolicy, ScoringStrategy};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementsRequest {
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBody {
    #[serde(default)]
    pub job_description: String,
    /// Inline candidate records. When absent the pool comes from the store.
    #[serde(default, alias = "resumes")]
    pub candidates: Option<Vec<Value>>,
    pub strategy: Option<String>,
    pub missing_skills: Option<MissingSkillsPolicy>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/requirements
///
/// Previews what the extractor reads out of a job description.
pub async fn handle_extract_requirements(
    State(state): State<AppState>,
    Json(request): Json<RequirementsRequest>,
) -> Result<Json<JobRequirements>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(MatchError::EmptyJobDescription.into());
    }
    Ok(Json(state.engine.extract_requirements(&request.job_description)))
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchBody>,
) -> Result<Json<MatchReport>, AppError> {
    // Validate before touching the store.
    if request.job_description.trim().is_empty() {
        return Err(MatchError::EmptyJobDescription.into());
    }

    let strategy = match request.strategy.as_deref() {
        Some(s) => s.parse::<ScoringStrategy>().map_err(AppError::Validation)?,
        None => state.config.default_strategy,
    };
    let policy = ScoringPolicy {
        strategy,
        missing_skills: request.missing_skills.unwrap_or_default(),
    };

    let raw_candidates = match request.candidates {
        Some(candidates) => candidates,
        None => state.store.fetch_all_candidates().await?,
    };

    // Extraction and the rayon normalization fan-out stay off the async workers.
    let engine = state.engine.clone();
    let job_description = request.job_description.clone();
    let PreparedMatch {
        requirements,
        candidates,
    } = tokio::task::spawn_blocking(move || engine.prepare(&job_description, &raw_candidates))
        .await
        .map_err(|err| anyhow::anyhow!("candidate preparation task failed: {err}"))??;

    let results = state
        .scorer
        .score_all(&request.job_description, &requirements, candidates, policy)
        .await;

    info!(
        candidates = results.len(),
        strategy = ?policy.strategy,
        scorer = ?state.scorer.backend(),
        "match completed"
    );
    Ok(Json(build_report(requirements, results)))
}
