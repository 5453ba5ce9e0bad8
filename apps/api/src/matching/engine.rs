//! Match Engine — validation plus extractor → normalizer → scorer → report.
//!
//! Candidates are scored in parallel with rayon; `collect` keeps input order so
//! the stable sort in `build_report` still honours source order on ties.

use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::matching::config::MatchConfig;
use crate::matching::keywords::{extract_requirements, JobRequirements};
use crate::matching::normalize::{normalize, CandidateResume};
use crate::matching::report::{build_report, MatchReport};
use crate::matching::scoring::{score_candidate, MatchResult, ScoringPolicy};

/// Input validation failures. Surfaced to the caller as-is, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("job description required")]
    EmptyJobDescription,

    #[error("no candidate resumes available to match")]
    NoCandidates,
}

#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub job_description: String,
    pub candidates: Vec<Value>,
    pub policy: ScoringPolicy,
}

/// Validated, normalized input ready for any scorer backend.
#[derive(Debug, Clone)]
pub struct PreparedMatch {
    pub requirements: JobRequirements,
    pub candidates: Vec<CandidateResume>,
}

/// Cheap to clone; the config is shared.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: Arc<MatchConfig>,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn extract_requirements(&self, job_description: &str) -> JobRequirements {
        extract_requirements(job_description, &self.config)
    }

    pub fn normalize_all(&self, raw: &[Value]) -> Vec<CandidateResume> {
        raw.par_iter().map(|r| normalize(r, &self.config)).collect()
    }

    /// Validates input, extracts requirements once and normalizes every candidate.
    pub fn prepare(
        &self,
        job_description: &str,
        candidates: &[Value],
    ) -> Result<PreparedMatch, MatchError> {
        if job_description.trim().is_empty() {
            return Err(MatchError::EmptyJobDescription);
        }
        if candidates.is_empty() {
            return Err(MatchError::NoCandidates);
        }

        let requirements = self.extract_requirements(job_description);
        debug!(
            job_title = %requirements.job_title,
            skills = ?requirements.skills,
            "extracted job requirements"
        );

        Ok(PreparedMatch {
            requirements,
            candidates: self.normalize_all(candidates),
        })
    }

    pub fn score_all(
        &self,
        requirements: &JobRequirements,
        candidates: Vec<CandidateResume>,
        policy: ScoringPolicy,
    ) -> Vec<MatchResult> {
        candidates
            .into_par_iter()
            .map(|c| score_candidate(requirements, c, policy, &self.config))
            .collect()
    }

    /// Full synchronous match: either a complete report or a validation error.
    pub fn run(&self, request: &MatchRequest) -> Result<MatchReport, MatchError> {
        let PreparedMatch {
            requirements,
            candidates,
        } = self.prepare(&request.job_description, &request.candidates)?;

        let results = self.score_all(&requirements, candidates, request.policy);
        info!(
            candidates = results.len(),
            strategy = ?request.policy.strategy,
            "match completed"
        );
        Ok(build_report(requirements, results))
    }
}
