//! Scorer backends — pluggable, trait-based scoring of a prepared candidate pool.
//!
//! Default: `HeuristicScorer` (keyword heuristics, deterministic).
//! Optional: `LlmMatchScorer`, which asks the model for per-candidate sub-scores
//! and falls back to the heuristic for any candidate whose call fails or times out.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, chosen at startup via config.
//! Every backend returns results in input order and with the composite computed
//! by `scoring::composite_score`, so reports rank the same way regardless of backend.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::llm_client::prompts::UNTRUSTED_INPUT_NOTE;
use crate::llm_client::{LlmClient, LlmError};
use crate::matching::config::MatchConfig;
use crate::matching::engine::MatchEngine;
use crate::matching::keywords::JobRequirements;
use crate::matching::normalize::CandidateResume;
use crate::matching::prompts::{MATCH_ASSESS_PROMPT, MATCH_ASSESS_SYSTEM};
use crate::matching::report::build_analysis;
use crate::matching::scoring::{
    assemble_result, score_candidate, uncovered_requirements, MatchDetails,
    MatchResult, MissingSkillsPolicy, ScorerBackend, ScoringPolicy,
};

const MAX_CONCURRENT_ASSESSMENTS: usize = 4;
/// Whole-request deadline, as a multiple of the per-candidate timeout.
const REQUEST_DEADLINE_FACTOR: u32 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Swap backends without touching handlers. Scoring never fails: a backend
/// that cannot score a candidate must fall back rather than drop it.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score_all(
        &self,
        job_description: &str,
        requirements: &JobRequirements,
        candidates: Vec<CandidateResume>,
        policy: ScoringPolicy,
    ) -> Vec<MatchResult>;

    fn backend(&self) -> ScorerBackend;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicScorer
// ────────────────────────────────────────────────────────────────────────────

pub struct HeuristicScorer {
    engine: MatchEngine,
}

impl HeuristicScorer {
    pub fn new(engine: MatchEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl MatchScorer for HeuristicScorer {
    async fn score_all(
        &self,
        _job_description: &str,
        requirements: &JobRequirements,
        candidates: Vec<CandidateResume>,
        policy: ScoringPolicy,
    ) -> Vec<MatchResult> {
        // rayon fan-out; keep it off the async workers.
        let engine = self.engine.clone();
        let requirements = requirements.clone();
        match tokio::task::spawn_blocking(move || {
            engine.score_all(&requirements, candidates, policy)
        })
        .await
        {
            Ok(results) => results,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }

    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Heuristic
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM-assisted scorer
// ────────────────────────────────────────────────────────────────────────────

/// Raw per-candidate judgement returned by the model. Untrusted until
/// `sanitize_assessment` has clamped and filtered it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchAssessment {
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub matched_skills: Vec<String>,
    pub analysis: Option<String>,
}

/// Produces a `MatchAssessment` for one candidate. `LlmClient` is the
/// production implementation.
#[async_trait]
pub trait MatchAssessor: Send + Sync {
    async fn assess(
        &self,
        job_description: &str,
        candidate: &CandidateResume,
    ) -> Result<MatchAssessment, LlmError>;
}

#[async_trait]
impl MatchAssessor for LlmClient {
    async fn assess(
        &self,
        job_description: &str,
        candidate: &CandidateResume,
    ) -> Result<MatchAssessment, LlmError> {
        let candidate_json = serde_json::to_string_pretty(candidate)?;
        let prompt = MATCH_ASSESS_PROMPT
            .replace("{untrusted_note}", UNTRUSTED_INPUT_NOTE)
            .replace("{job_description}", job_description)
            .replace("{candidate_json}", &candidate_json);
        self.call_json("match_assess", &prompt, MATCH_ASSESS_SYSTEM).await
    }
}

pub struct LlmMatchScorer {
    assessor: Arc<dyn MatchAssessor>,
    engine: MatchEngine,
    timeout: Duration,
    deadline: Duration,
    permits: Arc<Semaphore>,
}

impl LlmMatchScorer {
    /// `timeout` bounds each candidate's assessment, retries included. The
    /// whole pool gets `REQUEST_DEADLINE_FACTOR` times that; candidates still
    /// pending at the deadline are scored by the heuristic.
    pub fn new(assessor: Arc<dyn MatchAssessor>, engine: MatchEngine, timeout: Duration) -> Self {
        Self {
            assessor,
            engine,
            timeout,
            deadline: timeout * REQUEST_DEADLINE_FACTOR,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_ASSESSMENTS)),
        }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score_all(
        &self,
        job_description: &str,
        requirements: &JobRequirements,
        candidates: Vec<CandidateResume>,
        policy: ScoringPolicy,
    ) -> Vec<MatchResult> {
        let deadline = tokio::time::Instant::now() + self.deadline;
        let job_description: Arc<str> = Arc::from(job_description);
        let requirements = Arc::new(requirements.clone());
        let mut slots: Vec<Option<MatchResult>> = vec![None; candidates.len()];
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let assessor = Arc::clone(&self.assessor);
            let engine = self.engine.clone();
            let permits = Arc::clone(&self.permits);
            let job_description = Arc::clone(&job_description);
            let requirements = Arc::clone(&requirements);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome =
                    tokio::time::timeout(timeout, assessor.assess(&job_description, &candidate))
                        .await;
                let config = engine.config();
                let result = match outcome {
                    Ok(Ok(assessment)) => {
                        sanitize_assessment(assessment, &requirements, candidate, policy, config)
                    }
                    Ok(Err(err)) => {
                        warn!(candidate_id = %candidate.id, error = %err, "LLM scoring failed; using heuristic");
                        score_candidate(&requirements, candidate, policy, config)
                    }
                    Err(_) => {
                        warn!(candidate_id = %candidate.id, timeout_secs = timeout.as_secs(), "LLM scoring timed out; using heuristic");
                        score_candidate(&requirements, candidate, policy, config)
                    }
                };
                (index, result)
            });
        }

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => slots[index] = Some(result),
                Ok(Some(Err(err))) => warn!(error = %err, "LLM scoring task aborted"),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        pending = tasks.len(),
                        deadline_secs = self.deadline.as_secs(),
                        "LLM scoring deadline reached; using heuristic for the rest"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        slots
            .into_iter()
            .zip(candidates)
            .map(|(slot, candidate)| {
                slot.unwrap_or_else(|| {
                    score_candidate(&requirements, candidate, policy, self.engine.config())
                })
            })
            .collect()
    }

    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Llm
    }
}

/// Turns an untrusted assessment into a result: scores clamped to 0–100,
/// matched skills restricted to the candidate's own skills, missing skills
/// recomputed under `policy`, composite and recommendation recomputed.
pub fn sanitize_assessment(
    assessment: MatchAssessment,
    requirements: &JobRequirements,
    candidate: CandidateResume,
    policy: ScoringPolicy,
    config: &MatchConfig,
) -> MatchResult {
    let claimed: HashSet<String> = assessment
        .matched_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect();
    let (matched_skills, unmatched): (Vec<String>, Vec<String>) = candidate
        .skills
        .iter()
        .cloned()
        .partition(|skill| claimed.contains(&skill.trim().to_lowercase()));

    let missing_skills = match policy.missing_skills {
        MissingSkillsPolicy::CandidateUnmatched => unmatched,
        MissingSkillsPolicy::RequirementUncovered => {
            // Requirements the model did not see matched.
            uncovered_requirements(&requirements.skills, &matched_skills)
        }
    };

    let skills_score = clamp_score(assessment.skills_score);
    let analysis = assessment
        .analysis
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| build_analysis(&candidate.name, skills_score, &matched_skills));

    debug!(
        candidate_id = %candidate.id,
        skills_score,
        matched = matched_skills.len(),
        "sanitized LLM assessment"
    );

    let details = MatchDetails {
        skills_score,
        experience_score: clamp_score(assessment.experience_score),
        education_score: clamp_score(assessment.education_score),
        matched_skills,
        missing_skills,
        analysis,
        recommendation: String::new(),
        scorer: ScorerBackend::Llm,
    };
    assemble_result(candidate, details, policy, config)
}

fn clamp_score(value: f64) -> u32 {
    if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::normalize::normalize;
    use crate::matching::scoring::ScoringStrategy;
    use serde_json::json;

    fn engine() -> MatchEngine {
        MatchEngine::new(MatchConfig::default())
    }

    fn candidate(value: serde_json::Value) -> CandidateResume {
        normalize(&value, &MatchConfig::default())
    }

    fn requirements() -> JobRequirements {
        engine().extract_requirements("招聘前端开发工程师，熟悉React和TypeScript，本科")
    }

    /// Replies from a fixed script keyed by candidate id.
    struct ScriptedAssessor;

    #[async_trait]
    impl MatchAssessor for ScriptedAssessor {
        async fn assess(
            &self,
            _job_description: &str,
            candidate: &CandidateResume,
        ) -> Result<MatchAssessment, LlmError> {
            match candidate.id.as_str() {
                "ok" => Ok(MatchAssessment {
                    skills_score: 150.0,
                    experience_score: 90.0,
                    education_score: -5.0,
                    matched_skills: vec!["react".to_string(), "Kubernetes".to_string()],
                    analysis: Some("张三 fits well.".to_string()),
                }),
                id if id.starts_with("hang") => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(LlmError::EmptyContent)
                }
                _ => Err(LlmError::EmptyContent),
            }
        }
    }

    #[test]
    fn test_sanitize_clamps_and_filters() {
        let reqs = requirements();
        let result = sanitize_assessment(
            MatchAssessment {
                skills_score: 150.0,
                experience_score: 90.0,
                education_score: -5.0,
                matched_skills: vec!["react".to_string(), "Kubernetes".to_string()],
                analysis: None,
            },
            &reqs,
            candidate(json!({"id": "c1", "name": "张三", "skills": ["React", "Vue"]})),
            ScoringPolicy::default(),
            &MatchConfig::default(),
        );

        let d = &result.match_details;
        assert_eq!(d.skills_score, 100);
        assert_eq!(d.education_score, 0);
        assert_eq!(d.matched_skills, vec!["React"]);
        assert_eq!(d.missing_skills, vec!["Vue"]);
        assert_eq!(d.scorer, ScorerBackend::Llm);
        assert!(d.analysis.contains("张三"));
        // round(100*0.6 + 90*0.25 + 0*0.15) = 83
        assert_eq!(result.match_score, 83);
        assert_eq!(d.recommendation, "Recommended: proceed to the next interview round.");
    }

    #[test]
    fn test_sanitize_requirement_uncovered_policy() {
        let reqs = requirements();
        let policy = ScoringPolicy {
            strategy: ScoringStrategy::SkillsOnly,
            missing_skills: MissingSkillsPolicy::RequirementUncovered,
        };
        let result = sanitize_assessment(
            MatchAssessment {
                skills_score: 40.0,
                matched_skills: vec!["React".to_string()],
                ..Default::default()
            },
            &reqs,
            candidate(json!({"id": "c1", "name": "张三", "skills": ["React"]})),
            policy,
            &MatchConfig::default(),
        );
        assert!(result.match_details.missing_skills.contains(&"TypeScript".to_string()));
        assert!(!result.match_details.missing_skills.contains(&"React".to_string()));
        assert_eq!(result.match_score, 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_scorer_falls_back_per_candidate_and_keeps_order() {
        let scorer = LlmMatchScorer::new(Arc::new(ScriptedAssessor), engine(), Duration::from_secs(5));
        let reqs = requirements();
        let pool = vec![
            candidate(json!({"id": "hang", "name": "王五", "skills": ["React"]})),
            candidate(json!({"id": "ok", "name": "张三", "skills": ["React", "Vue"]})),
            candidate(json!({"id": "err", "name": "李四", "skills": ["TypeScript"]})),
        ];

        let results = scorer
            .score_all("job", &reqs, pool, ScoringPolicy::default())
            .await;

        let ids: Vec<&str> = results.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["hang", "ok", "err"]);
        assert_eq!(results[0].match_details.scorer, ScorerBackend::Heuristic);
        assert_eq!(results[1].match_details.scorer, ScorerBackend::Llm);
        assert_eq!(results[2].match_details.scorer, ScorerBackend::Heuristic);
        assert_eq!(scorer.backend(), ScorerBackend::Llm);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_scorer_request_deadline_bounds_slow_pools() {
        let timeout = Duration::from_secs(5);
        let scorer = LlmMatchScorer::new(Arc::new(ScriptedAssessor), engine(), timeout);
        let reqs = requirements();
        // Three waves of four at 5s each would take 15s without the request deadline.
        let pool: Vec<_> = (0..12)
            .map(|i| candidate(json!({"id": format!("hang-{i}"), "name": "王五", "skills": ["React"]})))
            .collect();

        let started = tokio::time::Instant::now();
        let results = scorer
            .score_all("job", &reqs, pool, ScoringPolicy::default())
            .await;
        let elapsed = started.elapsed();

        assert!(elapsed <= timeout * REQUEST_DEADLINE_FACTOR, "took {elapsed:?}");
        assert_eq!(results.len(), 12);
        assert_eq!(results[11].candidate.id, "hang-11");
        assert!(results
            .iter()
            .all(|r| r.match_details.scorer == ScorerBackend::Heuristic));
    }

    #[test]
    fn test_assess_system_prompt_demands_bare_json() {
        assert!(MATCH_ASSESS_SYSTEM.contains("valid JSON only"));
        assert!(MATCH_ASSESS_SYSTEM.contains("no markdown fences"));
    }

    #[tokio::test]
    async fn test_heuristic_scorer_matches_engine() {
        let engine = engine();
        let reqs = requirements();
        let pool = vec![candidate(json!({"id": "a", "name": "张三", "skills": ["React"]}))];
        let expected = engine.score_all(&reqs, pool.clone(), ScoringPolicy::default());

        let scorer = HeuristicScorer::new(engine);
        let results = scorer
            .score_all("ignored", &reqs, pool, ScoringPolicy::default())
            .await;
        assert_eq!(results, expected);
        assert_eq!(scorer.backend(), ScorerBackend::Heuristic);
    }
}
