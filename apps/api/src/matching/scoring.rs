//! Scoring Engine — pure per-candidate scoring against extracted requirements.
//!
//! Sub-scores:
//! - skills: bidirectional case-insensitive substring match, `matched / max(1, required) * 100`,
//!   capped at 100
//! - experience: tiered on year counts (100 / 80 / 50), neutral when nothing to compare
//! - education: level ladder comparison (100 / 60), neutral when nothing to compare
//!
//! Two composite formulas coexist and are selected per request via `ScoringStrategy`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::matching::config::MatchConfig;
use crate::matching::keywords::{education_rank, years_from_text, JobRequirements};
use crate::matching::normalize::CandidateResume;
use crate::matching::report::{build_analysis, build_recommendation};

/// Composite formula selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// skills 0.6 / experience 0.25 / education 0.15, no floor by default.
    #[default]
    Weighted,
    /// Skills score alone, 10-point floor by default.
    SkillsOnly,
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(Self::Weighted),
            "skills_only" | "skills-only" | "simple" => Ok(Self::SkillsOnly),
            other => Err(format!("unknown scoring strategy '{other}'")),
        }
    }
}

/// Which skills are reported as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSkillsPolicy {
    /// Candidate skills that matched no requirement.
    #[default]
    CandidateUnmatched,
    /// Requirement skills that no candidate skill covers.
    RequirementUncovered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringPolicy {
    pub strategy: ScoringStrategy,
    pub missing_skills: MissingSkillsPolicy,
}

/// Which backend produced a `MatchDetails`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerBackend {
    #[default]
    Heuristic,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub skills_score: u32,
    pub experience_score: u32,
    pub education_score: u32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub analysis: String,
    pub recommendation: String,
    #[serde(default)]
    pub scorer: ScorerBackend,
}

/// Candidate fields plus score fields. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(flatten)]
    pub candidate: CandidateResume,
    pub match_score: u32,
    pub match_details: MatchDetails,
}

/// Scores one candidate with the keyword heuristics.
pub fn score_candidate(
    requirements: &JobRequirements,
    candidate: CandidateResume,
    policy: ScoringPolicy,
    config: &MatchConfig,
) -> MatchResult {
    let (matched_skills, unmatched) = partition_skills(&requirements.skills, &candidate.skills);
    let raw_skills = skills_score(matched_skills.len(), requirements.skills.len());
    let experience = experience_score(
        requirements.experience_requirement.as_deref(),
        &candidate.experience,
        config,
    );
    let education = education_score(
        requirements.education_requirement.as_deref(),
        &candidate.education,
        config,
    );

    let match_score = composite_score(raw_skills, experience, education, policy.strategy, config);
    let skills_score = raw_skills.round() as u32;

    let missing_skills = match policy.missing_skills {
        MissingSkillsPolicy::CandidateUnmatched => unmatched,
        MissingSkillsPolicy::RequirementUncovered => {
            uncovered_requirements(&requirements.skills, &candidate.skills)
        }
    };

    let details = MatchDetails {
        skills_score,
        experience_score: experience,
        education_score: education,
        analysis: build_analysis(&candidate.name, skills_score, &matched_skills),
        recommendation: build_recommendation(match_score),
        matched_skills,
        missing_skills,
        scorer: ScorerBackend::Heuristic,
    };

    MatchResult {
        candidate,
        match_score,
        match_details: details,
    }
}

/// Wraps externally produced details (e.g. from the LLM scorer) into a result,
/// recomputing the composite and the recommendation under `policy` so every
/// backend ranks the same way.
pub fn assemble_result(
    candidate: CandidateResume,
    mut details: MatchDetails,
    policy: ScoringPolicy,
    config: &MatchConfig,
) -> MatchResult {
    let match_score = composite_score(
        f64::from(details.skills_score),
        details.experience_score,
        details.education_score,
        policy.strategy,
        config,
    );
    details.recommendation = build_recommendation(match_score);
    MatchResult {
        candidate,
        match_score,
        match_details: details,
    }
}

/// Two skills match when either contains the other, ignoring case.
/// Blank strings never match.
pub fn skills_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Splits candidate skills into (matched, unmatched), preserving candidate order.
pub fn partition_skills(
    requirement_skills: &[String],
    candidate_skills: &[String],
) -> (Vec<String>, Vec<String>) {
    candidate_skills
        .iter()
        .cloned()
        .partition(|skill| requirement_skills.iter().any(|req| skills_match(skill, req)))
}

/// Requirement skills not covered by any candidate skill.
pub fn uncovered_requirements(
    requirement_skills: &[String],
    candidate_skills: &[String],
) -> Vec<String> {
    requirement_skills
        .iter()
        .filter(|req| !candidate_skills.iter().any(|skill| skills_match(skill, req)))
        .cloned()
        .collect()
}

/// Unrounded skills score. The denominator is floored at 1 and the result capped at 100.
pub fn skills_score(matched: usize, required: usize) -> f64 {
    if matched == 0 {
        return 0.0;
    }
    (matched as f64 / required.max(1) as f64 * 100.0).min(100.0)
}

pub fn experience_score(requirement: Option<&str>, candidate: &str, config: &MatchConfig) -> u32 {
    let Some(requirement) = requirement else {
        return config.neutral_score;
    };
    if candidate.trim().is_empty() {
        return config.neutral_score;
    }

    let required = f64::from(years_from_text(requirement, config));
    let actual = f64::from(years_from_text(candidate, config));

    if actual >= required {
        100
    } else if actual >= required * 0.7 {
        80
    } else {
        50
    }
}

/// "及以上" / "or above" needs no special handling: the comparison is already `>=`.
pub fn education_score(requirement: Option<&str>, candidate: &str, config: &MatchConfig) -> u32 {
    let Some(requirement) = requirement else {
        return config.neutral_score;
    };
    if candidate.trim().is_empty() {
        return config.neutral_score;
    }

    if education_rank(candidate, config) >= education_rank(requirement, config) {
        100
    } else {
        60
    }
}

/// Composite 0–100 score under `strategy`, with the strategy's configured floor.
pub fn composite_score(
    skills: f64,
    experience: u32,
    education: u32,
    strategy: ScoringStrategy,
    config: &MatchConfig,
) -> u32 {
    let (raw, floor) = match strategy {
        ScoringStrategy::Weighted => {
            let w = &config.weights;
            (
                skills * w.skills
                    + f64::from(experience) * w.experience
                    + f64::from(education) * w.education,
                config.weighted_floor,
            )
        }
        ScoringStrategy::SkillsOnly => (skills, config.skills_only_floor),
    };

    let score = raw.round().clamp(0.0, 100.0) as u32;
    score.max(floor).min(100)
}
