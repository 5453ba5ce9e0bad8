//! Match Report Builder — explanation text and the final ranked report.

use serde::Serialize;

use crate::matching::keywords::JobRequirements;
use crate::matching::scoring::MatchResult;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    /// Sorted by `match_score`, highest first; ties keep input order.
    pub matches: Vec<MatchResult>,
    pub job_requirements: JobRequirements,
}

/// Sorts results descending by score. `sort_by` is stable, so source order
/// breaks ties.
pub fn build_report(requirements: JobRequirements, mut results: Vec<MatchResult>) -> MatchReport {
    results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    MatchReport {
        matches: results,
        job_requirements: requirements,
    }
}

/// Analysis tiers are keyed off the skills score.
pub fn build_analysis(name: &str, skills_score: u32, matched_skills: &[String]) -> String {
    if skills_score >= 80 {
        format!(
            "{name} is highly matched and covers key skills: {}.",
            matched_skills.join(", ")
        )
    } else if skills_score >= 50 {
        format!(
            "{name} is partially matched: familiar with {}, but missing some key skills.",
            matched_skills.join(", ")
        )
    } else {
        format!("{name} is a low match for the required stack; additional training may be needed.")
    }
}

/// Recommendation tiers are keyed off the composite score.
pub fn build_recommendation(match_score: u32) -> String {
    if match_score >= 70 {
        "Recommended: proceed to the next interview round.".to_string()
    } else if match_score >= 50 {
        "Keep as a backup candidate.".to_string()
    } else {
        "Not suitable for this position.".to_string()
    }
}
