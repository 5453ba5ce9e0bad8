//! Candidate Normalizer — coerces heterogeneous resume records into `CandidateResume`.
//!
//! The "skills may be a string or a list" question is settled here, once.
//! Malformed fields never abort normalization: they fall back to empty values and
//! are reported as `ExtractionIssue`s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::matching::config::MatchConfig;

/// Canonical candidate record consumed by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResume {
    pub id: String,
    pub name: String,
    pub title: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    /// Fields the matcher does not interpret, forwarded unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field that could not be coerced into its canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionIssue {
    pub field: String,
    pub reason: String,
}

const CANONICAL_FIELDS: &[&str] = &["id", "name", "title", "skills", "experience", "education"];
/// Keys owned by `MatchResult`; dropped from pass-through so results never carry duplicates.
const RESULT_FIELDS: &[&str] = &["matchScore", "matchDetails"];
/// Namespace for ids derived from records that arrive without one.
const CANDIDATE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_52a4_9d3e_4b7a_8e21_0c5d_f3a9_b714);

/// Normalizes one raw record. Issues are logged and discarded.
pub fn normalize(raw: &Value, config: &MatchConfig) -> CandidateResume {
    let (candidate, issues) = normalize_with_issues(raw, config);
    for issue in &issues {
        warn!(
            candidate_id = %candidate.id,
            field = %issue.field,
            "candidate field coerced: {}",
            issue.reason
        );
    }
    candidate
}

/// Normalizes one raw record and returns the coercions that were applied.
pub fn normalize_with_issues(
    raw: &Value,
    config: &MatchConfig,
) -> (CandidateResume, Vec<ExtractionIssue>) {
    let mut issues = Vec::new();

    let empty = Map::new();
    let object = match raw {
        Value::Object(map) => map,
        other => {
            issues.push(ExtractionIssue {
                field: "<record>".to_string(),
                reason: format!("expected an object, got {}", type_name(other)),
            });
            &empty
        }
    };

    let id = match object.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => derive_id(raw),
    };

    let name = coerce_scalar(object.get("name"), "name", &mut issues);
    let name = if name.trim().is_empty() {
        config.sentinels.unknown_name.clone()
    } else {
        name
    };

    let candidate = CandidateResume {
        id,
        name,
        title: coerce_scalar(object.get("title"), "title", &mut issues),
        skills: coerce_skills(object.get("skills"), &mut issues),
        experience: coerce_scalar(object.get("experience"), "experience", &mut issues),
        education: coerce_scalar(object.get("education"), "education", &mut issues),
        extra: object
            .iter()
            .filter(|(k, _)| {
                !CANONICAL_FIELDS.contains(&k.as_str()) && !RESULT_FIELDS.contains(&k.as_str())
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    (candidate, issues)
}

/// Sequences pass through; comma-separated strings are split and trimmed;
/// anything else becomes an empty list.
fn coerce_skills(value: Option<&Value>, issues: &mut Vec<ExtractionIssue>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                other => {
                    issues.push(ExtractionIssue {
                        field: "skills".to_string(),
                        reason: format!("dropped {} item", type_name(other)),
                    });
                    None
                }
            })
            .collect(),
        Some(Value::String(s)) => split_skill_list(s),
        Some(other) => {
            issues.push(ExtractionIssue {
                field: "skills".to_string(),
                reason: format!("expected list or string, got {}", type_name(other)),
            });
            Vec::new()
        }
    }
}

/// Splits "JavaScript, React，HTML、CSS" into trimmed, non-empty pieces.
pub fn split_skill_list(raw: &str) -> Vec<String> {
    raw.split([',', '，', '、'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn coerce_scalar(value: Option<&Value>, field: &str, issues: &mut Vec<ExtractionIssue>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => {
            issues.push(ExtractionIssue {
                field: field.to_string(),
                reason: format!("expected text, got {}", type_name(other)),
            });
            String::new()
        }
    }
}

/// Deterministic id for records without one, so re-normalizing is stable.
fn derive_id(raw: &Value) -> String {
    let canonical = serde_json::to_string(raw).unwrap_or_default();
    Uuid::new_v5(&CANDIDATE_ID_NAMESPACE, canonical.as_bytes()).to_string()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
