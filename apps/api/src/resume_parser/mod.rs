//! Resume parsing: plain resume text → raw candidate record.
//!
//! Two backends produce the same record shape (`name`, `title`, `skills`,
//! `experience`, `education`, plus optional `contact` / `workHistory`):
//!
//! - keyword: reuses the job-description extractor's vocabularies, so a skill
//!   the matcher can ask for is a skill the parser can find
//! - llm: asks the model for a structured resume and flattens it
//!
//! The output is an unnormalized record; it goes through
//! `matching::normalize` like every other record.

pub mod prompts;

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::documents::text_preview;
use crate::llm_client::prompts::UNTRUSTED_INPUT_NOTE;
use crate::llm_client::{LlmClient, LlmError};
use crate::matching::config::MatchConfig;
use crate::matching::keywords::{extract_skills, find_title, fold_fullwidth_digits};
use prompts::{RESUME_PARSE_PROMPT, RESUME_PARSE_SYSTEM};

static ZH_YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*年.*经验").expect("static regex"));
static EN_YEARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\+?\s*(?:years?|yrs?)\b[^\n]*?\bexperience").expect("static regex")
});

#[derive(Debug, Error)]
pub enum ResumeParseError {
    #[error("resume text is empty")]
    Empty,

    #[error("LLM resume parsing is not configured")]
    LlmUnavailable,

    #[error("LLM resume parsing failed: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumeParserKind {
    #[default]
    Keyword,
    Llm,
}

impl FromStr for ResumeParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "keywords" | "" => Ok(Self::Keyword),
            "llm" | "ai" => Ok(Self::Llm),
            other => Err(format!("unknown resume parser '{other}'; use 'keyword' or 'llm'")),
        }
    }
}

/// Parses `text` with the requested backend. An LLM failure degrades to the
/// keyword parser; only a missing client or empty text is an error.
pub async fn parse_resume(
    kind: ResumeParserKind,
    text: &str,
    config: &MatchConfig,
    llm: Option<&LlmClient>,
) -> Result<Value, ResumeParseError> {
    if text.trim().is_empty() {
        return Err(ResumeParseError::Empty);
    }

    match kind {
        ResumeParserKind::Keyword => Ok(parse_resume_keywords(text, config)),
        ResumeParserKind::Llm => {
            let llm = llm.ok_or(ResumeParseError::LlmUnavailable)?;
            match parse_resume_with_llm(llm, text).await {
                Ok(record) => Ok(record),
                Err(err) => {
                    warn!(error = %err, "LLM resume parse failed; using keyword parser");
                    Ok(parse_resume_keywords(text, config))
                }
            }
        }
    }
}

/// Vocabulary-driven parse. Never fails; unrecognized fields come back empty.
pub fn parse_resume_keywords(text: &str, config: &MatchConfig) -> Value {
    json!({
        "title": find_title(text, config).unwrap_or_default(),
        "skills": extract_skills(text, config),
        "experience": experience_years(text).unwrap_or_default(),
        "education": education_keyword(text, config).unwrap_or_default(),
        "rawTextPreview": text_preview(text),
    })
}

/// "5年工作经验" → "5年", "7+ years of experience" → "7 years".
fn experience_years(text: &str) -> Option<String> {
    let text = fold_fullwidth_digits(text);
    if let Some(caps) = ZH_YEARS_RE.captures(&text) {
        return Some(format!("{}年", &caps[1]));
    }
    EN_YEARS_RE
        .captures(&text)
        .map(|caps| format!("{} years", &caps[1]))
}

/// The highest education keyword present, as written in the vocabulary.
fn education_keyword(text: &str, config: &MatchConfig) -> Option<String> {
    let text_lower = text.to_lowercase();
    config.education_levels_by_rank().into_iter().find_map(|level| {
        level
            .keywords
            .iter()
            .find(|k| !k.is_empty() && text_lower.contains(&k.to_lowercase()))
            .cloned()
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmResume {
    name: Option<String>,
    title: Option<String>,
    contact: Option<Value>,
    education: Option<LlmEducation>,
    experience_years: Option<f64>,
    experience: Vec<LlmRole>,
    skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmEducation {
    school: Option<String>,
    major: Option<String>,
    degree: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmRole {
    company: Option<String>,
    title: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    description: Option<String>,
}

pub async fn parse_resume_with_llm(llm: &LlmClient, text: &str) -> Result<Value, ResumeParseError> {
    let prompt = RESUME_PARSE_PROMPT
        .replace("{untrusted_note}", UNTRUSTED_INPUT_NOTE)
        .replace("{resume_text}", text);
    let parsed: LlmResume = llm.call_json("resume_parse", &prompt, RESUME_PARSE_SYSTEM).await?;

    if parsed.name.is_none() {
        warn!("LLM resume parse returned no name");
    }
    if parsed.skills.is_empty() {
        warn!("LLM resume parse returned no skills");
    }
    info!(skills = parsed.skills.len(), "parsed resume with LLM");

    Ok(flatten_llm_resume(parsed, text))
}

/// Flattens the structured reply into the record shape the normalizer expects.
/// The experience string leads with the year count so `years_from_text` reads it.
fn flatten_llm_resume(parsed: LlmResume, text: &str) -> Value {
    let mut record = Map::new();

    if let Some(name) = non_blank(parsed.name) {
        record.insert("name".to_string(), json!(name));
    }
    record.insert(
        "title".to_string(),
        json!(non_blank(parsed.title)
            .or_else(|| parsed.experience.first().and_then(|r| non_blank(r.title.clone())))
            .unwrap_or_default()),
    );

    let skills: Vec<String> = parsed
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    record.insert("skills".to_string(), json!(skills));

    let years = parsed
        .experience_years
        .filter(|y| y.is_finite() && *y >= 0.0)
        .map(|y| y.round() as u32);
    let summary = parsed.experience.first().map(role_summary).filter(|s| !s.is_empty());
    let experience = match (years, summary) {
        (Some(y), Some(s)) => format!("{y} years; {s}"),
        (Some(y), None) => format!("{y} years"),
        (None, Some(s)) => s,
        (None, None) => String::new(),
    };
    record.insert("experience".to_string(), json!(experience));

    let education = parsed
        .education
        .map(|e| {
            [e.degree, e.school, e.major]
                .into_iter()
                .filter_map(non_blank)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    record.insert("education".to_string(), json!(education));

    if let Some(contact) = parsed.contact.filter(|c| c.is_object()) {
        record.insert("contact".to_string(), contact);
    }
    if !parsed.experience.is_empty() {
        record.insert("workHistory".to_string(), json!(parsed.experience));
    }
    record.insert("rawTextPreview".to_string(), json!(text_preview(text)));

    Value::Object(record)
}

fn role_summary(role: &LlmRole) -> String {
    match (non_blank(role.title.clone()), non_blank(role.company.clone())) {
        (Some(t), Some(c)) => format!("{t} @ {c}"),
        (Some(t), None) => t,
        (None, Some(c)) => c,
        (None, None) => String::new(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// "zhang_san-resume.pdf" → "zhang_san-resume". Used when an upload carries
/// no explicit name and the parser found none.
pub fn name_from_filename(filename: &str) -> Option<String> {
    let stem = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let stem = stem.rsplit_once('.').map_or(stem, |(s, _)| s).trim();
    (!stem.is_empty()).then(|| stem.to_string())
}
