//! Keyword Extractor — derives `JobRequirements` from free-text job descriptions.
//!
//! Pure and vocabulary-driven: every lookup goes through the injected `MatchConfig`,
//! so the resume parser and the matcher share one extraction path.
//! Extraction never fails; missing facts become sentinels or `None`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::config::MatchConfig;

/// Structured facts derived from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequirements {
    pub job_title: String,
    /// Never empty: falls back to the general-skills sentinel.
    pub skills: Vec<String>,
    pub experience_requirement: Option<String>,
    pub education_requirement: Option<String>,
}

static ZH_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*[-~～到至]\s*([0-9]+)\s*年(?:以上)?(?:的)?(?:工作|相关|开发)?经验")
        .expect("static regex")
});
static ZH_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*[年后]以上(?:的)?(?:工作|相关|开发)?经验").expect("static regex")
});
static ZH_MIN_AFTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"经验\s*([0-9]+)\s*[年后]以上").expect("static regex"));
static ZH_EXACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\s*年(?:的)?(?:工作|相关|开发)?经验").expect("static regex")
});
static EN_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*(?:-|–|~|to)\s*([0-9]+)\+?\s*years?(?:\s+of)?(?:\s+[\w.+#/-]+){0,2}?\s+experience")
        .expect("static regex")
});
static EN_MIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s*(\+)?\s*years?(?:\s+of)?(?:\s+[\w.+#/-]+){0,2}?\s+experience")
        .expect("static regex")
});
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("static regex"));

const ZH_FRESH_LABEL: &str = "应届/实习";
const EN_FRESH_LABEL: &str = "fresh graduate/intern";

/// Extracts the full requirement set from a job description.
pub fn extract_requirements(text: &str, config: &MatchConfig) -> JobRequirements {
    let mut skills = extract_skills(text, config);
    if skills.is_empty() {
        skills.push(config.sentinels.general_skills.clone());
    }

    JobRequirements {
        job_title: extract_job_title(text, config),
        skills,
        experience_requirement: extract_experience_requirement(text, config),
        education_requirement: extract_education_requirement(text, config),
    }
}

/// Vocabulary terms contained (case-insensitively) in `text`, in vocabulary order.
/// Returns an empty list rather than the sentinel.
pub fn extract_skills(text: &str, config: &MatchConfig) -> Vec<String> {
    let text_lower = text.to_lowercase();
    if text_lower.trim().is_empty() {
        return Vec::new();
    }

    let mut skills: Vec<String> = Vec::new();
    for term in &config.skill_vocabulary {
        if text_lower.contains(&term.to_lowercase()) && !skills.contains(term) {
            skills.push(term.clone());
        }
    }
    skills
}

/// First vocabulary title whose name or alias appears in `text`.
pub fn extract_job_title(text: &str, config: &MatchConfig) -> String {
    find_title(text, config).unwrap_or_else(|| config.sentinels.unspecified_title.clone())
}

/// Like `extract_job_title` but without the sentinel fallback.
pub fn find_title(text: &str, config: &MatchConfig) -> Option<String> {
    let text_lower = text.to_lowercase();
    config
        .title_vocabulary
        .iter()
        .find(|entry| {
            std::iter::once(&entry.title)
                .chain(entry.aliases.iter())
                .any(|name| !name.is_empty() && text_lower.contains(&name.to_lowercase()))
        })
        .map(|entry| entry.title.clone())
}

/// Experience requirement such as "3年以上", "3-5年", "3+ years" or a
/// fresh-graduate marker. Ranges are tried before open-ended patterns.
pub fn extract_experience_requirement(text: &str, config: &MatchConfig) -> Option<String> {
    let folded = fold_fullwidth_digits(text);
    let text: &str = &folded;
    if let Some(caps) = ZH_RANGE_RE.captures(text) {
        return Some(format!("{}-{}年", &caps[1], &caps[2]));
    }
    if let Some(caps) = ZH_MIN_RE.captures(text) {
        return Some(format!("{}年以上", &caps[1]));
    }
    if let Some(caps) = ZH_MIN_AFTER_RE.captures(text) {
        return Some(format!("{}年以上", &caps[1]));
    }
    if let Some(caps) = EN_RANGE_RE.captures(text) {
        return Some(format!("{}-{} years", &caps[1], &caps[2]));
    }
    if let Some(caps) = EN_MIN_RE.captures(text) {
        let suffix = if caps.get(2).is_some() { "+" } else { "" };
        return Some(format!("{}{suffix} years", &caps[1]));
    }
    if let Some(caps) = ZH_EXACT_RE.captures(text) {
        return Some(format!("{}年", &caps[1]));
    }

    fresh_graduate_marker(text, config).map(|marker| {
        if marker.is_ascii() {
            EN_FRESH_LABEL.to_string()
        } else {
            ZH_FRESH_LABEL.to_string()
        }
    })
}

/// First configured fresh-graduate marker found in `text`.
fn fresh_graduate_marker<'a>(text: &str, config: &'a MatchConfig) -> Option<&'a str> {
    let text_lower = text.to_lowercase();
    config
        .fresh_graduate_markers
        .iter()
        .find(|m| text_lower.contains(&m.to_lowercase()))
        .map(String::as_str)
}

/// Highest-ranked education keyword found in `text`, with an
/// "及以上" / " or above" suffix when the text says so right after the keyword.
pub fn extract_education_requirement(text: &str, config: &MatchConfig) -> Option<String> {
    let text_lower = text.to_lowercase();

    for level in config.education_levels_by_rank() {
        for keyword in &level.keywords {
            let keyword_lower = keyword.to_lowercase();
            if keyword_lower.is_empty() {
                continue;
            }
            if let Some(pos) = text_lower.find(&keyword_lower) {
                let tail: String = text_lower[pos + keyword_lower.len()..]
                    .chars()
                    .take(32)
                    .collect();
                let label = if has_or_above_suffix(&tail) {
                    if keyword.is_ascii() {
                        format!("{keyword} or above")
                    } else {
                        format!("{keyword}及以上")
                    }
                } else {
                    keyword.clone()
                };
                return Some(label);
            }
        }
    }
    None
}

fn has_or_above_suffix(tail: &str) -> bool {
    let trimmed = tail.trim_start();
    if trimmed.starts_with("及以上") || trimmed.starts_with("以上") {
        return true;
    }
    ["or above", "or higher", "and above"]
        .iter()
        .any(|phrase| tail.contains(phrase))
}

/// Rewrites full-width digits ("３年") to ASCII so the year patterns see them.
pub fn fold_fullwidth_digits(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ('０'..='９').contains(&c)) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
                _ => c,
            })
            .collect(),
    )
}

/// Year count in a free-text experience string: the first digit run, 0 for
/// fresh-graduate phrasing, 1 when nothing is recognizable. A run too long to
/// be a year count is treated as unrecognizable.
pub fn years_from_text(text: &str, config: &MatchConfig) -> u32 {
    let text = fold_fullwidth_digits(text);
    if let Some(years) = DIGITS_RE
        .find(&text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        return years;
    }
    if fresh_graduate_marker(&text, config).is_some() {
        return 0;
    }
    1
}

/// Highest education rank whose keyword appears in `text`; 0 if none.
pub fn education_rank(text: &str, config: &MatchConfig) -> u8 {
    let text_lower = text.to_lowercase();
    config
        .education_levels
        .iter()
        .filter(|level| {
            level
                .keywords
                .iter()
                .any(|k| !k.is_empty() && text_lower.contains(&k.to_lowercase()))
        })
        .map(|level| level.rank)
        .max()
        .unwrap_or(0)
}
