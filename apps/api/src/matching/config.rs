//! Match configuration — vocabularies, weights and floors injected into the engine.
//!
//! `MatchConfig::default()` carries the production vocabularies. A JSON file may
//! override any subset of fields (`MATCH_CONFIG_PATH`); omitted fields keep their
//! defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A job title plus the alternative spellings that also identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// One rung of the education ladder. Higher `rank` means higher level; the
/// ladder may be listed in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationLevel {
    pub rank: u8,
    pub keywords: Vec<String>,
}

/// Sub-score weights of the `weighted` composite formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 0.6,
            experience: 0.25,
            education: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.education
    }
}

/// Placeholder values substituted when extraction finds nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    pub general_skills: String,
    pub unknown_name: String,
    pub unspecified_title: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Self {
            general_skills: "general skills".to_string(),
            unknown_name: "unknown".to_string(),
            unspecified_title: "unspecified position".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Ordered; extracted skills keep this order.
    pub skill_vocabulary: Vec<String>,
    /// Ordered; first matching title wins.
    pub title_vocabulary: Vec<TitleEntry>,
    /// Ordered highest level first; first hit wins during requirement extraction.
    pub education_levels: Vec<EducationLevel>,
    /// Phrases that mean "no prior experience expected".
    pub fresh_graduate_markers: Vec<String>,
    pub weights: ScoringWeights,
    /// Experience/education score used when there is nothing to compare.
    pub neutral_score: u32,
    pub weighted_floor: u32,
    pub skills_only_floor: u32,
    pub sentinels: Sentinels,
}

const DEFAULT_SKILLS: &[&str] = &[
    "JavaScript",
    "React",
    "Vue",
    "Angular",
    "Node.js",
    "TypeScript",
    "Python",
    "Java",
    "C++",
    "C#",
    "PHP",
    "Ruby",
    "Go",
    "Swift",
    "Rust",
    "HTML",
    "CSS",
    "SASS",
    "LESS",
    "Bootstrap",
    "Tailwind",
    "MongoDB",
    "MySQL",
    "PostgreSQL",
    "SQL",
    "NoSQL",
    "Redis",
    "AWS",
    "Azure",
    "Docker",
    "Kubernetes",
    "CI/CD",
    "Git",
    "Linux",
    "Windows",
    "MacOS",
    "Android",
    "iOS",
    "Figma",
    "Tableau",
    "Excel",
    "前端",
    "后端",
    "全栈",
    "开发",
    "测试",
    "数据分析",
    "机器学习",
    "人工智能",
    "算法",
    "产品原型",
    "用户研究",
    "市场营销",
    "内容运营",
    "UI",
    "UX",
];

const DEFAULT_TITLES: &[(&str, &[&str])] = &[
    ("前端开发工程师", &["前端工程师", "前端开发", "frontend engineer", "front-end engineer", "frontend developer"]),
    ("后端开发工程师", &["后端工程师", "后端开发", "backend engineer", "back-end engineer", "backend developer"]),
    ("全栈开发工程师", &["全栈工程师", "全栈开发", "full stack engineer", "full-stack engineer", "fullstack developer"]),
    ("软件工程师", &["software engineer", "software developer"]),
    ("产品经理", &["product manager"]),
    ("UI设计师", &["ui designer"]),
    ("UX设计师", &["ux designer"]),
    ("数据分析师", &["data analyst"]),
    ("人工智能工程师", &["ai engineer"]),
    ("机器学习工程师", &["machine learning engineer", "ml engineer"]),
    ("测试工程师", &["qa engineer", "test engineer"]),
    ("运维工程师", &["devops engineer", "site reliability engineer", "site reliability"]),
    ("项目经理", &["project manager"]),
    ("内容运营", &["content operations"]),
    ("市场营销", &["marketing specialist"]),
    ("用户研究", &["user researcher"]),
    ("产品设计", &["product designer"]),
];

const DEFAULT_EDUCATION: &[(u8, &[&str])] = &[
    (5, &["博士", "phd", "ph.d", "doctorate", "doctoral"]),
    (4, &["硕士", "研究生", "master's", "masters degree", "master of"]),
    (3, &["本科", "学士", "bachelor"]),
    (2, &["大专", "专科", "associate degree", "associate's degree"]),
    (1, &["高中", "中专", "high school"]),
];

const DEFAULT_FRESH_MARKERS: &[&str] = &["应届", "实习", "fresh graduate", "new grad", "internship"];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            skill_vocabulary: owned(DEFAULT_SKILLS),
            title_vocabulary: DEFAULT_TITLES
                .iter()
                .map(|(title, aliases)| TitleEntry {
                    title: title.to_string(),
                    aliases: owned(aliases),
                })
                .collect(),
            education_levels: DEFAULT_EDUCATION
                .iter()
                .map(|(rank, keywords)| EducationLevel {
                    rank: *rank,
                    keywords: owned(keywords),
                })
                .collect(),
            fresh_graduate_markers: owned(DEFAULT_FRESH_MARKERS),
            weights: ScoringWeights::default(),
            neutral_score: 70,
            weighted_floor: 0,
            skills_only_floor: 10,
            sentinels: Sentinels::default(),
        }
    }
}

impl MatchConfig {
    /// Loads a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read match config '{}'", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&raw)
            .with_context(|| format!("invalid match config '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Education levels, highest rank first. Callers that want "the highest
    /// level mentioned" scan this instead of `education_levels` directly.
    pub fn education_levels_by_rank(&self) -> Vec<&EducationLevel> {
        let mut levels: Vec<_> = self.education_levels.iter().collect();
        levels.sort_by(|a, b| b.rank.cmp(&a.rank));
        levels
    }

    pub fn validate(&self) -> Result<()> {
        if self.skill_vocabulary.iter().any(|s| s.trim().is_empty()) {
            anyhow::bail!("skill_vocabulary must not contain blank terms");
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("scoring weights must sum to 1.0 (got {sum})");
        }
        if self.neutral_score > 100 || self.weighted_floor > 100 || self.skills_only_floor > 100 {
            anyhow::bail!("neutral score and floors must be within 0-100");
        }
        Ok(())
    }
}
