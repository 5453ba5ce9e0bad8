use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::matching::scoring::ScoringStrategy;

const DEFAULT_AIRTABLE_TABLE: &str = "resumepool";

/// Credentials for the Airtable-backed resume store.
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table_name: String,
}

/// Application configuration loaded from environment variables.
/// Everything except the port has a working default; without Airtable
/// credentials the service runs on the in-memory store.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub airtable: Option<AirtableConfig>,
    pub anthropic_api_key: Option<String>,
    /// Use the LLM-assisted scorer (requires `ANTHROPIC_API_KEY`).
    pub enable_llm_scoring: bool,
    /// Bounds every external call: store fetch/save and LLM scoring.
    pub request_timeout: Duration,
    pub match_config_path: Option<PathBuf>,
    pub default_strategy: ScoringStrategy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let airtable = match var("AIRTABLE_API_KEY") {
            Some(api_key) => Some(AirtableConfig {
                api_key,
                base_id: var("AIRTABLE_BASE_ID").context(
                    "AIRTABLE_BASE_ID must be set when AIRTABLE_API_KEY is provided",
                )?,
                table_name: var("AIRTABLE_TABLE_NAME")
                    .unwrap_or_else(|| DEFAULT_AIRTABLE_TABLE.to_string()),
            }),
            None => None,
        };

        let timeout_secs = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        let default_strategy = match var("MATCH_STRATEGY") {
            Some(s) => s
                .parse::<ScoringStrategy>()
                .map_err(anyhow::Error::msg)
                .context("MATCH_STRATEGY must be 'weighted' or 'skills_only'")?,
            None => ScoringStrategy::default(),
        };

        Ok(Config {
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            airtable,
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            enable_llm_scoring: var("ENABLE_LLM_SCORING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            request_timeout: Duration::from_secs(timeout_secs),
            match_config_path: var("MATCH_CONFIG_PATH").map(PathBuf::from),
            default_strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_without_any_vars() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert!(config.airtable.is_none());
        assert!(config.anthropic_api_key.is_none());
        assert!(!config.enable_llm_scoring);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.default_strategy, ScoringStrategy::Weighted);
    }

    #[test]
    fn test_airtable_requires_base_id() {
        let err = from_map(&[("AIRTABLE_API_KEY", "pat123")]).unwrap_err();
        assert!(err.to_string().contains("AIRTABLE_BASE_ID"));
    }

    #[test]
    fn test_airtable_table_defaults() {
        let config = from_map(&[("AIRTABLE_API_KEY", "pat123"), ("AIRTABLE_BASE_ID", "app1")]).unwrap();
        let airtable = config.airtable.unwrap();
        assert_eq!(airtable.base_id, "app1");
        assert_eq!(airtable.table_name, "resumepool");
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(from_map(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_strategy_and_llm_flags() {
        let config = from_map(&[
            ("MATCH_STRATEGY", "skills_only"),
            ("ENABLE_LLM_SCORING", "true"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.default_strategy, ScoringStrategy::SkillsOnly);
        assert!(config.enable_llm_scoring);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_values_treated_as_unset() {
        let config = from_map(&[("ANTHROPIC_API_KEY", "  ")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
    }
}
