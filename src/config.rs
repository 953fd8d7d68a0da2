use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::selection::budgeting::DEFAULT_CONTENT_BUDGET;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.tokenfactory.nebius.com/v1/";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct";

const PLACEHOLDER_API_KEY: &str = "your_key_here";

// Serializable, comparable, explicit defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Character budget for assembled file blocks.
    pub content_budget: usize,
    /// Files larger than this are skipped, never truncated.
    pub max_file_bytes: u64,
    pub max_tree_entries: usize,
    pub include_tree_overview: bool,
    pub fetch_concurrency: usize,

    #[serde(with = "secs")]
    pub tree_timeout: Duration,
    #[serde(with = "secs")]
    pub file_timeout: Duration,
    #[serde(with = "secs")]
    pub summarize_timeout: Duration,

    pub github_api_url: String,
    pub raw_content_url: String,
    #[serde(skip_serializing)]
    pub github_token: Option<String>,

    pub cache_dir: PathBuf,

    pub llm_base_url: String,
    pub llm_model: String,
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            content_budget: DEFAULT_CONTENT_BUDGET,
            max_file_bytes: 50_000,
            max_tree_entries: 500,
            include_tree_overview: true,
            fetch_concurrency: 8,
            tree_timeout: Duration::from_secs(30),
            file_timeout: Duration::from_secs(15),
            summarize_timeout: Duration::from_secs(120),
            github_api_url: "https://api.github.com".into(),
            raw_content_url: "https://raw.githubusercontent.com".into(),
            github_token: None,
            cache_dir: PathBuf::from("./cache_dir"),
            llm_base_url: DEFAULT_LLM_BASE_URL.into(),
            llm_model: DEFAULT_LLM_MODEL.into(),
            llm_api_key: None,
        }
    }
}

impl DigestConfig {
    /// Defaults overlaid with `GITHUB_TOKEN`, `NEBIUS_API_KEY` and `NEBIUS_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        config.github_token = non_empty("GITHUB_TOKEN");
        config.llm_api_key = non_empty("NEBIUS_API_KEY").filter(|k| k != PLACEHOLDER_API_KEY);
        if let Some(model) = non_empty("NEBIUS_MODEL") {
            config.llm_model = model;
        }
        config
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overlay_ignores_placeholder_key() {
        let env: HashMap<&str, &str> = [
            ("NEBIUS_API_KEY", "your_key_here"),
            ("NEBIUS_MODEL", "some/model"),
            ("GITHUB_TOKEN", "  "),
        ]
        .into_iter()
        .collect();

        let config = DigestConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.llm_api_key, None);
        assert_eq!(config.github_token, None);
        assert_eq!(config.llm_model, "some/model");
        assert_eq!(config.content_budget, 60_000);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = DigestConfig::default();
        config.llm_api_key = Some("secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"tree_timeout\":30"));
    }
}
