//! TOML configuration for the evaluation harness.
//!
//! Everything has a serde default so a partial file works; CLI flags
//! override whatever was loaded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use deckeval_core::DEFAULT_FORMAT_WEIGHT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Chat-completions endpoint.
    pub url: String,
    /// Model name.
    pub model: String,
    /// Environment variable holding the API key.
    pub key_env: String,
    /// Send dataset images to the model.
    pub multimodal: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per completion (1 = no retries).
    pub max_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            model: String::new(),
            key_env: "DECKEVAL_API_KEY".to_string(),
            multimodal: false,
            timeout_secs: 120,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub format_weight: f64,
    pub enforce_format: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            format_weight: DEFAULT_FORMAT_WEIGHT,
            enforce_format: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Concurrency ceiling for in-flight cases.
    pub max_concurrent: usize,
    /// Keep only records whose data_id contains this substring.
    pub dataset_filter: Option<String>,
    /// Extra search root for relative image paths.
    pub image_root: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            dataset_filter: None,
            image_root: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.key_env, "DECKEVAL_API_KEY");
        assert_eq!(config.run.max_concurrent, 4);
        assert!((config.scoring.format_weight - 0.1).abs() < f64::EPSILON);
        assert!(!config.scoring.enforce_format);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [api]
            url = "https://api.example.com/v1/chat/completions"
            model = "test-model"

            [run]
            max_concurrent = 16
            dataset_filter = "free_cell"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.model, "test-model");
        assert_eq!(config.api.key_env, "DECKEVAL_API_KEY");
        assert_eq!(config.run.max_concurrent, 16);
        assert_eq!(config.run.dataset_filter.as_deref(), Some("free_cell"));
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scoring]\nenforce_format = true").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.scoring.enforce_format);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/deckeval.toml")).is_err());
    }
}
