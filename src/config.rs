//! Configuration loading from file, environment, and CLI arguments.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{IndexError, IndexResult, DEFAULT_TERMS_SIZE_LIMIT};

/// Index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Term sets larger than this are resolved with a range scan.
    #[serde(default = "default_terms_size_limit")]
    pub terms_size_limit: usize,
    /// Tokenizer settings for the default derivation pipeline.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Snapshot file used by the CLI.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,
    #[serde(default = "default_max_token_length")]
    pub max_token_length: usize,
    #[serde(default = "default_remove_stopwords")]
    pub remove_stopwords: bool,
    /// Cap on body terms per page (0 = unlimited).
    #[serde(default)]
    pub max_terms: usize,
}

fn default_terms_size_limit() -> usize {
    DEFAULT_TERMS_SIZE_LIMIT
}

fn default_snapshot_path() -> String {
    "index.mxi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_token_length() -> usize {
    2
}

fn default_max_token_length() -> usize {
    50
}

fn default_remove_stopwords() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            terms_size_limit: default_terms_size_limit(),
            tokenizer: TokenizerConfig::default(),
            snapshot_path: default_snapshot_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: default_min_token_length(),
            max_token_length: default_max_token_length(),
            remove_stopwords: default_remove_stopwords(),
            max_terms: 0,
        }
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &str) -> IndexResult<IndexConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| IndexError::Config(format!("Failed to read config file {path}: {e}")))?;
    parse_config(&content)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> IndexResult<IndexConfig> {
    toml::from_str(content).map_err(|e| IndexError::Config(format!("Failed to parse config: {e}")))
}

/// Resolve the snapshot path using priority order:
/// 1. Explicit path (CLI arg)
/// 2. MXI_SNAPSHOT environment variable
/// 3. `snapshot_path` from the config
pub fn resolve_snapshot_path(explicit: Option<&str>, config: &IndexConfig) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var("MXI_SNAPSHOT") {
        return PathBuf::from(env_path);
    }

    PathBuf::from(&config.snapshot_path)
}
