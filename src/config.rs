use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Sampling options forwarded verbatim to `/api/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            temperature: GEN_TEMPERATURE,
            num_predict: GEN_NUM_PREDICT,
            top_k: GEN_TOP_K,
            top_p: GEN_TOP_P,
            repeat_penalty: GEN_REPEAT_PENALTY,
            stop: GEN_STOP.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama_url: String,
    pub model: String,
    pub data_dir: PathBuf,
    pub collections: Vec<String>,
    pub health_timeout_ms: u64,
    pub default_limit: usize,
    pub generation: GenerationOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            collections: COLLECTIONS.iter().map(|s| s.to_string()).collect(),
            health_timeout_ms: HEALTH_TIMEOUT_MS,
            default_limit: DEFAULT_LIMIT,
            generation: GenerationOptions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Config {
    /// Defaults overlaid with `OLLAMA_URL`, `OLLAMA_MODEL`, `HADITH_DATA_DIR`
    /// and `HEALTH_TIMEOUT_MS` when set.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Reads a JSON config file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = get("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.model = model;
        }
        if let Some(dir) = get("HADITH_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = get("HEALTH_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.health_timeout_ms = ms;
        }
        self
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.ollama_url.trim_end_matches('/')
    }
}
