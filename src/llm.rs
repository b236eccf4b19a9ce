//! Client for an Ollama-compatible inference service.
//!
//! Only two endpoints are used: `/api/tags` as a reachability check and
//! `/api/generate` for streamed completions.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, GenerationOptions};
use crate::constants::{GENERATE_PATH, HEALTH_PATH};
use crate::error::SearchError;
use crate::stream::read_stream;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    raw: bool,
    options: &'a GenerationOptions,
}

#[derive(Debug, Default, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// What the service advertised on the health check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInfo {
    pub models: Vec<String>,
}

impl ServiceInfo {
    /// True when `model` is advertised, or nothing was advertised at all.
    pub fn offers(&self, model: &str) -> bool {
        self.models.is_empty()
            || self
                .models
                .iter()
                .any(|m| m == model || m.strip_suffix(":latest") == Some(model))
    }
}

#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    health_timeout: Duration,
    options: GenerationOptions,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Self {
        InferenceClient {
            http: reqwest::Client::new(),
            base_url: config.base_url().to_string(),
            model: config.model.clone(),
            health_timeout: config.health_timeout(),
            options: config.generation.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Probe `/api/tags` within the health timeout. Any failure, including
    /// a timeout, collapses into `ServiceUnavailable`.
    pub async fn check_health(&self) -> Result<ServiceInfo, SearchError> {
        let url = self.url(HEALTH_PATH);
        let response = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| SearchError::ServiceUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SearchError::ServiceUnavailable(format!(
                "{url}: status {status}"
            )));
        }

        // The tag list is informational; an odd body does not make the service down
        let tags = response.json::<TagsResponse>().await.unwrap_or_else(|e| {
            debug!(error = %e, "unparsable model list");
            TagsResponse::default()
        });

        let info = ServiceInfo {
            models: tags.models.into_iter().map(|m| m.name).collect(),
        };
        if !info.offers(&self.model) {
            warn!(model = %self.model, available = ?info.models, "configured model not advertised by service");
        }
        Ok(info)
    }

    /// Stream a completion for `prompt` and return the reconstructed text.
    pub async fn generate(&self, prompt: &str) -> Result<String, SearchError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            raw: true,
            options: &self.options,
        };

        let response = self
            .http
            .post(self.url(GENERATE_PATH))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Transport(format!(
                "generate returned {status}: {}",
                body.trim()
            )));
        }

        read_stream(response.bytes_stream()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_payload_shape() {
        let options = GenerationOptions::default();
        let request = GenerateRequest {
            model: "qwen2.5:7b",
            prompt: "Query: patience",
            stream: true,
            raw: true,
            options: &options,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["raw"], true);
        assert_eq!(json["model"], "qwen2.5:7b");
        for key in ["temperature", "num_predict", "top_k", "top_p", "repeat_penalty", "stop"] {
            assert!(json["options"].get(key).is_some(), "missing option {key}");
        }
        assert!(json["options"]["stop"].is_array());
    }

    #[test]
    fn offers_matches_latest_tag_and_empty_list() {
        let info = ServiceInfo {
            models: vec!["llama3:latest".into(), "qwen2.5:7b".into()],
        };
        assert!(info.offers("llama3"));
        assert!(info.offers("qwen2.5:7b"));
        assert!(!info.offers("mistral"));
        assert!(ServiceInfo::default().offers("anything"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalised() {
        let config = Config {
            ollama_url: "http://127.0.0.1:11434/".into(),
            ..Config::default()
        };
        let client = InferenceClient::new(&config);
        assert_eq!(client.url(HEALTH_PATH), "http://127.0.0.1:11434/api/tags");
    }
}
