//! Local model backend (Ollama-style `/api/generate`).
//!
//! An unreachable server is reported as unavailable; anything else that goes
//! wrong after the request is sent is a failure.

use super::{truncate_chars, Provenance, SummaryBackend};
use crate::config::LocalModelConfig;
use crate::error::{ArxivError, BackendError, Result};
use crate::prompts::build_local_prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lead-ins some models put before the answer
const BOILERPLATE_PREFIXES: &[&str] = &["summary:", "answer:", "here"];

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Summarizer backed by a locally served model
pub struct LocalBackend {
    client: reqwest::Client,
    config: LocalModelConfig,
}

impl LocalBackend {
    pub fn new(config: LocalModelConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ArxivError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SummaryBackend for LocalBackend {
    fn provenance(&self) -> Provenance {
        Provenance::Local
    }

    async fn attempt(&self, text: &str) -> std::result::Result<String, BackendError> {
        let excerpt = truncate_chars(text, self.config.max_chars);

        let request = GenerateRequest {
            model: &self.config.model,
            prompt: build_local_prompt(&excerpt),
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Unavailable(format!("local model server not reachable: {}", e))
                } else {
                    BackendError::Failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Failed(format!("local model returned {}", status)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Failed(format!("malformed local model response: {}", e)))?;

        let cleaned = clean_model_output(&body.response);
        if cleaned.is_empty() {
            return Err(BackendError::Failed("empty local model response".to_string()));
        }

        Ok(cleaned)
    }
}

/// Drop a leading "Summary:"-style lead-in and trim.
///
/// When the text starts with one of the known prefixes (any case), everything
/// up to and including the first colon is discarded.
pub fn clean_model_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    if BOILERPLATE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        if let Some((_, rest)) = trimmed.split_once(':') {
            return rest.trim().to_string();
        }
    }

    trimmed.to_string()
}
