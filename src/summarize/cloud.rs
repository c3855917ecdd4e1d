//! Hosted chat-completion backend (Groq, OpenAI-compatible).
//!
//! Without an API key the backend is unavailable and no request is sent.

use super::{truncate_chars, Provenance, SummaryBackend};
use crate::config::CloudModelConfig;
use crate::error::{ArxivError, BackendError, Result};
use crate::prompts::build_cloud_prompt;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible request structures
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage {
    role: &'static str,
    content: String,
}

/// OpenAI-compatible response structures
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Summarizer backed by a hosted chat-completion API
pub struct CloudBackend {
    client: reqwest::Client,
    config: CloudModelConfig,
}

impl CloudBackend {
    pub fn new(config: CloudModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArxivError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SummaryBackend for CloudBackend {
    fn provenance(&self) -> Provenance {
        Provenance::Cloud
    }

    async fn attempt(&self, text: &str) -> std::result::Result<String, BackendError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(BackendError::Unavailable("no API key configured".to_string()));
        };

        let excerpt = truncate_chars(text, self.config.max_chars);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: build_cloud_prompt(&excerpt),
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Failed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BackendError::Failed(format!("cloud model returned {}", status)));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Failed(format!("malformed cloud response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| BackendError::Failed("empty cloud response".to_string()))
    }
}
