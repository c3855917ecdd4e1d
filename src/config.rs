//! Summarizer configuration.
//!
//! Built once at startup and handed to the backends explicitly. The only
//! place that touches the process environment is [`CloudModelConfig::from_env`].

use crate::error::{ArxivError, Result};
use std::time::Duration;
use url::Url;

/// Environment variable holding the Groq API key
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default minimum length (in chars) for a model answer to be usable
pub const DEFAULT_MIN_USABLE_CHARS: usize = 20;

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default Groq OpenAI-compatible endpoint
pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";

/// Local model server settings (Ollama-style `/api/generate`)
#[derive(Debug, Clone)]
pub struct LocalModelConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Input budget before the abstract is cut
    pub max_chars: usize,
    /// `None` blocks until the server answers
    pub timeout: Option<Duration>,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: "phi3".to_string(),
            temperature: 0.3,
            max_chars: 800,
            timeout: None,
        }
    }
}

/// Hosted chat-completion settings
#[derive(Debug, Clone)]
pub struct CloudModelConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_chars: usize,
    pub timeout: Duration,
}

impl Default for CloudModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GROQ_URL.to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            temperature: 0.3,
            max_chars: 1000,
            timeout: Duration::from_secs(8),
        }
    }
}

impl CloudModelConfig {
    /// Defaults with the API key read from `GROQ_API_KEY`.
    ///
    /// Blank values count as missing.
    pub fn from_env() -> Self {
        Self::with_api_key(std::env::var(GROQ_API_KEY_ENV).ok())
    }

    /// Defaults with the given key, trimmed. Blank keys become `None`.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            api_key,
            ..Default::default()
        }
    }
}

/// Everything the fallback chain needs
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Answers must be strictly longer than this to be accepted
    pub min_usable_chars: usize,
    pub local: LocalModelConfig,
    pub cloud: CloudModelConfig,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            min_usable_chars: DEFAULT_MIN_USABLE_CHARS,
            local: LocalModelConfig::default(),
            cloud: CloudModelConfig::default(),
        }
    }
}

impl SummarizerConfig {
    /// Check endpoint URLs and input budgets.
    pub fn validate(&self) -> Result<()> {
        check_url("local model", &self.local.base_url)?;
        check_url("cloud model", &self.cloud.base_url)?;

        if self.local.max_chars == 0 {
            return Err(ArxivError::Config(
                "local model max_chars must be greater than 0".to_string(),
            ));
        }
        if self.cloud.max_chars == 0 {
            return Err(ArxivError::Config(
                "cloud model max_chars must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_url(what: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| ArxivError::Config(format!("Invalid {} URL '{}': {}", what, raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ArxivError::Config(format!(
            "Unsupported {} URL scheme: {}",
            what, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SummarizerConfig::default();
        assert_eq!(config.min_usable_chars, 20);
        assert_eq!(config.local.model, "phi3");
        assert_eq!(config.local.max_chars, 800);
        assert!(config.local.timeout.is_none());
        assert_eq!(config.cloud.max_chars, 1000);
        assert_eq!(config.cloud.timeout, Duration::from_secs(8));
        assert!(config.cloud.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = SummarizerConfig::default();
        config.local.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ArxivError::Config(_))));

        let mut config = SummarizerConfig::default();
        config.cloud.base_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(ArxivError::Config(_))));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        assert!(CloudModelConfig::with_api_key(None).api_key.is_none());
        assert!(CloudModelConfig::with_api_key(Some(String::new())).api_key.is_none());
        assert!(CloudModelConfig::with_api_key(Some(" \t\n".to_string())).api_key.is_none());
        assert_eq!(
            CloudModelConfig::with_api_key(Some("  gsk_test \n".to_string())).api_key.as_deref(),
            Some("gsk_test")
        );
    }

    #[test]
    fn test_from_env_reads_groq_key() {
        // only test touching this variable
        std::env::set_var(GROQ_API_KEY_ENV, "   ");
        assert!(CloudModelConfig::from_env().api_key.is_none());

        std::env::set_var(GROQ_API_KEY_ENV, " gsk_env ");
        assert_eq!(CloudModelConfig::from_env().api_key.as_deref(), Some("gsk_env"));

        std::env::remove_var(GROQ_API_KEY_ENV);
        assert!(CloudModelConfig::from_env().api_key.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = SummarizerConfig::default();
        config.cloud.max_chars = 0;
        assert!(config.validate().is_err());
    }
}
