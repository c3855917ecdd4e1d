//! Custom error types for rustarxiv.
//!
//! This module defines the error types used by the search and export layers.
//! All functions return `Result<T, ArxivError>` instead of using `unwrap()`.
//! Summarization backends have their own narrower [`BackendError`], since
//! their failures are absorbed by the fallback chain and never surface here.

use thiserror::Error;

/// Main error type for rustarxiv operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum ArxivError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Atom feed parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by arXiv after all retries were spent
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code (or 400 for arXiv error entries)
        code: i32,
        /// Error message from API
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `ArxivError`
pub type Result<T> = std::result::Result<T, ArxivError>;

/// Why a summarization backend produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Dependency or credential missing; no attempt was made
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Attempt made but it errored or returned unusable output
    #[error("failed: {0}")]
    Failed(String),
}

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ArxivError::Parse(msg.to_string()))
    }
}
