//! Abstract summarization with an ordered fallback chain.
//!
//! Model backends are tried in priority order (local, then cloud). The first
//! answer longer than the usability threshold wins; if none qualifies, the
//! extractive summary of the abstract is returned. [`Summarizer::summarize`]
//! therefore never fails.

pub mod cloud;
pub mod extractive;
pub mod local;

pub use cloud::CloudBackend;
pub use extractive::fallback_summary;
pub use local::LocalBackend;

use crate::config::SummarizerConfig;
use crate::error::{BackendError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Marker appended when text is cut to a budget
pub const CONTINUATION: char = '…';

/// Which backend produced a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Local,
    Cloud,
    Extractive,
}

impl Provenance {
    /// Short label shown in front of summaries
    pub fn tag(&self) -> &'static str {
        match self {
            Provenance::Local => "phi3",
            Provenance::Cloud => "Groq",
            Provenance::Extractive => "basic",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Local => "local",
            Provenance::Cloud => "cloud",
            Provenance::Extractive => "extractive",
        };
        f.write_str(name)
    }
}

/// A summary and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub text: String,
    pub provenance: Provenance,
}

impl SummaryResult {
    /// `[<tag>] <text>` form used in reports
    pub fn tagged(&self) -> String {
        format!("[{}] {}", self.provenance.tag(), self.text)
    }
}

/// Outcome of one backend attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    Unavailable,
    Failed,
}

/// One entry in the per-call attempt trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryAttempt {
    pub backend: Provenance,
    pub status: AttemptStatus,
}

/// A summarization method behind a uniform contract.
///
/// Implementations return the cleaned candidate text or a [`BackendError`];
/// they never panic and never apply the usability threshold themselves.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Tag for text this backend produces
    fn provenance(&self) -> Provenance;

    /// Try once to summarize `text`
    async fn attempt(&self, text: &str) -> std::result::Result<String, BackendError>;
}

/// Fallback orchestrator
pub struct Summarizer {
    backends: Vec<Box<dyn SummaryBackend>>,
    min_usable_chars: usize,
}

impl Summarizer {
    /// Chain with an explicit backend list, tried in the given order.
    pub fn new(backends: Vec<Box<dyn SummaryBackend>>, min_usable_chars: usize) -> Self {
        Self {
            backends,
            min_usable_chars,
        }
    }

    /// Standard chain: local model, then cloud model, then extractive.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        config.validate()?;

        let backends: Vec<Box<dyn SummaryBackend>> = vec![
            Box::new(LocalBackend::new(config.local.clone())?),
            Box::new(CloudBackend::new(config.cloud.clone())?),
        ];

        Ok(Self::new(backends, config.min_usable_chars))
    }

    /// Summarize an abstract. Always returns a result.
    pub async fn summarize(&self, abstract_text: &str) -> SummaryResult {
        self.summarize_traced(abstract_text).await.0
    }

    /// Summarize and also report what each backend did.
    pub async fn summarize_traced(&self, abstract_text: &str) -> (SummaryResult, Vec<SummaryAttempt>) {
        let mut attempts = Vec::with_capacity(self.backends.len() + 1);

        if !abstract_text.trim().is_empty() {
            for backend in &self.backends {
                let provenance = backend.provenance();
                let status = match backend.attempt(abstract_text).await {
                    Ok(candidate) if self.is_usable(&candidate) => {
                        debug!(backend = %provenance, chars = candidate.chars().count(), "Summary accepted");
                        attempts.push(SummaryAttempt {
                            backend: provenance,
                            status: AttemptStatus::Succeeded,
                        });
                        return (
                            SummaryResult {
                                text: candidate,
                                provenance,
                            },
                            attempts,
                        );
                    }
                    Ok(candidate) => {
                        debug!(
                            backend = %provenance,
                            chars = candidate.chars().count(),
                            min = self.min_usable_chars,
                            "Summary too short, trying next backend"
                        );
                        AttemptStatus::Failed
                    }
                    Err(BackendError::Unavailable(reason)) => {
                        debug!(backend = %provenance, reason = %reason, "Backend unavailable");
                        AttemptStatus::Unavailable
                    }
                    Err(BackendError::Failed(reason)) => {
                        debug!(backend = %provenance, reason = %reason, "Backend failed");
                        AttemptStatus::Failed
                    }
                };
                attempts.push(SummaryAttempt {
                    backend: provenance,
                    status,
                });
            }
        }

        attempts.push(SummaryAttempt {
            backend: Provenance::Extractive,
            status: AttemptStatus::Succeeded,
        });
        (
            SummaryResult {
                text: fallback_summary(abstract_text),
                provenance: Provenance::Extractive,
            },
            attempts,
        )
    }

    fn is_usable(&self, candidate: &str) -> bool {
        candidate.chars().count() > self.min_usable_chars
    }
}

/// Cut `text` to `max_chars` characters, appending [`CONTINUATION`] if cut.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push(CONTINUATION);
            cut
        }
        None => text.to_string(),
    }
}
