//! # rustarxiv
//!
//! arXiv research assistant - search, summarize and export papers
//!
//! ## Modules
//!
//! - [`arxiv`] - arXiv API search and Atom parsing
//! - [`summarize`] - Abstract summaries through a local → cloud → extractive fallback chain
//! - [`report`] - Table, Markdown, JSON and CSV output
//! - [`config`] - Summarizer configuration
//! - [`prompts`] - Prompt templates for the model backends
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustarxiv::{arxiv, config::SummarizerConfig, summarize::Summarizer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = arxiv::ArxivClient::new()?;
//!     let papers = client.search("soft robotics", &Default::default()).await?;
//!
//!     let summarizer = Summarizer::from_config(&SummarizerConfig::default())?;
//!     for paper in &papers {
//!         println!("{}", summarizer.summarize(&paper.abstract_text).await.tagged());
//!     }
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod config;
pub mod error;
pub mod prompts;
pub mod report;
pub mod summarize;

pub use error::{ArxivError, BackendError, Result};
