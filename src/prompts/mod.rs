//! Prompt module for LLM-based operations.
//!
//! This module provides the prompt templates sent to summarization models.

pub mod summary;

pub use summary::*;
