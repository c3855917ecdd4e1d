//! Summarization prompts for paper abstracts.
//!
//! The local model gets a full instruction; the hosted model gets a terse one.

/// Instruction for the local model
/// Placeholder: {abstract_text}
pub const LOCAL_PROMPT_TEMPLATE: &str = r#"Summarize the following scientific abstract in exactly two sentences of plain language.
Say what the authors set out to do and what they found. Do not add an introduction.

Abstract:
{abstract_text}

Summary:"#;

/// Instruction prefix for the hosted model
pub const CLOUD_PROMPT_PREFIX: &str = "two sentences: ";

/// Build the local model prompt
pub fn build_local_prompt(abstract_text: &str) -> String {
    LOCAL_PROMPT_TEMPLATE.replace("{abstract_text}", abstract_text)
}

/// Build the hosted model user message
pub fn build_cloud_prompt(abstract_text: &str) -> String {
    format!("{}{}", CLOUD_PROMPT_PREFIX, abstract_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_local_prompt() {
        let prompt = build_local_prompt("We study graphs.");
        assert!(prompt.contains("We study graphs."));
        assert!(prompt.contains("two sentences"));
        assert!(!prompt.contains("{abstract_text}"));
    }

    #[test]
    fn test_build_cloud_prompt() {
        assert_eq!(build_cloud_prompt("abc"), "two sentences: abc");
    }
}
