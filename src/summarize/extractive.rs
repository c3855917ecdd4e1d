//! Extractive fallback: the first two sentences of the abstract.
//!
//! Pure and network-free, so it is the terminal step of the chain.

use super::truncate_chars;

/// Output budget before the continuation marker
pub const MAX_SUMMARY_CHARS: usize = 350;

/// Number of leading sentences kept
const SENTENCES_KEPT: usize = 2;

/// Summarize by keeping the leading sentences of `text`.
///
/// Newlines become spaces, the text is split on `.`, blank fragments are
/// dropped and the first two are joined with `". "`. A closing period is
/// restored only when sentences were dropped. The result is cut to
/// [`MAX_SUMMARY_CHARS`] characters. Empty input gives an empty string.
pub fn fallback_summary(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");

    let sentences: Vec<&str> = flat
        .trim()
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut summary = sentences
        .iter()
        .take(SENTENCES_KEPT)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");

    if sentences.len() > SENTENCES_KEPT {
        summary.push('.');
    }

    truncate_chars(&summary, MAX_SUMMARY_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_sentences() {
        assert_eq!(
            fallback_summary("Sentence one. Sentence two. Sentence three."),
            "Sentence one. Sentence two."
        );
    }

    #[test]
    fn test_two_sentences_keep_no_period() {
        assert_eq!(fallback_summary("First idea. Second idea."), "First idea. Second idea");
    }

    #[test]
    fn test_newlines_and_blank_fragments() {
        let text = "We propose\na method...\n\nIt works. Really.";
        assert_eq!(fallback_summary(text), "We propose a method. It works.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(fallback_summary(""), "");
        assert_eq!(fallback_summary(" \n "), "");
        assert_eq!(fallback_summary("..."), "");
    }

    #[test]
    fn test_length_budget() {
        let long_sentence = "word ".repeat(200);
        let text = format!("{}. Second. Third.", long_sentence);
        let summary = fallback_summary(&text);
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS + 1);
        assert!(summary.ends_with('…'));
        assert!(summary.starts_with("word word"));
    }

    #[test]
    fn test_only_leading_sentences_used() {
        let summary = fallback_summary("Alpha. Beta. Gamma. Delta.");
        assert!(!summary.contains("Gamma"));
        assert!(!summary.contains("Delta"));
    }
}
