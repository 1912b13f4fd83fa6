//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use crate::analysis::stop::StopWords;
use crate::analysis::tokenizer::{Tokenizer, TokenizerContext, finish_tokens};
use crate::error::{HalberdError, Result};

/// Separator pattern of the default tokenizer: anything that is not a
/// letter, number, connector, dash or `@`.
pub const DEFAULT_SEPARATOR_PATTERN: &str = r"[^\p{L}\p{N}\p{Pc}\p{Pd}@]+";

/// A regex-based tokenizer.
///
/// By default it splits on [`DEFAULT_SEPARATOR_PATTERN`] (gaps mode). A
/// tokenizer built with [`RegexTokenizer::with_pattern`] extracts the matches
/// of the pattern instead.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
    /// Whether the pattern describes separators (gaps) instead of tokens
    gaps: bool,
    context: TokenizerContext,
}

impl RegexTokenizer {
    /// Create a new regex tokenizer with the default separator pattern.
    pub fn new() -> Result<Self> {
        Self::with_gaps(DEFAULT_SEPARATOR_PATTERN)
    }

    /// Create a tokenizer whose pattern matches the tokens themselves.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: false,
            context: TokenizerContext::default(),
        })
    }

    /// Create a tokenizer whose pattern matches the separators between tokens.
    pub fn with_gaps(pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            pattern: Arc::new(compile(pattern)?),
            gaps: true,
            context: TokenizerContext::default(),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Check if this tokenizer splits on gaps.
    pub fn gaps(&self) -> bool {
        self.gaps
    }

    pub fn context(&self) -> TokenizerContext {
        self.context
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| HalberdError::analysis(format!("Invalid regex pattern: {e}")))
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new().expect("Default separator pattern should be valid")
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str, stop_words: &StopWords) -> Result<Vec<String>> {
        let tokens = if self.gaps {
            finish_tokens(self.pattern.split(text), stop_words)
        } else {
            finish_tokens(self.pattern.find_iter(text).map(|m| m.as_str()), stop_words)
        };
        Ok(tokens)
    }

    fn set_context(&mut self, context: TokenizerContext) {
        self.context = context;
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tokenizer_splits_and_lowercases() {
        let tokenizer = RegexTokenizer::default();
        let tokens = tokenizer
            .tokenize("Hello, World! e-mail me@example.com", &StopWords::none())
            .unwrap();

        assert_eq!(tokens, vec!["hello", "world", "e-mail", "me@example", "com"]);
    }

    #[test]
    fn test_stop_words_removed() {
        let tokenizer = RegexTokenizer::default();
        let tokens = tokenizer
            .tokenize("the cat and the hat", &StopWords::english())
            .unwrap();

        assert_eq!(tokens, vec!["cat", "hat"]);
    }

    #[test]
    fn test_operators_are_separators() {
        let tokenizer = RegexTokenizer::default();
        let tokens = tokenizer
            .tokenize("(red & blue) | ~green", &StopWords::none())
            .unwrap();

        assert_eq!(tokens, vec!["red", "blue", "green"]);
        assert!(tokenizer.special_chars().contains(&'&'));
        assert!(tokenizer.special_chars().contains(&'~'));
    }

    #[test]
    fn test_match_mode() {
        let tokenizer = RegexTokenizer::with_pattern(r"\d+").unwrap();
        let tokens = tokenizer
            .tokenize("sku 123 and 456", &StopWords::none())
            .unwrap();

        assert_eq!(tokens, vec!["123", "456"]);
        assert!(!tokenizer.gaps());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RegexTokenizer::with_pattern("(").is_err());
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(RegexTokenizer::default().name(), "regex");
    }
}
