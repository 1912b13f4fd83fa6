//! Stop word sets.
//!
//! Stop words are dropped by the tokenizer during indexing. The query path
//! tokenizes with an empty set so that a query for a stop word simply misses.
//!
//! # Examples
//!
//! ```
//! use halberd::analysis::stop::StopWords;
//!
//! let stop_words = StopWords::english();
//! assert!(stop_words.contains("the"));
//! assert!(!stop_words.contains("quick"));
//! ```

use std::sync::LazyLock;

use ahash::AHashSet;

/// Default English stop words list.
const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

static DEFAULT_ENGLISH_STOP_WORDS_SET: LazyLock<StopWords> =
    LazyLock::new(|| StopWords::from_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied()));

/// A case-folded set of words to drop during tokenization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StopWords {
    words: AHashSet<String>,
}

impl StopWords {
    /// An empty set; nothing is dropped.
    pub fn none() -> Self {
        StopWords::default()
    }

    /// The default English list.
    pub fn english() -> Self {
        DEFAULT_ENGLISH_STOP_WORDS_SET.clone()
    }

    /// Build a set from arbitrary words. Words are lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StopWords {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Check whether a (lowercased) token is a stop word.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_defaults() {
        let stop_words = StopWords::english();
        assert_eq!(stop_words.len(), DEFAULT_ENGLISH_STOP_WORDS.len());
        assert!(stop_words.contains("with"));
    }

    #[test]
    fn test_custom_words_are_case_folded() {
        let stop_words = StopWords::from_words(["Foo", "BAR", ""]);
        assert_eq!(stop_words.len(), 2);
        assert!(stop_words.contains("foo"));
        assert!(stop_words.contains("bar"));
    }

    #[test]
    fn test_none_is_empty() {
        assert!(StopWords::none().is_empty());
    }
}
