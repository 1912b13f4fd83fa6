//! Tokenizer implementations for text analysis.
//!
//! Tokenizers break normalized text into an ordered list of lowercase token
//! strings and drop stop words. They also publish the characters the boolean
//! query grammar reserves, so callers can tell an operator from a literal.
//!
//! # Available Tokenizers
//!
//! - [`regex::RegexTokenizer`] - Splits on non-word characters (default)
//! - [`unicode_word::UnicodeWordTokenizer`] - Uses Unicode word boundaries
//! - [`ngram::EdgeNgramTokenizer`] - Edge n-grams at index time, whole words at search time
//!
//! # Examples
//!
//! ```
//! use halberd::analysis::stop::StopWords;
//! use halberd::analysis::tokenizer::Tokenizer;
//! use halberd::analysis::tokenizer::regex::RegexTokenizer;
//!
//! let tokenizer = RegexTokenizer::default();
//! let tokens = tokenizer.tokenize("The Quick, brown fox", &StopWords::english()).unwrap();
//! assert_eq!(tokens, vec!["quick", "brown", "fox"]);
//! ```

use crate::analysis::stop::StopWords;
use crate::error::Result;

/// Characters reserved by the boolean query grammar.
pub const SPECIAL_CHARS: &[char] = &['&', '|', '~', '(', ')'];

/// The pipeline a tokenizer is currently serving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenizerContext {
    /// Document ingestion.
    #[default]
    Index,
    /// Query keyword extraction.
    Search,
}

/// Trait for tokenizers that convert text into token strings.
///
/// Custom tokenizers (n-gram, CJK-aware, ...) plug into both the indexer and
/// the searcher through this trait.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text, dropping empty tokens and stop words.
    ///
    /// Tokens are lowercased and returned in the order they appear.
    fn tokenize(&self, text: &str, stop_words: &StopWords) -> Result<Vec<String>>;

    /// Tell the tokenizer which pipeline it is serving.
    fn set_context(&mut self, context: TokenizerContext);

    /// Characters reserved by the query grammar.
    fn special_chars(&self) -> &'static [char] {
        SPECIAL_CHARS
    }

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Lowercase raw pieces and drop empties and stop words.
pub(crate) fn finish_tokens<'a, I>(pieces: I, stop_words: &StopWords) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    pieces
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
        .filter(|token| !stop_words.contains(token))
        .collect()
}

pub mod ngram;
pub mod regex;
pub mod unicode_word;

pub use ngram::EdgeNgramTokenizer;
pub use regex::RegexTokenizer;
pub use unicode_word::UnicodeWordTokenizer;
