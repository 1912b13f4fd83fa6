//! Edge n-gram tokenizer implementation.
//!
//! At index time every word is expanded into its leading n-grams so that a
//! partially typed word matches exactly in the wordlist. At search time the
//! same tokenizer emits whole words, which are then looked up unchanged, so
//! a word longer than the largest n-gram is indexed whole as well.

use crate::analysis::stop::StopWords;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::analysis::tokenizer::{Tokenizer, TokenizerContext};
use crate::error::{HalberdError, Result};

/// A tokenizer that generates edge n-grams of every word.
///
/// # Examples
///
/// ```
/// use halberd::analysis::stop::StopWords;
/// use halberd::analysis::tokenizer::{EdgeNgramTokenizer, Tokenizer, TokenizerContext};
///
/// let mut tokenizer = EdgeNgramTokenizer::new(2, 4).unwrap();
/// let tokens = tokenizer.tokenize("Hello", &StopWords::none()).unwrap();
/// assert_eq!(tokens, vec!["he", "hel", "hell", "hello"]);
///
/// tokenizer.set_context(TokenizerContext::Search);
/// let tokens = tokenizer.tokenize("Hello", &StopWords::none()).unwrap();
/// assert_eq!(tokens, vec!["hello"]);
/// ```
#[derive(Clone, Debug)]
pub struct EdgeNgramTokenizer {
    /// Minimum n-gram size
    min_gram: usize,
    /// Maximum n-gram size
    max_gram: usize,
    words: RegexTokenizer,
    context: TokenizerContext,
}

impl EdgeNgramTokenizer {
    /// Create a new edge n-gram tokenizer.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_gram` is 0 or `max_gram` is less than `min_gram`.
    pub fn new(min_gram: usize, max_gram: usize) -> Result<Self> {
        if min_gram == 0 {
            return Err(HalberdError::analysis("min_gram must be at least 1"));
        }
        if max_gram < min_gram {
            return Err(HalberdError::analysis(format!(
                "max_gram ({max_gram}) must be >= min_gram ({min_gram})"
            )));
        }
        Ok(EdgeNgramTokenizer {
            min_gram,
            max_gram,
            words: RegexTokenizer::default(),
            context: TokenizerContext::Index,
        })
    }

    fn edge_grams(&self, word: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < self.min_gram {
            out.push(word.to_string());
            return;
        }
        let upper = self.max_gram.min(chars.len());
        for size in self.min_gram..=upper {
            out.push(chars[..size].iter().collect());
        }
        if chars.len() > self.max_gram {
            out.push(word.to_string());
        }
    }
}

impl Tokenizer for EdgeNgramTokenizer {
    fn tokenize(&self, text: &str, stop_words: &StopWords) -> Result<Vec<String>> {
        let words = self.words.tokenize(text, stop_words)?;
        if self.context == TokenizerContext::Search {
            return Ok(words);
        }

        let mut tokens = Vec::with_capacity(words.len() * (self.max_gram - self.min_gram + 2));
        for word in &words {
            self.edge_grams(word, &mut tokens);
        }
        Ok(tokens)
    }

    fn set_context(&mut self, context: TokenizerContext) {
        self.context = context;
    }

    fn name(&self) -> &'static str {
        "edge_ngram"
    }
}
