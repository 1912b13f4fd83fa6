//! Unicode word tokenizer implementation.
//!
//! Splits text using Unicode word boundary rules (UAX #29), keeping only
//! segments that contain at least one alphanumeric character.
//!
//! # Examples
//!
//! ```
//! use halberd::analysis::stop::StopWords;
//! use halberd::analysis::tokenizer::Tokenizer;
//! use halberd::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens = tokenizer.tokenize("Café, résumé!", &StopWords::none()).unwrap();
//! assert_eq!(tokens, vec!["café", "résumé"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::stop::StopWords;
use crate::analysis::tokenizer::{Tokenizer, TokenizerContext, finish_tokens};
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer {
    context: TokenizerContext,
}

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer::default()
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str, stop_words: &StopWords) -> Result<Vec<String>> {
        Ok(finish_tokens(text.unicode_words(), stop_words))
    }

    fn set_context(&mut self, context: TokenizerContext) {
        self.context = context;
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}
