//! Identity stemmer.

use super::Stemmer;

/// Stemmer that returns words unchanged.
#[derive(Debug, Clone, Default)]
pub struct NoStemmer;

impl NoStemmer {
    pub fn new() -> Self {
        NoStemmer
    }
}

impl Stemmer for NoStemmer {
    fn stem(&self, word: &str) -> String {
        word.to_string()
    }

    fn name(&self) -> &'static str {
        "no"
    }
}
