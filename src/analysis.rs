//! Text analysis for Halberd.
//!
//! Indexing and querying share one pipeline shape: a [`char_filter`] strips
//! markup, a [`tokenizer`] splits and case-folds, [`stop`] words are dropped,
//! and a [`stemmer`] reduces every token to the form stored in the wordlist.

pub mod char_filter;
pub mod stemmer;
pub mod stop;
pub mod tokenizer;

pub use char_filter::{CharFilter, MarkupStripCharFilter};
pub use stemmer::{NoStemmer, PorterStemmer, RuleTableStemmer, Stemmer, StemmerRegistry};
pub use stop::StopWords;
pub use tokenizer::{RegexTokenizer, Tokenizer, TokenizerContext};
