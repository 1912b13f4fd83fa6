//! Query compilation, evaluation and scoring.
//!
//! Boolean queries are compiled to postfix order by [`expression`] and run
//! by [`boolean`]. Ranked queries accumulate [`scorer`] weights per
//! document. Both resolve keywords to wordlist rows through [`lookup`].

pub mod boolean;
pub mod expression;
pub mod lookup;
pub mod scorer;

pub use self::boolean::{BooleanEvaluator, KeywordResolver};
pub use self::expression::{Operator, PostfixToken, to_postfix};
pub use self::lookup::{FuzzyConfig, FuzzyMatch, TermLookup};
pub use self::scorer::{ScoreAccumulator, Scorer, TfIdfScorer};
