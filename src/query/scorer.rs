//! Scoring for ranked search.
//!
//! Documents carry no length, so the BM25 length normalization collapses to
//! a constant and the weighting reduces to a saturated TF-IDF.

use std::fmt::Debug;

use ahash::AHashMap;

use crate::store::DocId;

/// Default term frequency saturation.
pub const DEFAULT_K1: f64 = 1.0;

/// Default length normalization weight.
pub const DEFAULT_B: f64 = 0.5;

/// Trait for per-keyword scorers.
pub trait Scorer: Send + Debug {
    /// Score one posting with the given term frequency.
    fn score(&self, term_freq: f64) -> f64;

    /// Get the name of this scorer.
    fn name(&self) -> &'static str;
}

/// TF-IDF scorer for one keyword.
///
/// `idf = ln(N / max(1, df))` and a posting with frequency `tf` scores
/// `idf * ((k1 + 1) * tf) / (k1 * ((1 - b) + b) + tf)`.
///
/// # Examples
///
/// ```
/// use halberd::query::scorer::{Scorer, TfIdfScorer};
///
/// let rare = TfIdfScorer::new(1, 100);
/// let common = TfIdfScorer::new(50, 100);
/// assert!(rare.score(2.0) > common.score(2.0));
/// ```
#[derive(Debug, Clone)]
pub struct TfIdfScorer {
    idf: f64,
    k1: f64,
    b: f64,
}

impl TfIdfScorer {
    /// Create a scorer for a keyword found in `doc_freq` of `total_docs`
    /// documents.
    pub fn new(doc_freq: u64, total_docs: u64) -> Self {
        Self::with_params(doc_freq, total_docs, DEFAULT_K1, DEFAULT_B)
    }

    pub fn with_params(doc_freq: u64, total_docs: u64, k1: f64, b: f64) -> Self {
        TfIdfScorer {
            idf: idf(doc_freq, total_docs),
            k1,
            b,
        }
    }

    pub fn idf(&self) -> f64 {
        self.idf
    }
}

impl Scorer for TfIdfScorer {
    fn score(&self, term_freq: f64) -> f64 {
        let numerator = (self.k1 + 1.0) * term_freq;
        let denominator = self.k1 * ((1.0 - self.b) + self.b) + term_freq;
        self.idf * (numerator / denominator)
    }

    fn name(&self) -> &'static str {
        "tf_idf"
    }
}

/// Inverse document frequency, `ln(N / max(1, df))`.
///
/// An empty collection is treated as holding one document.
pub fn idf(doc_freq: u64, total_docs: u64) -> f64 {
    let total = total_docs.max(1) as f64;
    (total / doc_freq.max(1) as f64).ln()
}

/// Sums per-document scores across keywords.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    scores: AHashMap<DocId, f64>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        ScoreAccumulator::default()
    }

    pub fn add(&mut self, doc_id: DocId, score: f64) {
        *self.scores.entry(doc_id).or_insert(0.0) += score;
    }

    /// Number of distinct documents scored.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Documents by descending score. Equal scores are ordered by id.
    pub fn into_ranked(self) -> Vec<(DocId, f64)> {
        let mut ranked: Vec<(DocId, f64)> = self.scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}
