//! Ranked and boolean search over one partition.

pub mod searcher;

pub use self::searcher::Searcher;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::lookup::{FuzzyConfig, TermLookup};
use crate::store::DocId;

/// Default cap on postings fetched per keyword.
pub const DEFAULT_MAX_DOCS: usize = 500;

/// Default number of wordlist rows considered in as-you-type mode.
pub const DEFAULT_AS_YOU_TYPE_WIDTH: usize = 100;

/// Configuration for search operations.
///
/// # Examples
///
/// ```
/// use halberd::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_fuzziness(true)
///     .with_fuzzy_distance(1)
///     .with_max_docs(100);
/// assert_eq!(config.fuzzy.max_distance, 1);
/// assert_eq!(config.fuzzy.prefix_length, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum postings fetched for every keyword but the last.
    pub max_docs: usize,
    /// Fall back to fuzzy matching when a keyword has no exact row.
    pub fuzziness: bool,
    pub fuzzy: FuzzyConfig,
    /// Match the last keyword as an incomplete word.
    pub as_you_type: bool,
    pub as_you_type_width: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_docs: DEFAULT_MAX_DOCS,
            fuzziness: false,
            fuzzy: FuzzyConfig::default(),
            as_you_type: false,
            as_you_type_width: DEFAULT_AS_YOU_TYPE_WIDTH,
        }
    }
}

impl SearchConfig {
    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs;
        self
    }

    pub fn with_fuzziness(mut self, fuzziness: bool) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    pub fn with_fuzzy_prefix_length(mut self, prefix_length: usize) -> Self {
        self.fuzzy.prefix_length = prefix_length;
        self
    }

    pub fn with_fuzzy_max_expansions(mut self, max_expansions: usize) -> Self {
        self.fuzzy.max_expansions = max_expansions;
        self
    }

    pub fn with_fuzzy_distance(mut self, max_distance: usize) -> Self {
        self.fuzzy.max_distance = max_distance;
        self
    }

    pub fn with_as_you_type(mut self, as_you_type: bool) -> Self {
        self.as_you_type = as_you_type;
        self
    }

    pub fn with_as_you_type_width(mut self, width: usize) -> Self {
        self.as_you_type_width = width;
        self
    }

    pub(crate) fn lookup(&self) -> TermLookup {
        TermLookup {
            fuzzy: self.fuzziness.then_some(self.fuzzy),
            as_you_type: self.as_you_type.then_some(self.as_you_type_width),
        }
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching documents, best first for ranked searches.
    pub ids: Vec<DocId>,
    /// Matching documents before truncation.
    pub total_hits: usize,
    pub elapsed: Duration,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_docs, 500);
        assert!(!config.fuzziness);
        assert_eq!(
            config.fuzzy,
            FuzzyConfig {
                prefix_length: 2,
                max_expansions: 50,
                max_distance: 2,
            }
        );
        assert!(!config.as_you_type);
        assert_eq!(config.as_you_type_width, 100);
    }

    #[test]
    fn test_lookup_follows_flags() {
        let lookup = SearchConfig::default().lookup();
        assert!(lookup.fuzzy.is_none());
        assert!(lookup.as_you_type.is_none());

        let lookup = SearchConfig::default()
            .with_fuzziness(true)
            .with_fuzzy_max_expansions(10)
            .with_as_you_type(true)
            .with_as_you_type_width(7)
            .lookup();
        assert_eq!(lookup.fuzzy.map(|fuzzy| fuzzy.max_expansions), Some(10));
        assert_eq!(lookup.as_you_type, Some(7));
    }

    #[test]
    fn test_config_from_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"fuzziness": true, "fuzzy": {"max_distance": 1}}"#).unwrap();
        assert!(config.fuzziness);
        assert_eq!(config.fuzzy.max_distance, 1);
        assert_eq!(config.fuzzy.prefix_length, 2);
        assert_eq!(config.max_docs, 500);
    }
}
