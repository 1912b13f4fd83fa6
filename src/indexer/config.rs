//! Indexer configuration.

use serde::{Deserialize, Serialize};

use crate::analysis::StopWords;

/// Default number of rows between two progress reports of a batch.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Settings of an [`Indexer`](crate::indexer::Indexer).
///
/// # Examples
///
/// ```
/// use halberd::indexer::IndexerConfig;
///
/// let config = IndexerConfig::default()
///     .with_primary_key("product_id")
///     .with_decode_entities(true);
/// assert_eq!(config.primary_key, "product_id");
/// assert!(config.exclude_primary_key);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Column holding the integer document id.
    pub primary_key: String,

    /// Leave the primary key column out of the indexed text.
    pub exclude_primary_key: bool,

    /// Words dropped before stemming. Empty by default.
    #[serde(skip)]
    pub stop_words: StopWords,

    /// Decode HTML entities after stripping markup.
    pub decode_entities: bool,

    /// Remember term ids for the duration of a batch.
    pub batch_term_cache: bool,

    /// Rows between two progress reports of a batch.
    pub progress_interval: u64,

    /// Skip batch rows that carry no language.
    pub multilingual: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            primary_key: "id".to_string(),
            exclude_primary_key: true,
            stop_words: StopWords::none(),
            decode_entities: false,
            batch_term_cache: true,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            multilingual: false,
        }
    }
}

impl IndexerConfig {
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    /// Index the primary key column like any other column.
    pub fn include_primary_key(mut self) -> Self {
        self.exclude_primary_key = false;
        self
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    pub fn with_decode_entities(mut self, decode: bool) -> Self {
        self.decode_entities = decode;
        self
    }

    pub fn with_batch_term_cache(mut self, enabled: bool) -> Self {
        self.batch_term_cache = enabled;
        self
    }

    /// Zero disables intermediate progress reports.
    pub fn with_progress_interval(mut self, rows: u64) -> Self {
        self.progress_interval = rows;
        self
    }

    pub fn with_multilingual(mut self, multilingual: bool) -> Self {
        self.multilingual = multilingual;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::default();
        assert_eq!(config.primary_key, "id");
        assert!(config.exclude_primary_key);
        assert!(config.stop_words.is_empty());
        assert!(!config.decode_entities);
        assert!(config.batch_term_cache);
        assert_eq!(config.progress_interval, 1000);
        assert!(!config.multilingual);
    }

    #[test]
    fn test_partial_json() {
        let config: IndexerConfig =
            serde_json::from_str(r#"{"primary_key": "ID", "multilingual": true}"#).unwrap();
        assert_eq!(config.primary_key, "ID");
        assert!(config.multilingual);
        assert!(config.batch_term_cache);
    }
}
