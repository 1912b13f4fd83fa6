//! Command line argument parsing for the halberd CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::partition::PartitionKey;
use crate::search::SearchConfig;
use crate::store::IndexConfig;

/// Halberd - a partitioned inverted-index search engine
#[derive(Parser, Debug, Clone)]
#[command(name = "halberd")]
#[command(about = "Build and query partitioned inverted indexes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct HalberdArgs {
    /// Verbosity level (repeat for more: -v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl HalberdArgs {
    /// Get the effective verbosity level (0 = quiet, 1 = normal).
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Default log filter for the effective verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an index, or record its driver in an existing one
    #[command(name = "create-index")]
    CreateIndex(CreateIndexArgs),

    /// Index rows from a JSON-lines file or a directory of text files
    Index(IndexArgs),

    /// Remove a document from a partition
    Delete(DeleteArgs),

    /// Ranked free-text search
    Search(SearchArgs),

    /// Boolean search with `&`, `|`, `~` and parentheses
    #[command(name = "search-boolean")]
    SearchBoolean(SearchArgs),

    /// Show index and partition statistics
    Stats(StatsArgs),
}

/// Where the index lives.
#[derive(Args, Debug, Clone, Default)]
pub struct IndexLocation {
    /// JSON file with an index configuration; flags below override it
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Storage driver (sqlite, filesystem, memory)
    #[arg(short, long, env = "HALBERD_DRIVER")]
    pub driver: Option<String>,

    /// Directory holding the index
    #[arg(short, long, value_name = "DIR", env = "HALBERD_STORAGE")]
    pub storage: Option<PathBuf>,

    /// Index name
    #[arg(short = 'n', long)]
    pub index_name: Option<String>,

    /// Prefix of every table name
    #[arg(long)]
    pub table_prefix: Option<String>,
}

impl IndexLocation {
    /// Merge the configuration file (if any) with the command line flags.
    pub fn to_config(&self) -> Result<IndexConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => IndexConfig::default(),
        };
        if let Some(driver) = &self.driver {
            config.driver = Some(driver.clone());
        }
        if let Some(storage) = &self.storage {
            config.storage = storage.clone();
        }
        if let Some(index_name) = &self.index_name {
            config.index_name = index_name.clone();
        }
        if let Some(table_prefix) = &self.table_prefix {
            config.table_prefix = table_prefix.clone();
        }
        Ok(config)
    }
}

/// Which partition to address.
#[derive(Args, Debug, Clone, Default)]
pub struct PartitionArgs {
    /// Two-letter language code
    #[arg(long)]
    pub lang: Option<String>,

    /// Post type (the default post type adds no table suffix)
    #[arg(long)]
    pub post_type: Option<String>,
}

impl PartitionArgs {
    pub fn to_key(&self) -> Result<PartitionKey> {
        PartitionKey::new(
            self.post_type.as_deref().unwrap_or_default(),
            self.lang.as_deref().unwrap_or_default(),
        )
    }
}

/// Arguments for creating an index
#[derive(Parser, Debug, Clone)]
pub struct CreateIndexArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    /// Stemmer discriminator recorded in a new index (porter, german, no, ...)
    #[arg(long)]
    pub stemmer: Option<String>,
}

/// Arguments for indexing rows
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    /// JSON-lines file, one object per row
    #[arg(long, value_name = "FILE", conflicts_with = "dir", required_unless_present = "dir")]
    pub jsonl: Option<PathBuf>,

    /// Directory whose files are indexed as `id`, `path`, `content` rows
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// File extensions accepted from --dir (all files when empty)
    #[arg(long, value_delimiter = ',', requires = "dir")]
    pub extensions: Vec<String>,

    /// Primary key column
    #[arg(long, default_value = "id")]
    pub primary_key: String,

    /// Index the primary key column's text too
    #[arg(long)]
    pub include_primary_key: bool,

    /// Drop common English stop words
    #[arg(long)]
    pub english_stop_words: bool,

    /// Decode HTML entities while stripping markup
    #[arg(long)]
    pub decode_entities: bool,

    /// Skip rows without a `lang` column
    #[arg(long)]
    pub multilingual: bool,

    /// Resolve every term id through the store
    #[arg(long)]
    pub no_term_cache: bool,

    /// Rows between progress reports
    #[arg(long, default_value = "1000")]
    pub progress_interval: u64,

    /// Continue a running count from this many rows
    #[arg(long, default_value = "0")]
    pub resume_from: u64,
}

/// Arguments for deleting a document
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Document id
    #[arg(value_name = "ID")]
    pub id: i64,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Query phrase
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of ids to return
    #[arg(short, long, default_value = "100")]
    pub limit: usize,

    /// Postings fetched per keyword
    #[arg(long)]
    pub max_docs: Option<usize>,

    /// Fall back to fuzzy matching for unknown keywords
    #[arg(long)]
    pub fuzzy: bool,

    /// Characters a fuzzy candidate must share with the keyword
    #[arg(long)]
    pub fuzzy_prefix_length: Option<usize>,

    /// Fuzzy candidates considered per keyword
    #[arg(long)]
    pub fuzzy_max_expansions: Option<usize>,

    /// Largest accepted edit distance
    #[arg(long)]
    pub fuzzy_distance: Option<usize>,

    /// Treat the last keyword as incomplete
    #[arg(long)]
    pub as_you_type: bool,

    /// Wordlist rows considered in as-you-type mode
    #[arg(long)]
    pub as_you_type_width: Option<usize>,
}

impl SearchArgs {
    pub fn to_config(&self) -> SearchConfig {
        let mut config = SearchConfig::default()
            .with_fuzziness(self.fuzzy)
            .with_as_you_type(self.as_you_type);
        if let Some(max_docs) = self.max_docs {
            config = config.with_max_docs(max_docs);
        }
        if let Some(prefix_length) = self.fuzzy_prefix_length {
            config = config.with_fuzzy_prefix_length(prefix_length);
        }
        if let Some(max_expansions) = self.fuzzy_max_expansions {
            config = config.with_fuzzy_max_expansions(max_expansions);
        }
        if let Some(distance) = self.fuzzy_distance {
            config = config.with_fuzzy_distance(distance);
        }
        if let Some(width) = self.as_you_type_width {
            config = config.with_as_you_type_width(width);
        }
        config
    }
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub location: IndexLocation,

    #[command(flatten)]
    pub partition: PartitionArgs,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable key/value lines
    Human,
    /// JSON document
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        HalberdArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let args = HalberdArgs::parse_from([
            "halberd", "-vv", "search", "--driver", "memory", "--lang", "en", "--fuzzy",
            "--fuzzy-distance", "1", "red shoes",
        ]);
        assert_eq!(args.log_filter(), "debug");

        let Command::Search(search) = args.command else {
            panic!("expected search");
        };
        assert_eq!(search.query, "red shoes");
        assert_eq!(search.limit, 100);
        assert_eq!(search.partition.to_key().unwrap(), PartitionKey::new("", "en").unwrap());

        let config = search.to_config();
        assert!(config.fuzziness);
        assert_eq!(config.fuzzy.max_distance, 1);
        assert_eq!(config.fuzzy.prefix_length, 2);
    }

    #[test]
    fn test_index_requires_a_source() {
        assert!(HalberdArgs::try_parse_from(["halberd", "index", "--driver", "memory"]).is_err());
        assert!(
            HalberdArgs::try_parse_from([
                "halberd", "index", "--jsonl", "a.jsonl", "--dir", "docs"
            ])
            .is_err()
        );
        assert!(HalberdArgs::try_parse_from(["halberd", "index", "--dir", "docs"]).is_ok());
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = HalberdArgs::parse_from(["halberd", "-q", "-vvv", "stats"]);
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.log_filter(), "error");
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        std::fs::write(&path, r#"{"driver": "sqlite", "index_name": "products"}"#).unwrap();

        let location = IndexLocation {
            config: Some(path),
            driver: Some("memory".to_string()),
            ..Default::default()
        };
        let config = location.to_config().unwrap();
        assert_eq!(config.driver.as_deref(), Some("memory"));
        assert_eq!(config.index_name, "products");
    }
}
