//! # Halberd
//!
//! A partitioned inverted-index search engine.
//!
//! ## Features
//!
//! - Wordlist/doclist indexes split by post type and language
//! - SQLite, filesystem and in-memory storage drivers
//! - Pluggable tokenizers and stemmers
//! - Ranked TF-IDF search and boolean search with `&`, `|`, `~`
//! - Fuzzy and as-you-type keyword matching
//! - Cancellable, resumable batch indexing
//!
//! ## Example
//!
//! ```
//! use halberd::indexer::{BuildStatus, Document, Indexer, IndexerConfig};
//! use halberd::partition::PartitionKey;
//! use halberd::search::{SearchConfig, Searcher};
//! use halberd::store::{IndexConfig, create_index};
//!
//! # fn main() -> halberd::error::Result<()> {
//! let store = create_index(&IndexConfig::new("memory"))?;
//!
//! let indexer = Indexer::new(store.clone(), IndexerConfig::default())?;
//! let rows = vec![
//!     Document::new().with_field("id", "1").with_field("title", "Red running shoes"),
//!     Document::new().with_field("id", "2").with_field("title", "Blue hat"),
//! ];
//! indexer.run(rows.into_iter(), &BuildStatus::new())?;
//!
//! let searcher = Searcher::open(store, SearchConfig::default())?;
//! let results = searcher.search(&PartitionKey::default(), "shoe", 10)?;
//! assert_eq!(results.ids, vec![1]);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod error;
pub mod indexer;
pub mod partition;
pub mod query;
pub mod search;
pub mod storage;
pub mod store;
pub mod util;

pub mod prelude {
    pub use crate::error::{HalberdError, Result};
    pub use crate::indexer::{BatchMonitor, BuildStatus, Document, Indexer, IndexerConfig};
    pub use crate::partition::PartitionKey;
    pub use crate::search::{SearchConfig, SearchResults, Searcher};
    pub use crate::store::{IndexConfig, IndexStore, StoreHandle, create_index};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
