//! Partitioned inverted-index storage.
//!
//! An [`IndexStore`] realizes the logical schema of an index: one wordlist
//! and one doclist per [`PartitionKey`], plus a shared info record and a
//! shared file map for indexes built from a directory. The
//! indexer and the query path only ever talk to this trait; concrete stores
//! are produced by a [`Connector`](connector::Connector).
//!
//! Writes that hit a uniqueness constraint fail with
//! [`HalberdError::Constraint`] and poison the store's statements. Every
//! later write fails with [`HalberdError::StatementPoisoned`] until
//! [`IndexStore::reset_statements`] is called.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{HalberdError, Result};
use crate::partition::PartitionKey;

pub mod connector;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod table;

pub use connector::{Connector, DriverKind, IndexConfig, create_connector, create_index};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use table::TableStore;

/// Surrogate id of a wordlist row, unique within its partition.
pub type TermId = i64;

/// External document id.
pub type DocId = i64;

/// A row of the term dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordlistEntry {
    pub id: TermId,
    pub term: String,
    pub num_hits: i64,
    pub num_docs: i64,
}

/// A `(term, document, occurrence count)` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    pub term_id: TermId,
    pub doc_id: DocId,
    pub hit_count: i64,
}

/// Keys of the shared info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKey {
    Stemmer,
    TotalDocuments,
    Driver,
}

impl InfoKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoKey::Stemmer => "stemmer",
            InfoKey::TotalDocuments => "total_documents",
            InfoKey::Driver => "driver",
        }
    }
}

impl fmt::Display for InfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How [`IndexStore::match_terms`] compares terms against a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch<'a> {
    /// Terms starting with the pattern.
    Prefix(&'a str),
    /// Terms containing the pattern anywhere.
    Infix(&'a str),
}

impl TermMatch<'_> {
    pub fn matches(&self, term: &str) -> bool {
        match self {
            TermMatch::Prefix(prefix) => term.starts_with(prefix),
            TermMatch::Infix(needle) => term.contains(needle),
        }
    }
}

/// Ordering of [`IndexStore::match_terms`] results. Ties are broken by term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrder {
    /// Most frequent first.
    HitsDesc,
    /// Shortest first, then most frequent.
    LengthThenHits,
}

impl TermOrder {
    /// Sort entries in place.
    pub fn sort(&self, entries: &mut [WordlistEntry]) {
        match self {
            TermOrder::HitsDesc => entries.sort_by(|a, b| {
                b.num_hits.cmp(&a.num_hits).then_with(|| a.term.cmp(&b.term))
            }),
            TermOrder::LengthThenHits => entries.sort_by(|a, b| {
                a.term
                    .chars()
                    .count()
                    .cmp(&b.term.chars().count())
                    .then_with(|| b.num_hits.cmp(&a.num_hits))
                    .then_with(|| a.term.cmp(&b.term))
            }),
        }
    }
}

/// Row counts of one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub terms: usize,
    pub postings: usize,
    pub documents: usize,
}

/// Storage of the wordlist, doclist and info tables.
///
/// Read methods on a partition that was never written return empty results.
pub trait IndexStore: Send + std::fmt::Debug {
    /// Which driver backs this store.
    fn driver(&self) -> DriverKind;

    /// Make sure the tables of `partition` exist and its statements are ready.
    fn prepare(&mut self, partition: &PartitionKey) -> Result<()>;

    /// Discard every prepared statement, clearing a poisoned state.
    fn reset_statements(&mut self) -> Result<()>;

    /// Whether a constraint violation has poisoned the statements.
    fn is_poisoned(&self) -> bool;

    /// Open an explicit transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Discard everything written since [`IndexStore::begin`].
    fn rollback(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;

    /// Insert a new term row and return its id.
    ///
    /// Fails with [`HalberdError::Constraint`] when the term already exists.
    fn insert_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<TermId>;

    /// Add to the counters of an existing term row.
    fn add_to_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<()>;

    /// Exact wordlist lookup.
    fn find_term(&self, partition: &PartitionKey, term: &str) -> Result<Option<WordlistEntry>>;

    /// Wordlist rows matching a prefix or infix pattern.
    fn match_terms(
        &self,
        partition: &PartitionKey,
        pattern: TermMatch<'_>,
        order: TermOrder,
        limit: usize,
    ) -> Result<Vec<WordlistEntry>>;

    /// Remove one posting's contribution from a term row: `num_docs - 1` and
    /// `num_hits - hit_count`.
    fn subtract_from_term(
        &mut self,
        partition: &PartitionKey,
        term_id: TermId,
        hit_count: i64,
    ) -> Result<()>;

    /// Delete every term row whose `num_hits` reached zero. Returns the
    /// number of rows removed.
    fn prune_terms(&mut self, partition: &PartitionKey) -> Result<usize>;

    /// Insert a posting.
    ///
    /// Fails with [`HalberdError::Constraint`] when `(term_id, doc_id)`
    /// already exists.
    fn insert_posting(&mut self, partition: &PartitionKey, posting: &Posting) -> Result<()>;

    /// All postings of one document.
    fn postings_for_doc(&self, partition: &PartitionKey, doc_id: DocId) -> Result<Vec<Posting>>;

    /// Remove all postings of one document. Returns the number removed.
    fn delete_postings_for_doc(&mut self, partition: &PartitionKey, doc_id: DocId)
    -> Result<usize>;

    /// Postings of several terms, grouped in the order of `term_ids` and by
    /// descending hit count within a term, truncated to `limit` overall.
    fn postings_for_terms(
        &self,
        partition: &PartitionKey,
        term_ids: &[TermId],
        limit: Option<usize>,
    ) -> Result<Vec<Posting>>;

    /// Distinct documents having at least one posting, minus those with a
    /// posting for `excluded`. Sorted ascending.
    fn documents_excluding(
        &self,
        partition: &PartitionKey,
        excluded: Option<TermId>,
    ) -> Result<Vec<DocId>>;

    fn info(&self, key: InfoKey) -> Result<Option<String>>;

    /// Insert or replace an info value.
    fn set_info(&mut self, key: InfoKey, value: &str) -> Result<()>;

    fn partition_stats(&self, partition: &PartitionKey) -> Result<PartitionStats>;

    /// Record the file a document was read from, replacing any earlier path.
    ///
    /// The file map is shared by all partitions, like the info record.
    fn set_file_path(&mut self, doc_id: DocId, path: &str) -> Result<()>;

    /// Paths recorded for `doc_ids`, in the same order. Ids without a
    /// recorded file are skipped.
    fn file_paths(&self, doc_ids: &[DocId]) -> Result<Vec<(DocId, String)>>;
}

/// A store shared by an indexer and any number of searchers.
pub type StoreHandle = Arc<Mutex<dyn IndexStore>>;

/// Wrap a concrete store into a [`StoreHandle`].
pub fn share<S: IndexStore + 'static>(store: S) -> StoreHandle {
    Arc::new(Mutex::new(store))
}

/// Tracks whether a constraint violation has poisoned a store's statements.
#[derive(Debug, Default)]
pub(crate) struct StatementGuard {
    poisoned_by: Option<&'static str>,
}

impl StatementGuard {
    /// Refuse writes while poisoned.
    pub(crate) fn check(&self, operation: &'static str) -> Result<()> {
        match self.poisoned_by {
            Some(cause) => Err(HalberdError::poisoned(format!(
                "{operation} refused, statements poisoned by {cause}"
            ))),
            None => Ok(()),
        }
    }

    /// Poison on a constraint violation, pass the result through.
    pub(crate) fn observe<T>(&mut self, operation: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_constraint_violation() {
                self.poisoned_by = Some(operation);
            }
        }
        result
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned_by.is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.poisoned_by = None;
    }
}
