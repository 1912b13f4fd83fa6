//! Ingestion: turning documents into wordlist rows and postings.
//!
//! Every column of a document goes through the same pipeline: strip markup,
//! tokenize, drop stop words, stem. The stems of all columns form one
//! multiset; each distinct stem becomes (or updates) a wordlist row and gets
//! one posting carrying its in-document count.
//!
//! Single-document operations ([`Indexer::insert`], [`Indexer::update`],
//! [`Indexer::delete`]) run in their own transaction unless the store already
//! has one open. Batches go through [`Indexer::run`].
//!
//! # Examples
//!
//! ```
//! use halberd::indexer::{Document, Indexer, IndexerConfig};
//! use halberd::partition::PartitionKey;
//! use halberd::store::{IndexConfig, create_index};
//!
//! # fn main() -> halberd::error::Result<()> {
//! let store = create_index(&IndexConfig::new("memory"))?;
//! let indexer = Indexer::new(store, IndexerConfig::default())?;
//!
//! let doc = Document::new()
//!     .with_field("id", "1")
//!     .with_field("title", "Running shoes");
//! indexer.insert(&doc, &PartitionKey::default())?;
//! assert_eq!(indexer.total_documents()?, 1);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod source;

pub use batch::{BatchMonitor, BatchReport, BuildStatus};
pub use config::IndexerConfig;
pub use source::{
    DirectorySource, Document, FileReader, JsonLinesSource, RowSource, TextFileReader,
};

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::analysis::stemmer::DEFAULT_STEMMER;
use crate::analysis::{
    CharFilter, MarkupStripCharFilter, RegexTokenizer, Stemmer, StemmerRegistry, Tokenizer,
    TokenizerContext,
};
use crate::error::{HalberdError, Result};
use crate::partition::PartitionKey;
use crate::store::{DocId, IndexStore, InfoKey, Posting, StoreHandle, TermId};

/// Term to id map of one batch, per partition. Never outlives the batch.
#[derive(Debug, Default)]
pub(crate) struct TermCache {
    enabled: bool,
    ids: AHashMap<PartitionKey, AHashMap<String, TermId>>,
}

impl TermCache {
    pub(crate) fn new(enabled: bool) -> Self {
        TermCache {
            enabled,
            ids: AHashMap::new(),
        }
    }

    fn get(&self, partition: &PartitionKey, term: &str) -> Option<TermId> {
        self.ids.get(partition)?.get(term).copied()
    }

    fn insert(&mut self, partition: &PartitionKey, term: &str, id: TermId) {
        if self.enabled {
            self.ids
                .entry(partition.clone())
                .or_default()
                .insert(term.to_string(), id);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.values().map(|ids| ids.len()).sum()
    }
}

/// Writes documents into an index.
pub struct Indexer {
    store: StoreHandle,
    config: IndexerConfig,
    tokenizer: Box<dyn Tokenizer>,
    stemmer: Box<dyn Stemmer>,
    char_filter: MarkupStripCharFilter,
    registry: StemmerRegistry,
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.name())
            .field("stemmer", &self.stemmer.name())
            .finish()
    }
}

impl Indexer {
    /// Create an indexer over `store`, stemming with the discriminator
    /// recorded in the index (Porter when there is none).
    pub fn new(store: StoreHandle, config: IndexerConfig) -> Result<Self> {
        let registry = StemmerRegistry::new();
        let stored = store.lock().info(InfoKey::Stemmer)?;
        let stemmer = registry.create(stored.as_deref().unwrap_or(DEFAULT_STEMMER))?;

        let mut tokenizer: Box<dyn Tokenizer> = Box::new(RegexTokenizer::new()?);
        tokenizer.set_context(TokenizerContext::Index);

        let char_filter = MarkupStripCharFilter::new().with_entity_decoding(config.decode_entities);

        Ok(Indexer {
            store,
            config,
            tokenizer,
            stemmer,
            char_filter,
            registry,
        })
    }

    /// Replace the tokenizer. It is switched to the indexing context.
    pub fn with_tokenizer(mut self, mut tokenizer: Box<dyn Tokenizer>) -> Self {
        tokenizer.set_context(TokenizerContext::Index);
        self.tokenizer = tokenizer;
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Discriminator of the stemmer in use.
    pub fn stemmer_name(&self) -> &'static str {
        self.stemmer.name()
    }

    /// Stem with `discriminator` from now on and record it in the index.
    ///
    /// An index that already records a stemmer keeps it: documents must be
    /// stemmed the way every later searcher will stem queries, so a
    /// differing request is logged and the recorded stemmer stays in use.
    pub fn set_stemmer(&mut self, discriminator: &str) -> Result<()> {
        let requested = self.registry.create(discriminator)?;

        let stemmer = {
            let mut store = self.store.lock();
            match store.info(InfoKey::Stemmer)? {
                None => {
                    store.set_info(InfoKey::Stemmer, requested.name())?;
                    requested
                }
                Some(stored) if self.registry.resolve(&stored) == Some(requested.name()) => {
                    requested
                }
                Some(stored) => {
                    warn!(
                        target: "halberd::indexer",
                        stored = %stored,
                        requested = requested.name(),
                        "index already records a different stemmer, keeping the stored one"
                    );
                    self.registry.create(&stored)?
                }
            }
        };

        self.stemmer = stemmer;
        Ok(())
    }

    /// Pick the stemmer by language name (`porter`, `german`, `hr`, ...).
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        self.set_stemmer(language)
    }

    /// Clean, tokenize and stem one column of text.
    pub fn stem_text(&self, text: &str) -> Result<Vec<String>> {
        let cleaned = self.char_filter.filter(text);
        let tokens = self.tokenizer.tokenize(&cleaned, &self.config.stop_words)?;
        Ok(tokens
            .iter()
            .filter(|token| !token.is_empty())
            .map(|token| self.stemmer.stem(token))
            .filter(|stem| !stem.is_empty())
            .collect())
    }

    /// Distinct stems of a document with their counts, in first-seen order.
    pub fn count_terms(&self, document: &Document) -> Result<Vec<(String, i64)>> {
        let mut terms: Vec<(String, i64)> = Vec::new();
        let mut positions: AHashMap<String, usize> = AHashMap::new();

        for (column, text) in document.fields() {
            if self.config.exclude_primary_key && column == self.config.primary_key {
                continue;
            }
            for stem in self.stem_text(text)? {
                match positions.get(&stem) {
                    Some(&index) => terms[index].1 += 1,
                    None => {
                        positions.insert(stem.clone(), terms.len());
                        terms.push((stem, 1));
                    }
                }
            }
        }
        Ok(terms)
    }

    /// Index one document into `partition` and bump the document counter.
    pub fn insert(&self, document: &Document, partition: &PartitionKey) -> Result<()> {
        let doc_id = document.doc_id(&self.config.primary_key)?;
        let mut store = self.store.lock();
        with_transaction(&mut *store, |store| {
            let mut cache = TermCache::new(false);
            self.index_document(store, partition, doc_id, document, &mut cache)?;
            let total = read_total_documents(store)?;
            write_total_documents(store, total + 1)
        })
    }

    /// Replace document `id`: delete it, then insert `document`.
    pub fn update(&self, id: DocId, document: &Document, partition: &PartitionKey) -> Result<()> {
        let mut store = self.store.lock();
        with_transaction(&mut *store, |store| {
            self.delete_document(store, id, partition)?;
            let doc_id = document.doc_id(&self.config.primary_key)?;
            let mut cache = TermCache::new(false);
            self.index_document(store, partition, doc_id, document, &mut cache)?;
            let total = read_total_documents(store)?;
            write_total_documents(store, total + 1)
        })
    }

    /// Remove every posting of document `id` from `partition`.
    ///
    /// The document counter only goes down when at least one term row was
    /// pruned, so it drifts when a deleted document shared all its terms
    /// with other documents.
    pub fn delete(&self, id: DocId, partition: &PartitionKey) -> Result<()> {
        let mut store = self.store.lock();
        with_transaction(&mut *store, |store| self.delete_document(store, id, partition))
    }

    /// The document counter kept in the info record.
    pub fn total_documents(&self) -> Result<i64> {
        read_total_documents(&*self.store.lock())
    }

    fn delete_document(
        &self,
        store: &mut dyn IndexStore,
        id: DocId,
        partition: &PartitionKey,
    ) -> Result<()> {
        store.prepare(partition)?;
        let postings = store.postings_for_doc(partition, id)?;
        for posting in &postings {
            store.subtract_from_term(partition, posting.term_id, posting.hit_count)?;
        }
        store.delete_postings_for_doc(partition, id)?;

        let pruned = store.prune_terms(partition)?;
        if pruned > 0 {
            let total = read_total_documents(store)?;
            write_total_documents(store, total - 1)?;
        }

        debug!(
            target: "halberd::indexer",
            %partition,
            doc_id = id,
            postings = postings.len(),
            pruned,
            "deleted document"
        );
        Ok(())
    }

    pub(crate) fn index_document(
        &self,
        store: &mut dyn IndexStore,
        partition: &PartitionKey,
        doc_id: DocId,
        document: &Document,
        cache: &mut TermCache,
    ) -> Result<()> {
        store.prepare(partition)?;
        let terms = self.count_terms(document)?;
        let ids = self.save_wordlist(store, partition, &terms, cache)?;
        self.save_doclist(store, partition, doc_id, &terms, &ids)?;
        if let Some(path) = document.source_path() {
            store.set_file_path(doc_id, path)?;
        }
        Ok(())
    }

    /// Upsert the wordlist rows of a document and return their ids.
    fn save_wordlist(
        &self,
        store: &mut dyn IndexStore,
        partition: &PartitionKey,
        terms: &[(String, i64)],
        cache: &mut TermCache,
    ) -> Result<Vec<TermId>> {
        let mut ids = Vec::with_capacity(terms.len());

        for (term, hits) in terms {
            let id = match store.insert_term(partition, term, *hits, 1) {
                Ok(id) => id,
                Err(err) if err.is_constraint_violation() => {
                    refresh_statements(store, partition)?;
                    store.add_to_term(partition, term, *hits, 1)?;
                    match cache.get(partition, term) {
                        Some(id) => id,
                        None => store
                            .find_term(partition, term)?
                            .map(|entry| entry.id)
                            .ok_or_else(|| {
                                HalberdError::storage(format!(
                                    "Term [{term}] disappeared during upsert"
                                ))
                            })?,
                    }
                }
                Err(err) => return Err(err),
            };
            cache.insert(partition, term, id);
            ids.push(id);
        }

        Ok(ids)
    }

    /// Write one posting per distinct term. Duplicates are logged and skipped.
    fn save_doclist(
        &self,
        store: &mut dyn IndexStore,
        partition: &PartitionKey,
        doc_id: DocId,
        terms: &[(String, i64)],
        ids: &[TermId],
    ) -> Result<()> {
        for ((term, hits), &term_id) in terms.iter().zip(ids) {
            let posting = Posting {
                term_id,
                doc_id,
                hit_count: *hits,
            };
            match store.insert_posting(partition, &posting) {
                Ok(()) => {}
                Err(err) if err.is_constraint_violation() => {
                    warn!(
                        target: "halberd::indexer",
                        %partition,
                        term = term.as_str(),
                        doc_id,
                        error = %err,
                        "duplicate posting skipped"
                    );
                    refresh_statements(store, partition)?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Throw away poisoned statements and prepare fresh ones.
fn refresh_statements(store: &mut dyn IndexStore, partition: &PartitionKey) -> Result<()> {
    store.reset_statements()?;
    store.prepare(partition)
}

/// Run `f` inside a transaction, unless one is already open.
fn with_transaction<T>(
    store: &mut dyn IndexStore,
    f: impl FnOnce(&mut dyn IndexStore) -> Result<T>,
) -> Result<T> {
    if store.in_transaction() {
        return f(store);
    }

    store.begin()?;
    match f(&mut *store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback() {
                warn!(target: "halberd::indexer", error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

pub(crate) fn read_total_documents(store: &dyn IndexStore) -> Result<i64> {
    Ok(store
        .info(InfoKey::TotalDocuments)?
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0))
}

/// Store the counter, clamped at zero.
pub(crate) fn write_total_documents(store: &mut dyn IndexStore, total: i64) -> Result<()> {
    store.set_info(InfoKey::TotalDocuments, &total.max(0).to_string())
}
