//! Searcher over an index store.

use std::time::Instant;

use tracing::debug;

use crate::analysis::stemmer::DEFAULT_STEMMER;
use crate::analysis::{RegexTokenizer, Stemmer, StemmerRegistry, StopWords, Tokenizer, TokenizerContext};
use crate::error::Result;
use crate::indexer::read_total_documents;
use crate::partition::PartitionKey;
use crate::query::boolean::{BooleanEvaluator, KeywordResolver};
use crate::query::expression::{last_keyword, query_tokens, to_postfix};
use crate::query::lookup::TermLookup;
use crate::query::scorer::{ScoreAccumulator, Scorer, TfIdfScorer};
use crate::search::{SearchConfig, SearchResults};
use crate::store::{DocId, IndexStore, InfoKey, StoreHandle};

/// Runs ranked and boolean queries against one store.
///
/// The stemmer is the one recorded in the index, so query keywords are
/// reduced exactly like indexed text. Queries never drop stop words.
///
/// # Examples
///
/// ```
/// use halberd::indexer::{Document, Indexer, IndexerConfig};
/// use halberd::partition::PartitionKey;
/// use halberd::search::{SearchConfig, Searcher};
/// use halberd::store::{IndexConfig, create_index};
///
/// # fn main() -> halberd::error::Result<()> {
/// let store = create_index(&IndexConfig::new("memory"))?;
/// let indexer = Indexer::new(store.clone(), IndexerConfig::default())?;
/// let partition = PartitionKey::default();
/// indexer.insert(&Document::new().with_field("id", "1").with_field("title", "Running cats"), &partition)?;
///
/// let searcher = Searcher::open(store, SearchConfig::default())?;
/// assert_eq!(searcher.search(&partition, "cat", 10)?.ids, vec![1]);
/// assert_eq!(searcher.search_boolean(&partition, "run & ~dog", 10)?.ids, vec![1]);
/// # Ok(())
/// # }
/// ```
pub struct Searcher {
    store: StoreHandle,
    config: SearchConfig,
    tokenizer: Box<dyn Tokenizer>,
    stemmer: Box<dyn Stemmer>,
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.name())
            .field("stemmer", &self.stemmer.name())
            .finish()
    }
}

impl Searcher {
    /// Open a searcher, resolving the index's stemmer discriminator once.
    pub fn open(store: StoreHandle, config: SearchConfig) -> Result<Self> {
        let stored = store.lock().info(InfoKey::Stemmer)?;
        let stemmer = StemmerRegistry::new().create(stored.as_deref().unwrap_or(DEFAULT_STEMMER))?;

        let mut tokenizer: Box<dyn Tokenizer> = Box::new(RegexTokenizer::new()?);
        tokenizer.set_context(TokenizerContext::Search);

        Ok(Searcher {
            store,
            config,
            tokenizer,
            stemmer,
        })
    }

    /// Replace the tokenizer. It is switched to the search context.
    pub fn with_tokenizer(mut self, mut tokenizer: Box<dyn Tokenizer>) -> Self {
        tokenizer.set_context(TokenizerContext::Search);
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SearchConfig {
        &mut self.config
    }

    pub fn stemmer_name(&self) -> &'static str {
        self.stemmer.name()
    }

    /// Map result ids of an index built from a directory back to the files
    /// they were read from, keeping the order of `ids`. Ids with no recorded
    /// file are left out, so other indexes yield an empty list.
    pub fn file_paths(&self, ids: &[DocId]) -> Result<Vec<(DocId, String)>> {
        self.store.lock().file_paths(ids)
    }

    /// Ranked free-text search.
    ///
    /// Every keyword contributes a TF-IDF weight to the documents it has
    /// postings for; documents are returned by descending score.
    /// `total_hits` counts every scored document.
    pub fn search(&self, partition: &PartitionKey, phrase: &str, limit: usize) -> Result<SearchResults> {
        let started = Instant::now();
        let keywords: Vec<String> = self
            .tokenizer
            .tokenize(phrase, &StopWords::none())?
            .iter()
            .map(|token| self.stemmer.stem(token))
            .filter(|keyword| !keyword.is_empty())
            .collect();

        let lookup = self.config.lookup();
        let store = self.store.lock();
        let total_docs = u64::try_from(read_total_documents(&*store)?).unwrap_or(0);

        let mut accumulator = ScoreAccumulator::new();
        for (index, keyword) in keywords.iter().enumerate() {
            let is_last = index + 1 == keywords.len();
            let rows = lookup.wordlist(&*store, partition, keyword, is_last)?;
            let scorer = TfIdfScorer::new(TermLookup::doc_freq(&rows), total_docs);

            for posting in lookup.postings(&*store, partition, &rows, Some(self.config.max_docs))? {
                accumulator.add(posting.doc_id, scorer.score(posting.hit_count as f64));
            }
        }
        drop(store);

        let total_hits = accumulator.len();
        let ids: Vec<DocId> = accumulator
            .into_ranked()
            .into_iter()
            .take(limit)
            .map(|(doc_id, _)| doc_id)
            .collect();

        let elapsed = started.elapsed();
        debug!(
            target: "halberd::search",
            %partition,
            keywords = keywords.len(),
            total_hits,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "ranked search"
        );
        Ok(SearchResults {
            ids,
            total_hits,
            elapsed,
        })
    }

    /// Boolean search with `&`, `|`, `~` and parentheses.
    ///
    /// A bare phrase is an OR of its keywords. The result is an unordered
    /// set of documents; `total_hits` is its size before truncation.
    pub fn search_boolean(
        &self,
        partition: &PartitionKey,
        phrase: &str,
        limit: usize,
    ) -> Result<SearchResults> {
        let started = Instant::now();
        let tokens = query_tokens(self.tokenizer.as_ref(), phrase)?;
        let last = last_keyword(&tokens, self.tokenizer.special_chars()).map(str::to_string);
        let postfix = if tokens.is_empty() {
            Vec::new()
        } else {
            to_postfix(&format!("|{}", tokens.join(" ")))
        };

        let store = self.store.lock();
        let mut resolver = StoreResolver {
            store: &*store,
            partition,
            lookup: self.config.lookup(),
            stemmer: self.stemmer.as_ref(),
            max_docs: self.config.max_docs,
        };
        let mut ids = BooleanEvaluator::new(last.as_deref()).evaluate(&postfix, &mut resolver)?;
        drop(store);

        let total_hits = ids.len();
        ids.truncate(limit);

        let elapsed = started.elapsed();
        debug!(
            target: "halberd::search",
            %partition,
            tokens = tokens.len(),
            total_hits,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "boolean search"
        );
        Ok(SearchResults {
            ids,
            total_hits,
            elapsed,
        })
    }
}

/// Resolves boolean operands against a locked store.
struct StoreResolver<'a> {
    store: &'a dyn IndexStore,
    partition: &'a PartitionKey,
    lookup: TermLookup,
    stemmer: &'a dyn Stemmer,
    max_docs: usize,
}

impl KeywordResolver for StoreResolver<'_> {
    fn matching(&mut self, keyword: &str, is_last: bool) -> Result<Vec<DocId>> {
        let term = self.stemmer.stem(keyword);
        let rows = self.lookup.wordlist(self.store, self.partition, &term, is_last)?;
        let limit = (!is_last).then_some(self.max_docs);
        let postings = self.lookup.postings(self.store, self.partition, &rows, limit)?;
        Ok(postings.into_iter().map(|posting| posting.doc_id).collect())
    }

    fn excluding(&mut self, keyword: &str) -> Result<Vec<DocId>> {
        let term = self.stemmer.stem(keyword);
        let rows = self.lookup.wordlist(self.store, self.partition, &term, false)?;
        self.store
            .documents_excluding(self.partition, rows.first().map(|entry| entry.id))
    }

    fn universe(&mut self) -> Result<Vec<DocId>> {
        self.store.documents_excluding(self.partition, None)
    }
}
