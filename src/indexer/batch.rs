//! Batch ingestion.
//!
//! A batch drains a [`RowSource`] inside one explicit transaction. Rows are
//! routed to partitions by their optional `lang`/`post_type` columns, which
//! are stripped before indexing. Cancellation is looked at once, after the
//! source is drained; a cancelled batch is rolled back as a whole.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{HalberdError, Result};
use crate::indexer::source::RowSource;
use crate::indexer::{Indexer, TermCache, write_total_documents};
use crate::partition::PartitionKey;
use crate::store::IndexStore;

/// External progress and cancellation state of a batch.
pub trait BatchMonitor: Send + Sync {
    /// Rows processed by earlier batches; the running count starts here.
    fn processed(&self) -> u64 {
        0
    }

    /// Persist the running count.
    fn record_progress(&self, count: u64);

    /// Whether the batch should be abandoned.
    fn is_cancelled(&self) -> bool;
}

/// In-process [`BatchMonitor`] backed by atomics.
///
/// # Examples
///
/// ```
/// use halberd::indexer::{BatchMonitor, BuildStatus};
///
/// let status = BuildStatus::new();
/// status.record_progress(250);
/// assert_eq!(status.processed(), 250);
///
/// status.cancel();
/// assert!(status.is_cancelled());
/// ```
#[derive(Debug, Default)]
pub struct BuildStatus {
    processed: AtomicU64,
    cancelled: AtomicBool,
}

impl BuildStatus {
    pub fn new() -> Self {
        BuildStatus::default()
    }

    /// Resume counting from `processed` rows.
    pub fn with_processed(processed: u64) -> Self {
        BuildStatus {
            processed: AtomicU64::new(processed),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Ask the running batch to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl BatchMonitor for BuildStatus {
    fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    fn record_progress(&self, count: u64) {
        self.processed.store(count, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Running count at the end of the batch, earlier batches included.
    pub total: u64,
    /// Rows indexed by this batch.
    pub indexed: u64,
    /// Rows read but not indexed.
    pub skipped: u64,
    /// Distinct terms remembered by the batch term cache.
    pub cached_terms: usize,
    pub elapsed: Duration,
}

impl Indexer {
    /// Index every row of `source` in one transaction.
    ///
    /// The running count starts at `monitor.processed()` and counts every
    /// row read, skipped ones included. It is reported to the monitor every
    /// `progress_interval` rows, and on commit it also becomes the
    /// index's document counter.
    ///
    /// Rows without a usable primary key or with invalid routing values are
    /// logged and skipped. A failing source aborts the batch. When
    /// `monitor.is_cancelled()` holds after the source is drained, the batch
    /// is rolled back and [`HalberdError::Cancelled`] is returned.
    pub fn run<S: RowSource>(&self, mut source: S, monitor: &dyn BatchMonitor) -> Result<BatchReport> {
        let started = Instant::now();
        let mut report = BatchReport {
            total: monitor.processed(),
            ..Default::default()
        };
        let mut cache = TermCache::new(self.config.batch_term_cache);

        let mut store = self.store.lock();
        store.begin()?;

        let drained = self.drain(&mut *store, &mut source, monitor, &mut cache, &mut report);
        if let Err(err) = drained {
            rollback(&mut *store);
            return Err(err);
        }

        if monitor.is_cancelled() {
            rollback(&mut *store);
            warn!(
                target: "halberd::indexer",
                rows = report.indexed + report.skipped,
                "batch cancelled, changes rolled back"
            );
            return Err(HalberdError::cancelled("Batch cancelled by monitor"));
        }

        let elapsed = started.elapsed();
        info!(
            target: "halberd::indexer",
            processed = report.total,
            indexed = report.indexed,
            skipped = report.skipped,
            elapsed = format!("{:.4} s", elapsed.as_secs_f64()),
            "batch processed"
        );

        store.commit()?;
        write_total_documents(&mut *store, i64::try_from(report.total).unwrap_or(i64::MAX))?;
        monitor.record_progress(report.total);

        report.cached_terms = cache.len();
        report.elapsed = started.elapsed();
        info!(target: "halberd::indexer", total = report.total, "total rows");
        Ok(report)
    }

    fn drain<S: RowSource>(
        &self,
        store: &mut dyn IndexStore,
        source: &mut S,
        monitor: &dyn BatchMonitor,
        cache: &mut TermCache,
        report: &mut BatchReport,
    ) -> Result<()> {
        while let Some(row) = source.next_document() {
            let mut document = row?;
            report.total += 1;

            let interval = self.config.progress_interval;
            if interval > 0 && report.total % interval == 0 {
                monitor.record_progress(report.total);
            }

            let (post_type, lang) = document.take_routing();
            if self.config.multilingual && lang.is_empty() {
                report.skipped += 1;
                continue;
            }

            let partition = match PartitionKey::new(&post_type, &lang) {
                Ok(partition) => partition,
                Err(err) => {
                    warn!(target: "halberd::indexer", error = %err, "row skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            let doc_id = match document.doc_id(&self.config.primary_key) {
                Ok(doc_id) => doc_id,
                Err(err) => {
                    warn!(target: "halberd::indexer", %partition, error = %err, "row skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            self.index_document(store, &partition, doc_id, &document, cache)?;
            report.indexed += 1;
        }
        Ok(())
    }
}

fn rollback(store: &mut dyn IndexStore) {
    if let Err(err) = store.rollback() {
        warn!(target: "halberd::indexer", error = %err, "rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{Document, IndexerConfig};
    use crate::store::{InfoKey, TableStore, share};

    fn row(id: &str, text: &str) -> Document {
        Document::new().with_field("id", id).with_field("text", text)
    }

    fn indexer(config: IndexerConfig) -> Indexer {
        Indexer::new(share(TableStore::in_memory()), config).unwrap()
    }

    #[test]
    fn test_run_indexes_and_routes_rows() {
        let indexer = indexer(IndexerConfig::default());
        let rows = vec![
            row("1", "red shoes"),
            row("2", "blue shoes").with_field("lang", "en"),
            row("3", "rote schuhe")
                .with_field("lang", "de")
                .with_field("post_type", "post"),
        ];

        let status = BuildStatus::new();
        let report = indexer.run(rows.into_iter(), &status).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.indexed, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(status.processed(), 3);

        let store = indexer.store().lock();
        let en = PartitionKey::new("", "en").unwrap();
        let de_post = PartitionKey::new("post", "de").unwrap();
        assert!(store.find_term(&PartitionKey::default(), "red").unwrap().is_some());
        assert!(store.find_term(&en, "blue").unwrap().is_some());
        assert!(store.find_term(&en, "red").unwrap().is_none());
        assert!(store.find_term(&de_post, "rote").unwrap().is_some());

        // Routing columns are not indexed.
        assert!(store.find_term(&en, "en").unwrap().is_none());
        assert_eq!(
            store.info(InfoKey::TotalDocuments).unwrap().as_deref(),
            Some("3")
        );
    }

    #[test]
    fn test_run_continues_from_previous_progress() {
        let indexer = indexer(IndexerConfig::default());
        let status = BuildStatus::with_processed(10);

        let report = indexer
            .run(vec![row("11", "eleven")].into_iter(), &status)
            .unwrap();
        assert_eq!(report.total, 11);
        assert_eq!(indexer.total_documents().unwrap(), 11);
    }

    #[test]
    fn test_run_skips_bad_rows() {
        let indexer = indexer(IndexerConfig::default().with_multilingual(true));
        let rows = vec![
            row("1", "no language"),
            row("x", "bad id").with_field("lang", "en"),
            row("3", "bad lang").with_field("lang", "english"),
            row("4", "good").with_field("lang", "en"),
        ];

        let report = indexer.run(rows.into_iter(), &BuildStatus::new()).unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.total, 4);
    }

    #[test]
    fn test_cancelled_batch_is_rolled_back() {
        let indexer = indexer(IndexerConfig::default());
        let p = PartitionKey::default();
        indexer.insert(&row("1", "kept"), &p).unwrap();

        let status = BuildStatus::new();
        status.cancel();
        let err = indexer
            .run(vec![row("2", "discarded")].into_iter(), &status)
            .unwrap_err();
        assert!(matches!(err, HalberdError::Cancelled(_)));

        let store = indexer.store().lock();
        assert!(!store.in_transaction());
        assert!(store.find_term(&p, "discard").unwrap().is_none());
        assert!(store.find_term(&p, "kept").unwrap().is_some());
        assert_eq!(
            store.info(InfoKey::TotalDocuments).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_failing_source_rolls_back() {
        struct Failing(u8);
        impl RowSource for Failing {
            fn next_document(&mut self) -> Option<Result<Document>> {
                self.0 += 1;
                match self.0 {
                    1 => Some(Ok(row("1", "first"))),
                    2 => Some(Err(HalberdError::other("cursor broke"))),
                    _ => None,
                }
            }
        }

        let indexer = indexer(IndexerConfig::default());
        let err = indexer.run(Failing(0), &BuildStatus::new()).unwrap_err();
        assert!(err.to_string().contains("cursor broke"));

        let store = indexer.store().lock();
        assert!(!store.in_transaction());
        assert!(
            store
                .find_term(&PartitionKey::default(), "first")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_progress_is_reported_periodically() {
        struct Recorder(parking_lot::Mutex<Vec<u64>>);
        impl BatchMonitor for Recorder {
            fn record_progress(&self, count: u64) {
                self.0.lock().push(count);
            }
            fn is_cancelled(&self) -> bool {
                false
            }
        }

        let indexer = indexer(IndexerConfig::default().with_progress_interval(2));
        let rows: Vec<Document> = (1..=5).map(|i| row(&i.to_string(), "word")).collect();
        let recorder = Recorder(parking_lot::Mutex::new(Vec::new()));

        indexer.run(rows.into_iter(), &recorder).unwrap();
        assert_eq!(*recorder.0.lock(), vec![2, 4, 5]);
    }

    #[test]
    fn test_batch_term_cache_counts_distinct_terms() {
        let indexer = indexer(IndexerConfig::default());
        let rows = vec![row("1", "shared alpha"), row("2", "shared beta")];

        let report = indexer.run(rows.into_iter(), &BuildStatus::new()).unwrap();
        assert_eq!(report.cached_terms, 3);

        let store = indexer.store().lock();
        let shared = store
            .find_term(&PartitionKey::default(), "share")
            .unwrap()
            .unwrap();
        assert_eq!((shared.num_hits, shared.num_docs), (2, 2));
        assert_eq!(
            store
                .postings_for_terms(&PartitionKey::default(), &[shared.id], None)
                .unwrap()
                .len(),
            2
        );
    }
}
