//! Table store: the logical schema kept in ordered in-process maps and
//! persisted as one checksummed snapshot file.
//!
//! Backs the `filesystem` driver (over [`FileStorage`](crate::storage::FileStorage))
//! and the `memory` driver (over [`MemoryStorage`]). The snapshot is rewritten
//! atomically through a temporary file and a rename after every autocommit
//! write and on [`IndexStore::commit`]; a rollback restores the tables as they
//! were at [`IndexStore::begin`].
//!
//! Snapshot layout (little endian):
//!
//! ```text
//! magic "HLBD" | version u16 | crc32 u32 | body length u64 | bincode body
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalberdError, Result};
use crate::partition::PartitionKey;
use crate::storage::{MemoryStorage, Storage};
use crate::store::{
    DocId, DriverKind, IndexStore, InfoKey, PartitionStats, Posting, StatementGuard, TermId,
    TermMatch, TermOrder, WordlistEntry,
};

/// Default snapshot file name.
pub const SNAPSHOT_FILE: &str = "index.halberd";

const MAGIC: &[u8; 4] = b"HLBD";
const FORMAT_VERSION: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TermRow {
    term: String,
    num_hits: i64,
    num_docs: i64,
}

/// Wordlist and doclist of one partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartitionTables {
    next_term_id: TermId,
    /// Unique index on `wordlist.term`.
    terms: BTreeMap<String, TermId>,
    wordlist: BTreeMap<TermId, TermRow>,
    /// Unique on `(term_id, doc_id)`, value is the hit count.
    doclist: BTreeMap<(TermId, DocId), i64>,
    /// Secondary index on `doclist.doc_id`.
    by_doc: BTreeSet<(DocId, TermId)>,
}

impl PartitionTables {
    fn entry(&self, id: TermId, row: &TermRow) -> WordlistEntry {
        WordlistEntry {
            id,
            term: row.term.clone(),
            num_hits: row.num_hits,
            num_docs: row.num_docs,
        }
    }

    fn insert_term(&mut self, term: &str, num_hits: i64, num_docs: i64) -> Result<TermId> {
        if self.terms.contains_key(term) {
            return Err(HalberdError::constraint(format!(
                "UNIQUE constraint failed: wordlist.term [{term}]"
            )));
        }
        self.next_term_id += 1;
        let id = self.next_term_id;
        self.terms.insert(term.to_string(), id);
        self.wordlist.insert(
            id,
            TermRow {
                term: term.to_string(),
                num_hits,
                num_docs,
            },
        );
        Ok(id)
    }

    fn insert_posting(&mut self, posting: &Posting) -> Result<()> {
        let key = (posting.term_id, posting.doc_id);
        if self.doclist.contains_key(&key) {
            return Err(HalberdError::constraint(format!(
                "UNIQUE constraint failed: doclist.term_id, doclist.doc_id [{}, {}]",
                posting.term_id, posting.doc_id
            )));
        }
        self.doclist.insert(key, posting.hit_count);
        self.by_doc.insert((posting.doc_id, posting.term_id));
        Ok(())
    }

    fn postings_for_doc(&self, doc_id: DocId) -> Vec<Posting> {
        self.by_doc
            .range((doc_id, TermId::MIN)..=(doc_id, TermId::MAX))
            .filter_map(|&(doc_id, term_id)| {
                self.doclist.get(&(term_id, doc_id)).map(|&hit_count| Posting {
                    term_id,
                    doc_id,
                    hit_count,
                })
            })
            .collect()
    }

    fn postings_for_term(&self, term_id: TermId) -> Vec<Posting> {
        let mut postings: Vec<Posting> = self
            .doclist
            .range((term_id, DocId::MIN)..=(term_id, DocId::MAX))
            .map(|(&(term_id, doc_id), &hit_count)| Posting {
                term_id,
                doc_id,
                hit_count,
            })
            .collect();
        postings.sort_by(|a, b| b.hit_count.cmp(&a.hit_count).then(a.doc_id.cmp(&b.doc_id)));
        postings
    }

    fn documents(&self) -> impl Iterator<Item = DocId> + '_ {
        let mut last = None;
        self.by_doc.iter().filter_map(move |&(doc_id, _)| {
            if last == Some(doc_id) {
                None
            } else {
                last = Some(doc_id);
                Some(doc_id)
            }
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    info: BTreeMap<String, String>,
    partitions: BTreeMap<PartitionKey, PartitionTables>,
    filemap: BTreeMap<DocId, String>,
}

impl Tables {
    fn partition_mut(&mut self, partition: &PartitionKey) -> &mut PartitionTables {
        self.partitions.entry(partition.clone()).or_default()
    }
}

/// Index store over ordered maps persisted to a [`Storage`] snapshot.
#[derive(Debug)]
pub struct TableStore {
    storage: Box<dyn Storage>,
    file_name: String,
    driver: DriverKind,
    tables: Tables,
    /// Tables as they were when the open transaction began.
    snapshot: Option<Tables>,
    guard: StatementGuard,
}

impl TableStore {
    /// Open the snapshot `file_name` in `storage`, starting empty when it
    /// does not exist yet.
    pub fn open(storage: Box<dyn Storage>, file_name: &str, driver: DriverKind) -> Result<Self> {
        let tables = if storage.file_exists(file_name) {
            let tables = read_snapshot(storage.as_ref(), file_name)?;
            debug!(
                target: "halberd::store",
                file = file_name,
                partitions = tables.partitions.len(),
                "loaded snapshot"
            );
            tables
        } else {
            Tables::default()
        };

        Ok(TableStore {
            storage,
            file_name: file_name.to_string(),
            driver,
            tables,
            snapshot: None,
            guard: StatementGuard::default(),
        })
    }

    /// A fresh store over its own [`MemoryStorage`].
    pub fn in_memory() -> Self {
        TableStore {
            storage: Box::new(MemoryStorage::new()),
            file_name: SNAPSHOT_FILE.to_string(),
            driver: DriverKind::Memory,
            tables: Tables::default(),
            snapshot: None,
            guard: StatementGuard::default(),
        }
    }

    fn partition(&self, partition: &PartitionKey) -> Option<&PartitionTables> {
        self.tables.partitions.get(partition)
    }

    /// Write the snapshot unless a transaction is open.
    fn persist(&mut self) -> Result<()> {
        if self.snapshot.is_none() {
            write_snapshot(self.storage.as_ref(), &self.file_name, &self.tables)?;
        }
        Ok(())
    }
}

fn write_snapshot(storage: &dyn Storage, file_name: &str, tables: &Tables) -> Result<()> {
    let body = bincode::serialize(tables)?;

    let (temp_name, mut output) = storage.create_temp_output(file_name)?;
    output.write_all(MAGIC)?;
    output.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    output.write_u32::<LittleEndian>(crc32fast::hash(&body))?;
    output.write_u64::<LittleEndian>(body.len() as u64)?;
    output.write_all(&body)?;
    output.flush_and_sync()?;
    drop(output);

    storage.rename_file(&temp_name, file_name)
}

fn read_snapshot(storage: &dyn Storage, file_name: &str) -> Result<Tables> {
    let mut input = storage.open_input(file_name)?;

    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(HalberdError::storage(format!(
            "{file_name} is not a halberd snapshot"
        )));
    }

    let version = input.read_u16::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(HalberdError::storage(format!(
            "Unsupported snapshot version {version}"
        )));
    }

    let checksum = input.read_u32::<LittleEndian>()?;
    let length = input.read_u64::<LittleEndian>()?;
    let size = input.size()?;
    if length > size {
        return Err(HalberdError::storage(format!(
            "Snapshot body length {length} exceeds file size {size}"
        )));
    }

    let mut body = vec![0u8; length as usize];
    input.read_exact(&mut body)?;
    if crc32fast::hash(&body) != checksum {
        return Err(HalberdError::storage(format!(
            "Checksum mismatch in {file_name}"
        )));
    }

    Ok(bincode::deserialize(&body)?)
}

impl IndexStore for TableStore {
    fn driver(&self) -> DriverKind {
        self.driver
    }

    fn prepare(&mut self, partition: &PartitionKey) -> Result<()> {
        self.tables.partition_mut(partition);
        Ok(())
    }

    fn reset_statements(&mut self) -> Result<()> {
        self.guard.reset();
        Ok(())
    }

    fn is_poisoned(&self) -> bool {
        self.guard.is_poisoned()
    }

    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(HalberdError::storage("A transaction is already active"));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.snapshot.take().is_none() {
            return Err(HalberdError::storage("No active transaction"));
        }
        self.persist()
    }

    fn rollback(&mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(tables) => {
                self.tables = tables;
                Ok(())
            }
            None => Err(HalberdError::storage("No active transaction")),
        }
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn insert_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<TermId> {
        self.guard.check("insert_term")?;
        let result = self
            .tables
            .partition_mut(partition)
            .insert_term(term, num_hits, num_docs);
        let id = self.guard.observe("insert_term", result)?;
        self.persist()?;
        Ok(id)
    }

    fn add_to_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<()> {
        self.guard.check("add_to_term")?;
        let tables = self.tables.partition_mut(partition);
        if let Some(id) = tables.terms.get(term).copied() {
            if let Some(row) = tables.wordlist.get_mut(&id) {
                row.num_hits += num_hits;
                row.num_docs += num_docs;
            }
        }
        self.persist()
    }

    fn find_term(&self, partition: &PartitionKey, term: &str) -> Result<Option<WordlistEntry>> {
        Ok(self.partition(partition).and_then(|tables| {
            let id = *tables.terms.get(term)?;
            tables.wordlist.get(&id).map(|row| tables.entry(id, row))
        }))
    }

    fn match_terms(
        &self,
        partition: &PartitionKey,
        pattern: TermMatch<'_>,
        order: TermOrder,
        limit: usize,
    ) -> Result<Vec<WordlistEntry>> {
        let Some(tables) = self.partition(partition) else {
            return Ok(Vec::new());
        };

        let ids: Vec<TermId> = match pattern {
            TermMatch::Prefix(prefix) => tables
                .terms
                .range(prefix.to_string()..)
                .take_while(|(term, _)| term.starts_with(prefix))
                .map(|(_, &id)| id)
                .collect(),
            TermMatch::Infix(_) => tables
                .terms
                .iter()
                .filter(|(term, _)| pattern.matches(term))
                .map(|(_, &id)| id)
                .collect(),
        };

        let mut entries: Vec<WordlistEntry> = ids
            .into_iter()
            .filter_map(|id| tables.wordlist.get(&id).map(|row| tables.entry(id, row)))
            .collect();
        order.sort(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }

    fn subtract_from_term(
        &mut self,
        partition: &PartitionKey,
        term_id: TermId,
        hit_count: i64,
    ) -> Result<()> {
        self.guard.check("subtract_from_term")?;
        if let Some(row) = self.tables.partition_mut(partition).wordlist.get_mut(&term_id) {
            row.num_docs -= 1;
            row.num_hits -= hit_count;
        }
        self.persist()
    }

    fn prune_terms(&mut self, partition: &PartitionKey) -> Result<usize> {
        self.guard.check("prune_terms")?;
        let tables = self.tables.partition_mut(partition);
        let exhausted: Vec<TermId> = tables
            .wordlist
            .iter()
            .filter(|(_, row)| row.num_hits == 0)
            .map(|(&id, _)| id)
            .collect();

        for id in &exhausted {
            if let Some(row) = tables.wordlist.remove(id) {
                tables.terms.remove(&row.term);
            }
        }
        if !exhausted.is_empty() {
            self.persist()?;
        }
        Ok(exhausted.len())
    }

    fn insert_posting(&mut self, partition: &PartitionKey, posting: &Posting) -> Result<()> {
        self.guard.check("insert_posting")?;
        let result = self.tables.partition_mut(partition).insert_posting(posting);
        self.guard.observe("insert_posting", result)?;
        self.persist()
    }

    fn postings_for_doc(&self, partition: &PartitionKey, doc_id: DocId) -> Result<Vec<Posting>> {
        Ok(self
            .partition(partition)
            .map(|tables| tables.postings_for_doc(doc_id))
            .unwrap_or_default())
    }

    fn delete_postings_for_doc(
        &mut self,
        partition: &PartitionKey,
        doc_id: DocId,
    ) -> Result<usize> {
        self.guard.check("delete_postings_for_doc")?;
        let tables = self.tables.partition_mut(partition);
        let postings = tables.postings_for_doc(doc_id);
        for posting in &postings {
            tables.doclist.remove(&(posting.term_id, doc_id));
            tables.by_doc.remove(&(doc_id, posting.term_id));
        }
        if !postings.is_empty() {
            self.persist()?;
        }
        Ok(postings.len())
    }

    fn postings_for_terms(
        &self,
        partition: &PartitionKey,
        term_ids: &[TermId],
        limit: Option<usize>,
    ) -> Result<Vec<Posting>> {
        let Some(tables) = self.partition(partition) else {
            return Ok(Vec::new());
        };

        let limit = limit.unwrap_or(usize::MAX);
        let mut postings = Vec::new();
        for &term_id in term_ids {
            if postings.len() >= limit {
                break;
            }
            postings.extend(tables.postings_for_term(term_id));
        }
        postings.truncate(limit);
        Ok(postings)
    }

    fn documents_excluding(
        &self,
        partition: &PartitionKey,
        excluded: Option<TermId>,
    ) -> Result<Vec<DocId>> {
        let Some(tables) = self.partition(partition) else {
            return Ok(Vec::new());
        };

        Ok(tables
            .documents()
            .filter(|&doc_id| {
                excluded.is_none_or(|term_id| !tables.doclist.contains_key(&(term_id, doc_id)))
            })
            .collect())
    }

    fn info(&self, key: InfoKey) -> Result<Option<String>> {
        Ok(self.tables.info.get(key.as_str()).cloned())
    }

    fn set_info(&mut self, key: InfoKey, value: &str) -> Result<()> {
        self.guard.check("set_info")?;
        self.tables
            .info
            .insert(key.as_str().to_string(), value.to_string());
        self.persist()
    }

    fn partition_stats(&self, partition: &PartitionKey) -> Result<PartitionStats> {
        Ok(self
            .partition(partition)
            .map(|tables| PartitionStats {
                terms: tables.wordlist.len(),
                postings: tables.doclist.len(),
                documents: tables.documents().count(),
            })
            .unwrap_or_default())
    }

    fn set_file_path(&mut self, doc_id: DocId, path: &str) -> Result<()> {
        self.guard.check("set_file_path")?;
        self.tables.filemap.insert(doc_id, path.to_string());
        self.persist()
    }

    fn file_paths(&self, doc_ids: &[DocId]) -> Result<Vec<(DocId, String)>> {
        Ok(doc_ids
            .iter()
            .filter_map(|id| self.tables.filemap.get(id).map(|path| (*id, path.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, StorageConfig};
    use tempfile::TempDir;

    fn posting(term_id: TermId, doc_id: DocId, hit_count: i64) -> Posting {
        Posting {
            term_id,
            doc_id,
            hit_count,
        }
    }

    #[test]
    fn test_insert_and_find_term() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        let id = store.insert_term(&p, "hello", 2, 1).unwrap();
        let entry = store.find_term(&p, "hello").unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.num_hits, 2);
        assert_eq!(entry.num_docs, 1);

        store.add_to_term(&p, "hello", 3, 1).unwrap();
        let entry = store.find_term(&p, "hello").unwrap().unwrap();
        assert_eq!((entry.num_hits, entry.num_docs), (5, 2));

        assert!(store.find_term(&p, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_term_poisons_writes_until_reset() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        store.insert_term(&p, "hello", 1, 1).unwrap();
        let err = store.insert_term(&p, "hello", 1, 1).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(store.is_poisoned());

        let err = store.add_to_term(&p, "hello", 1, 1).unwrap_err();
        assert!(matches!(err, HalberdError::StatementPoisoned(_)));

        // Reads are unaffected.
        assert!(store.find_term(&p, "hello").unwrap().is_some());

        store.reset_statements().unwrap();
        store.add_to_term(&p, "hello", 1, 1).unwrap();
        assert_eq!(store.find_term(&p, "hello").unwrap().unwrap().num_hits, 2);
    }

    #[test]
    fn test_duplicate_posting_is_a_constraint_violation() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        store.insert_posting(&p, &posting(1, 10, 2)).unwrap();
        let err = store.insert_posting(&p, &posting(1, 10, 5)).unwrap_err();
        assert!(err.is_constraint_violation());
        store.reset_statements().unwrap();

        let postings = store.postings_for_doc(&p, 10).unwrap();
        assert_eq!(postings, vec![posting(1, 10, 2)]);
    }

    #[test]
    fn test_postings_for_terms_ordering_and_limit() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        store.insert_posting(&p, &posting(1, 1, 1)).unwrap();
        store.insert_posting(&p, &posting(1, 2, 5)).unwrap();
        store.insert_posting(&p, &posting(2, 3, 9)).unwrap();
        store.insert_posting(&p, &posting(2, 4, 1)).unwrap();

        let docs: Vec<DocId> = store
            .postings_for_terms(&p, &[1, 2], None)
            .unwrap()
            .iter()
            .map(|p| p.doc_id)
            .collect();
        assert_eq!(docs, vec![2, 1, 3, 4]);

        let docs: Vec<DocId> = store
            .postings_for_terms(&p, &[2, 1], Some(3))
            .unwrap()
            .iter()
            .map(|p| p.doc_id)
            .collect();
        assert_eq!(docs, vec![3, 4, 2]);
    }

    #[test]
    fn test_delete_and_prune() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        let a = store.insert_term(&p, "alpha", 2, 1).unwrap();
        let b = store.insert_term(&p, "beta", 1, 1).unwrap();
        store.add_to_term(&p, "beta", 1, 1).unwrap();
        store.insert_posting(&p, &posting(a, 1, 2)).unwrap();
        store.insert_posting(&p, &posting(b, 1, 1)).unwrap();
        store.insert_posting(&p, &posting(b, 2, 1)).unwrap();

        for posting in store.postings_for_doc(&p, 1).unwrap() {
            store
                .subtract_from_term(&p, posting.term_id, posting.hit_count)
                .unwrap();
        }
        assert_eq!(store.delete_postings_for_doc(&p, 1).unwrap(), 2);
        assert_eq!(store.prune_terms(&p).unwrap(), 1);

        assert!(store.find_term(&p, "alpha").unwrap().is_none());
        let beta = store.find_term(&p, "beta").unwrap().unwrap();
        assert_eq!((beta.num_hits, beta.num_docs), (1, 1));
        assert_eq!(store.prune_terms(&p).unwrap(), 0);
    }

    #[test]
    fn test_documents_excluding() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        for doc in 1..=5 {
            store.insert_posting(&p, &posting(9, doc, 1)).unwrap();
        }
        store.insert_posting(&p, &posting(1, 1, 1)).unwrap();
        store.insert_posting(&p, &posting(1, 2, 1)).unwrap();

        assert_eq!(store.documents_excluding(&p, Some(1)).unwrap(), vec![3, 4, 5]);
        assert_eq!(store.documents_excluding(&p, None).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(store.partition_stats(&p).unwrap().documents, 5);
    }

    #[test]
    fn test_match_terms() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        store.insert_term(&p, "hello", 10, 3).unwrap();
        store.insert_term(&p, "help", 4, 2).unwrap();
        store.insert_term(&p, "shell", 7, 1).unwrap();
        store.insert_term(&p, "world", 1, 1).unwrap();

        let prefix: Vec<String> = store
            .match_terms(&p, TermMatch::Prefix("he"), TermOrder::HitsDesc, 10)
            .unwrap()
            .into_iter()
            .map(|e| e.term)
            .collect();
        assert_eq!(prefix, vec!["hello", "help"]);

        let infix: Vec<String> = store
            .match_terms(&p, TermMatch::Infix("el"), TermOrder::LengthThenHits, 2)
            .unwrap()
            .into_iter()
            .map(|e| e.term)
            .collect();
        assert_eq!(infix, vec!["help", "hello"]);
    }

    #[test]
    fn test_partitions_are_isolated() {
        let mut store = TableStore::in_memory();
        let en = PartitionKey::new("post", "en").unwrap();
        let fr = PartitionKey::new("post", "fr").unwrap();

        store.insert_term(&en, "hello", 1, 1).unwrap();
        assert!(store.find_term(&fr, "hello").unwrap().is_none());
        assert!(
            store
                .find_term(&PartitionKey::default(), "hello")
                .unwrap()
                .is_none()
        );
        // Same term in another partition is not a duplicate.
        store.insert_term(&fr, "hello", 1, 1).unwrap();
    }

    #[test]
    fn test_rollback_restores_tables() {
        let mut store = TableStore::in_memory();
        let p = PartitionKey::default();

        store.insert_term(&p, "kept", 1, 1).unwrap();
        store.begin().unwrap();
        assert!(store.begin().is_err());
        store.insert_term(&p, "discarded", 1, 1).unwrap();
        store.set_info(InfoKey::TotalDocuments, "7").unwrap();
        store.rollback().unwrap();

        assert!(store.find_term(&p, "kept").unwrap().is_some());
        assert!(store.find_term(&p, "discarded").unwrap().is_none());
        assert!(store.info(InfoKey::TotalDocuments).unwrap().is_none());
        assert!(store.commit().is_err());
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let p = PartitionKey::new("", "en").unwrap();

        {
            let storage = FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap();
            let mut store =
                TableStore::open(Box::new(storage), SNAPSHOT_FILE, DriverKind::Filesystem).unwrap();
            store.begin().unwrap();
            let id = store.insert_term(&p, "persisted", 3, 1).unwrap();
            store.insert_posting(&p, &posting(id, 42, 3)).unwrap();
            store.set_info(InfoKey::Stemmer, "porter").unwrap();
            store.commit().unwrap();

            store.begin().unwrap();
            store.insert_term(&p, "uncommitted", 1, 1).unwrap();
            // Dropped without commit.
        }

        let storage = FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap();
        let store =
            TableStore::open(Box::new(storage), SNAPSHOT_FILE, DriverKind::Filesystem).unwrap();
        let entry = store.find_term(&p, "persisted").unwrap().unwrap();
        assert_eq!(entry.num_hits, 3);
        assert_eq!(store.postings_for_doc(&p, 42).unwrap().len(), 1);
        assert!(store.find_term(&p, "uncommitted").unwrap().is_none());
        assert_eq!(store.info(InfoKey::Stemmer).unwrap().as_deref(), Some("porter"));
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let storage = MemoryStorage::new();
        {
            let mut store =
                TableStore::open(Box::new(storage.clone()), SNAPSHOT_FILE, DriverKind::Memory)
                    .unwrap();
            store
                .insert_term(&PartitionKey::default(), "hello", 1, 1)
                .unwrap();
        }

        let mut bytes = Vec::new();
        storage
            .open_input(SNAPSHOT_FILE)
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let mut output = storage.create_output(SNAPSHOT_FILE).unwrap();
        output.write_all(&bytes).unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let err = TableStore::open(Box::new(storage), SNAPSHOT_FILE, DriverKind::Memory)
            .unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_file_map_is_shared_and_rolled_back() {
        let mut store = TableStore::in_memory();
        store.set_file_path(1, "a.txt").unwrap();
        store.set_file_path(1, "renamed.txt").unwrap();

        store.begin().unwrap();
        store.set_file_path(2, "b.txt").unwrap();
        store.rollback().unwrap();

        assert_eq!(
            store.file_paths(&[2, 1, 9]).unwrap(),
            vec![(1, "renamed.txt".to_string())]
        );
    }
}
