//! Relational index store on SQLite.
//!
//! Each partition gets a real `wordlist` table with a `UNIQUE` term column
//! and a `doclist` table unique on `(term_id, doc_id)`. Statements go through
//! the connection's prepared statement cache, which
//! [`IndexStore::reset_statements`] flushes.

use std::path::Path;

use ahash::AHashSet;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{HalberdError, Result};
use crate::partition::{PartitionKey, Table};
use crate::store::{
    DocId, DriverKind, IndexStore, InfoKey, PartitionStats, Posting, StatementGuard, TermId,
    TermMatch, TermOrder, WordlistEntry,
};

/// Index store backed by a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    table_prefix: String,
    /// Partitions whose tables are known to exist.
    created: AHashSet<PartitionKey>,
    guard: StatementGuard,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P, table_prefix: &str) -> Result<Self> {
        Self::with_connection(Connection::open(path)?, table_prefix)
    }

    /// A private in-memory database.
    pub fn open_in_memory(table_prefix: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table_prefix)
    }

    fn with_connection(conn: Connection, table_prefix: &str) -> Result<Self> {
        let info = quote(&PartitionKey::default().table_name(table_prefix, Table::Info));
        let filemap = quote(&PartitionKey::default().table_name(table_prefix, Table::Filemap));
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {info} (ikey TEXT PRIMARY KEY, ivalue TEXT);
            CREATE TABLE IF NOT EXISTS {filemap} (id INTEGER PRIMARY KEY, path TEXT NOT NULL);"
        ))?;

        Ok(SqliteStore {
            conn,
            table_prefix: table_prefix.to_string(),
            created: AHashSet::new(),
            guard: StatementGuard::default(),
        })
    }

    /// Quoted identifier of a partition table, safe to splice into SQL.
    fn table(&self, partition: &PartitionKey, table: Table) -> String {
        quote(&partition.table_name(&self.table_prefix, table))
    }

    fn info_table(&self) -> String {
        quote(&PartitionKey::default().table_name(&self.table_prefix, Table::Info))
    }

    fn filemap_table(&self) -> String {
        quote(&PartitionKey::default().table_name(&self.table_prefix, Table::Filemap))
    }

    fn has_tables(&self, partition: &PartitionKey) -> Result<bool> {
        if self.created.contains(partition) {
            return Ok(true);
        }
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
        let name = partition.table_name(&self.table_prefix, Table::Wordlist);
        Ok(stmt.exists(params![name])?)
    }

    /// Run a write, refusing it while poisoned and poisoning on a
    /// constraint violation.
    fn write<T>(
        &mut self,
        partition: &PartitionKey,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        self.guard.check(operation)?;
        self.prepare(partition)?;
        let result = f(&self.conn).map_err(HalberdError::from);
        self.guard.observe(operation, result)
    }
}

/// Post types may contain `-`, which is not valid in a bare identifier.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX))
}

impl IndexStore for SqliteStore {
    fn driver(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn prepare(&mut self, partition: &PartitionKey) -> Result<()> {
        if self.created.contains(partition) {
            return Ok(());
        }

        let wordlist = self.table(partition, Table::Wordlist);
        let doclist = self.table(partition, Table::Doclist);
        let doc_index = quote(&format!(
            "{}_doc_id",
            partition.table_name(&self.table_prefix, Table::Doclist)
        ));
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {wordlist} (
                id INTEGER PRIMARY KEY,
                term TEXT NOT NULL UNIQUE,
                num_hits INTEGER NOT NULL,
                num_docs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {doclist} (
                term_id INTEGER NOT NULL,
                doc_id INTEGER NOT NULL,
                hit_count INTEGER NOT NULL,
                UNIQUE (term_id, doc_id)
            );
            CREATE INDEX IF NOT EXISTS {doc_index} ON {doclist} (doc_id);"
        ))?;

        debug!(target: "halberd::store", %partition, %wordlist, %doclist, "prepared partition tables");
        self.created.insert(partition.clone());
        Ok(())
    }

    fn reset_statements(&mut self) -> Result<()> {
        self.conn.flush_prepared_statement_cache();
        self.guard.reset();
        Ok(())
    }

    fn is_poisoned(&self) -> bool {
        self.guard.is_poisoned()
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        // Tables created inside the transaction are gone again.
        self.created.clear();
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn insert_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<TermId> {
        let sql = format!(
            "INSERT INTO {} (term, num_hits, num_docs) VALUES (?1, ?2, ?3)",
            self.table(partition, Table::Wordlist)
        );
        self.write(partition, "insert_term", |conn| {
            conn.prepare_cached(&sql)?
                .execute(params![term, num_hits, num_docs])?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn add_to_term(
        &mut self,
        partition: &PartitionKey,
        term: &str,
        num_hits: i64,
        num_docs: i64,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET num_docs = num_docs + ?1, num_hits = num_hits + ?2 WHERE term = ?3",
            self.table(partition, Table::Wordlist)
        );
        self.write(partition, "add_to_term", |conn| {
            conn.prepare_cached(&sql)?
                .execute(params![num_docs, num_hits, term])?;
            Ok(())
        })
    }

    fn find_term(&self, partition: &PartitionKey, term: &str) -> Result<Option<WordlistEntry>> {
        if !self.has_tables(partition)? {
            return Ok(None);
        }
        let sql = format!(
            "SELECT id, term, num_hits, num_docs FROM {} WHERE term = ?1 LIMIT 1",
            self.table(partition, Table::Wordlist)
        );
        let entry = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![term], |row| {
                Ok(WordlistEntry {
                    id: row.get(0)?,
                    term: row.get(1)?,
                    num_hits: row.get(2)?,
                    num_docs: row.get(3)?,
                })
            })
            .optional()?;
        Ok(entry)
    }

    fn match_terms(
        &self,
        partition: &PartitionKey,
        pattern: TermMatch<'_>,
        order: TermOrder,
        limit: usize,
    ) -> Result<Vec<WordlistEntry>> {
        if !self.has_tables(partition)? {
            return Ok(Vec::new());
        }

        let like = match pattern {
            TermMatch::Prefix(prefix) => format!("{}%", escape_like(prefix)),
            TermMatch::Infix(needle) => format!("%{}%", escape_like(needle)),
        };
        let order_by = match order {
            TermOrder::HitsDesc => "num_hits DESC, term",
            TermOrder::LengthThenHits => "length(term), num_hits DESC, term",
        };
        let sql = format!(
            "SELECT id, term, num_hits, num_docs FROM {} WHERE term LIKE ?1 ESCAPE '\\' \
             ORDER BY {order_by} LIMIT ?2",
            self.table(partition, Table::Wordlist)
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![like, sql_limit(Some(limit))], |row| {
            Ok(WordlistEntry {
                id: row.get(0)?,
                term: row.get(1)?,
                num_hits: row.get(2)?,
                num_docs: row.get(3)?,
            })
        })?;
        let entries = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn subtract_from_term(
        &mut self,
        partition: &PartitionKey,
        term_id: TermId,
        hit_count: i64,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET num_docs = num_docs - 1, num_hits = num_hits - ?1 WHERE id = ?2",
            self.table(partition, Table::Wordlist)
        );
        self.write(partition, "subtract_from_term", |conn| {
            conn.prepare_cached(&sql)?
                .execute(params![hit_count, term_id])?;
            Ok(())
        })
    }

    fn prune_terms(&mut self, partition: &PartitionKey) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE num_hits = 0",
            self.table(partition, Table::Wordlist)
        );
        self.write(partition, "prune_terms", |conn| {
            conn.prepare_cached(&sql)?.execute([])
        })
    }

    fn insert_posting(&mut self, partition: &PartitionKey, posting: &Posting) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (term_id, doc_id, hit_count) VALUES (?1, ?2, ?3)",
            self.table(partition, Table::Doclist)
        );
        self.write(partition, "insert_posting", |conn| {
            conn.prepare_cached(&sql)?.execute(params![
                posting.term_id,
                posting.doc_id,
                posting.hit_count
            ])?;
            Ok(())
        })
    }

    fn postings_for_doc(&self, partition: &PartitionKey, doc_id: DocId) -> Result<Vec<Posting>> {
        if !self.has_tables(partition)? {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT term_id, doc_id, hit_count FROM {} WHERE doc_id = ?1 ORDER BY term_id",
            self.table(partition, Table::Doclist)
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params![doc_id], |row| {
            Ok(Posting {
                term_id: row.get(0)?,
                doc_id: row.get(1)?,
                hit_count: row.get(2)?,
            })
        })?;
        let postings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(postings)
    }

    fn delete_postings_for_doc(
        &mut self,
        partition: &PartitionKey,
        doc_id: DocId,
    ) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE doc_id = ?1",
            self.table(partition, Table::Doclist)
        );
        self.write(partition, "delete_postings_for_doc", |conn| {
            conn.prepare_cached(&sql)?.execute(params![doc_id])
        })
    }

    fn postings_for_terms(
        &self,
        partition: &PartitionKey,
        term_ids: &[TermId],
        limit: Option<usize>,
    ) -> Result<Vec<Posting>> {
        if !self.has_tables(partition)? {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT term_id, doc_id, hit_count FROM {} WHERE term_id = ?1 \
             ORDER BY hit_count DESC, doc_id LIMIT ?2",
            self.table(partition, Table::Doclist)
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut postings = Vec::new();
        for &term_id in term_ids {
            let remaining = limit.map(|limit| limit.saturating_sub(postings.len()));
            if remaining == Some(0) {
                break;
            }
            let rows = stmt.query_map(params![term_id, sql_limit(remaining)], |row| {
                Ok(Posting {
                    term_id: row.get(0)?,
                    doc_id: row.get(1)?,
                    hit_count: row.get(2)?,
                })
            })?;
            for row in rows {
                postings.push(row?);
            }
        }
        Ok(postings)
    }

    fn documents_excluding(
        &self,
        partition: &PartitionKey,
        excluded: Option<TermId>,
    ) -> Result<Vec<DocId>> {
        if !self.has_tables(partition)? {
            return Ok(Vec::new());
        }
        let doclist = self.table(partition, Table::Doclist);

        let docs = match excluded {
            Some(term_id) => {
                let sql = format!(
                    "SELECT DISTINCT doc_id FROM {doclist} WHERE doc_id NOT IN \
                     (SELECT doc_id FROM {doclist} WHERE term_id = ?1) ORDER BY doc_id"
                );
                let mut stmt = self.conn.prepare_cached(&sql)?;
                let rows = stmt.query_map(params![term_id], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<Vec<DocId>>>()?
            }
            None => {
                let sql = format!("SELECT DISTINCT doc_id FROM {doclist} ORDER BY doc_id");
                let mut stmt = self.conn.prepare_cached(&sql)?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<Vec<DocId>>>()?
            }
        };
        Ok(docs)
    }

    fn info(&self, key: InfoKey) -> Result<Option<String>> {
        let sql = format!(
            "SELECT ivalue FROM {} WHERE ikey = ?1",
            self.info_table()
        );
        let value = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key.as_str()], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_info(&mut self, key: InfoKey, value: &str) -> Result<()> {
        self.guard.check("set_info")?;
        let sql = format!(
            "INSERT INTO {} (ikey, ivalue) VALUES (?1, ?2) \
             ON CONFLICT (ikey) DO UPDATE SET ivalue = excluded.ivalue",
            self.info_table()
        );
        let result = self
            .conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| stmt.execute(params![key.as_str(), value]))
            .map_err(HalberdError::from);
        self.guard.observe("set_info", result)?;
        Ok(())
    }

    fn partition_stats(&self, partition: &PartitionKey) -> Result<PartitionStats> {
        if !self.has_tables(partition)? {
            return Ok(PartitionStats::default());
        }
        let sql = format!(
            "SELECT (SELECT COUNT(*) FROM {wordlist}), COUNT(*), COUNT(DISTINCT doc_id) FROM {doclist}",
            wordlist = self.table(partition, Table::Wordlist),
            doclist = self.table(partition, Table::Doclist),
        );
        let (terms, postings, documents): (i64, i64, i64) = self
            .conn
            .prepare_cached(&sql)?
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(PartitionStats {
            terms: terms as usize,
            postings: postings as usize,
            documents: documents as usize,
        })
    }

    fn set_file_path(&mut self, doc_id: DocId, path: &str) -> Result<()> {
        self.guard.check("set_file_path")?;
        let sql = format!(
            "INSERT INTO {} (id, path) VALUES (?1, ?2) \
             ON CONFLICT (id) DO UPDATE SET path = excluded.path",
            self.filemap_table()
        );
        let result = self
            .conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| stmt.execute(params![doc_id, path]))
            .map_err(HalberdError::from);
        self.guard.observe("set_file_path", result)?;
        Ok(())
    }

    fn file_paths(&self, doc_ids: &[DocId]) -> Result<Vec<(DocId, String)>> {
        let sql = format!("SELECT path FROM {} WHERE id = ?1", self.filemap_table());
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut paths = Vec::new();
        for &doc_id in doc_ids {
            let path: Option<String> = stmt
                .query_row(params![doc_id], |row| row.get(0))
                .optional()?;
            if let Some(path) = path {
                paths.push((doc_id, path));
            }
        }
        Ok(paths)
    }
}
