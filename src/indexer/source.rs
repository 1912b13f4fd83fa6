//! Documents and the row sources that feed a batch.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HalberdError, Result};
use crate::store::DocId;

/// Row column naming the target language of a batch row.
pub const LANG_COLUMN: &str = "lang";

/// Row column naming the target post type of a batch row.
pub const POST_TYPE_COLUMN: &str = "post_type";

/// An ordered set of named text columns.
///
/// # Examples
///
/// ```
/// use halberd::indexer::Document;
///
/// let doc = Document::new()
///     .with_field("id", "7")
///     .with_field("title", "Hello world");
/// assert_eq!(doc.doc_id("id").unwrap(), 7);
/// assert_eq!(doc.get("title"), Some("Hello world"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<(String, String)>,
    /// File the document was read from, recorded in the index's file map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_path: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Builder form of [`Document::set`].
    pub fn with_field<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Set a column, replacing an existing one of the same name in place.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Mark the document as read from `path`.
    pub fn with_source_path<P: Into<String>>(mut self, path: P) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Columns in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse the integer id held in `primary_key`.
    pub fn doc_id(&self, primary_key: &str) -> Result<DocId> {
        let raw = self.get(primary_key).ok_or_else(|| {
            HalberdError::invalid_argument(format!(
                "Document has no primary key column [{primary_key}]"
            ))
        })?;
        raw.trim().parse().map_err(|_| {
            HalberdError::invalid_argument(format!(
                "Primary key [{primary_key}] is not an integer: {raw}"
            ))
        })
    }

    /// Remove the routing columns and return `(post_type, lang)`. Missing
    /// columns come back as empty strings.
    pub fn take_routing(&mut self) -> (String, String) {
        let post_type = self.remove(POST_TYPE_COLUMN).unwrap_or_default();
        let lang = self.remove(LANG_COLUMN).unwrap_or_default();
        (post_type, lang)
    }

    /// Build a document from a JSON object.
    ///
    /// Strings are taken as is, numbers and booleans are rendered, `null` is
    /// skipped and arrays are joined with `" | "`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(HalberdError::invalid_argument(
                "A document must be a JSON object",
            ));
        };

        let mut document = Document::new();
        for (name, value) in map {
            if let Some(text) = json_text(value) {
                document.fields.push((name, text));
            }
        }
        Ok(document)
    }
}

fn json_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(json_text).collect();
            Some(parts.join(" | "))
        }
        object @ Value::Object(_) => Some(object.to_string()),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut document = Document::new();
        for (name, value) in iter {
            document.set(name, value);
        }
        document
    }
}

/// A cursor over the rows of a batch.
///
/// Any `Iterator<Item = Document>` is a row source.
pub trait RowSource {
    /// The next row, `None` once the source is drained.
    fn next_document(&mut self) -> Option<Result<Document>>;
}

impl<I> RowSource for I
where
    I: Iterator<Item = Document>,
{
    fn next_document(&mut self) -> Option<Result<Document>> {
        self.next().map(Ok)
    }
}

/// Rows read from JSON lines, one object per line. Blank lines are skipped.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> RowSource for JsonLinesSource<R> {
    fn next_document(&mut self) -> Option<Result<Document>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let line_number = self.line_number;
            return Some(
                serde_json::from_str::<Value>(&line)
                    .map_err(|e| {
                        HalberdError::invalid_argument(format!("line {line_number}: {e}"))
                    })
                    .and_then(Document::from_json),
            );
        }
    }
}

/// Reads the text content of a file.
pub trait FileReader {
    fn read(&self, path: &Path) -> Result<String>;
}

/// Reads files as UTF-8, replacing invalid sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileReader;

impl FileReader for TextFileReader {
    fn read(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// One document per file below a directory.
///
/// Files are visited in sorted path order and numbered from 1. Each
/// document carries a `path` and a `content` column, and its source path
/// lands in the index's file map so results can be turned back into files.
#[derive(Debug)]
pub struct DirectorySource<F = TextFileReader> {
    paths: std::vec::IntoIter<PathBuf>,
    next_id: DocId,
    reader: F,
}

impl DirectorySource<TextFileReader> {
    /// Every file below `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::with_reader(root, TextFileReader, &[])
    }
}

impl<F: FileReader> DirectorySource<F> {
    /// Files below `root` read with `reader`. A non-empty `extensions` list
    /// keeps only files with one of those extensions.
    pub fn with_reader<P: AsRef<Path>>(root: P, reader: F, extensions: &[&str]) -> Result<Self> {
        let mut paths = Vec::new();
        collect_files(root.as_ref(), &mut paths)?;
        if !extensions.is_empty() {
            paths.retain(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            });
        }
        paths.sort();

        Ok(DirectorySource {
            paths: paths.into_iter(),
            next_id: 1,
            reader,
        })
    }

    /// Files not yet visited.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

impl<F: FileReader> RowSource for DirectorySource<F> {
    fn next_document(&mut self) -> Option<Result<Document>> {
        let path = self.paths.next()?;
        let id = self.next_id;
        self.next_id += 1;

        Some(self.reader.read(&path).map(|content| {
            let path = path.display().to_string();
            Document::new()
                .with_field("id", id.to_string())
                .with_field("path", path.clone())
                .with_field("content", content)
                .with_source_path(path)
        }))
    }
}
