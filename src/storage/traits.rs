//! Storage abstraction trait and common types.

use std::io::{Read, Write};

use crate::error::{HalberdError, Result};

/// A backend that stores named byte files.
///
/// Writers are expected to go through [`Storage::create_temp_output`]
/// followed by [`Storage::rename_file`] when a reader must never observe a
/// half-written file.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Rename a file, replacing any existing file with the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Create a temporary file whose name starts with `prefix`.
    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)>;
}

/// A readable file handle.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Total size of the file in bytes.
    fn size(&self) -> Result<u64>;
}

/// A writable file handle.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered bytes and make them durable.
    fn flush_and_sync(&mut self) -> Result<()>;
}

/// Configuration shared by the storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffer size for I/O operations.
    pub buffer_size: usize,

    /// Whether to fsync on every [`StorageOutput::flush_and_sync`].
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536,
            sync_writes: true,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for HalberdError {
    fn from(err: StorageError) -> Self {
        HalberdError::storage(err.to_string())
    }
}

/// Pick the first `{prefix}_{n}.tmp` name that `exists` rejects.
pub(crate) fn temp_name(prefix: &str, exists: impl Fn(&str) -> bool) -> Result<String> {
    (0..10_000)
        .map(|counter| format!("{prefix}_{counter}.tmp"))
        .find(|name| !exists(name))
        .ok_or_else(|| StorageError::IoError("Could not create temporary file".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();

        assert_eq!(config.buffer_size, 65536);
        assert!(config.sync_writes);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("index.halberd".to_string());
        assert_eq!(err.to_string(), "File not found: index.halberd");

        let err: HalberdError = StorageError::IoError("disk full".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: I/O error: disk full");
    }

    #[test]
    fn test_temp_name_skips_taken_names() {
        let name = temp_name("snapshot", |n| n == "snapshot_0.tmp").unwrap();
        assert_eq!(name, "snapshot_1.tmp");
    }
}
