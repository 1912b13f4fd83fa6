//! Error types for the Halberd library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`HalberdError`] enum. Storage backends classify uniqueness violations as
//! [`HalberdError::Constraint`] so the indexer can recover from racing term
//! inserts without inspecting backend-specific error codes.
//!
//! # Examples
//!
//! ```
//! use halberd::error::{HalberdError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(HalberdError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Halberd operations.
#[derive(Error, Debug)]
pub enum HalberdError {
    /// I/O errors (file operations, directory walks, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors (missing or unsupported driver, bad options).
    ///
    /// These surface at setup time and are not recoverable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A uniqueness constraint was violated by a write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A write was attempted against statements poisoned by an earlier
    /// constraint violation.
    #[error("Statement poisoned: {0}")]
    StatementPoisoned(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (tokenization, stemming, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation cancelled by an external signal
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite errors that are not constraint violations
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with HalberdError.
pub type Result<T> = std::result::Result<T, HalberdError>;

impl HalberdError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        HalberdError::Config(msg.into())
    }

    /// Create a new constraint violation error.
    pub fn constraint<S: Into<String>>(msg: S) -> Self {
        HalberdError::Constraint(msg.into())
    }

    /// Create a new poisoned statement error.
    pub fn poisoned<S: Into<String>>(msg: S) -> Self {
        HalberdError::StatementPoisoned(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        HalberdError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        HalberdError::Analysis(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        HalberdError::InvalidArgument(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        HalberdError::Cancelled(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        HalberdError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HalberdError::Other(msg.into())
    }

    /// Whether this error is a uniqueness violation that the caller may
    /// recover from by updating the existing row instead.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, HalberdError::Constraint(_))
    }
}

impl From<bincode::Error> for HalberdError {
    fn from(err: bincode::Error) -> Self {
        HalberdError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for HalberdError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                HalberdError::Constraint(err.to_string())
            }
            _ => HalberdError::Sqlite(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = HalberdError::config("A driver must be specified.");
        assert_eq!(
            error.to_string(),
            "Configuration error: A driver must be specified."
        );

        let error = HalberdError::storage("Test storage error");
        assert_eq!(error.to_string(), "Storage error: Test storage error");

        let error = HalberdError::analysis("Test analysis error");
        assert_eq!(error.to_string(), "Analysis error: Test analysis error");
    }

    #[test]
    fn test_constraint_classification() {
        assert!(HalberdError::constraint("UNIQUE constraint failed").is_constraint_violation());
        assert!(!HalberdError::poisoned("insert_term").is_constraint_violation());
        assert!(!HalberdError::storage("disk full").is_constraint_violation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let halberd_error = HalberdError::from(io_error);

        match halberd_error {
            HalberdError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
