//! Byte storage used by the table-backed index stores.
//!
//! The filesystem and memory drivers keep their tables in an in-process
//! structure and persist it as a single snapshot file through a [`Storage`]
//! backend. Two backends exist:
//!
//! - [`FileStorage`]: a directory on disk, with atomic replace via rename
//! - [`MemoryStorage`]: a shared map of byte buffers, for tests and
//!   throwaway indexes
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use halberd::storage::{MemoryStorage, Storage};
//!
//! # fn main() -> halberd::error::Result<()> {
//! let storage = MemoryStorage::new();
//!
//! let mut output = storage.create_output("snapshot")?;
//! output.write_all(b"payload")?;
//! output.flush_and_sync()?;
//!
//! let mut input = storage.open_input("snapshot")?;
//! let mut bytes = Vec::new();
//! input.read_to_end(&mut bytes)?;
//! assert_eq!(bytes, b"payload");
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};
