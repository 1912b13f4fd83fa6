//! Driver selection and index creation.
//!
//! An [`IndexConfig`] names a driver; [`create_connector`] turns it into a
//! [`Connector`] that opens a [`StoreHandle`]. Configuration problems are
//! reported here, before any document is touched.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::stemmer::{DEFAULT_STEMMER, StemmerRegistry};
use crate::error::{HalberdError, Result};
use crate::partition::PartitionKey;
use crate::storage::{FileStorage, MemoryStorage, StorageConfig};
use crate::store::table::TableStore;
use crate::store::{InfoKey, StoreHandle, share};

static TABLE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("table prefix pattern"));

/// Supported storage drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Relational tables in a SQLite database.
    Sqlite,
    /// Snapshot file in a directory.
    Filesystem,
    /// Snapshot kept in process memory.
    Memory,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Sqlite => "sqlite",
            DriverKind::Filesystem => "filesystem",
            DriverKind::Memory => "memory",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = HalberdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DriverKind::Sqlite),
            "filesystem" => Ok(DriverKind::Filesystem),
            "memory" => Ok(DriverKind::Memory),
            _ => Err(HalberdError::config(format!("Unsupported driver [{s}]"))),
        }
    }
}

/// Where and how an index is stored.
///
/// # Examples
///
/// ```
/// use halberd::store::IndexConfig;
///
/// let config = IndexConfig::new("memory").with_stemmer("german");
/// assert_eq!(config.driver.as_deref(), Some("memory"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Driver name; required.
    pub driver: Option<String>,

    /// Directory holding the database or snapshot file.
    pub storage: PathBuf,

    /// Index name; the file is `<name>.sqlite` or `<name>.halberd`
    /// (`index.halberd` by default).
    pub index_name: String,

    /// Prefix prepended to every physical table name.
    pub table_prefix: String,

    /// Stemmer discriminator recorded when the index is created.
    pub stemmer: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            driver: None,
            storage: PathBuf::from("."),
            index_name: "index".to_string(),
            table_prefix: String::new(),
            stemmer: None,
        }
    }
}

impl IndexConfig {
    pub fn new(driver: &str) -> Self {
        IndexConfig {
            driver: Some(driver.to_string()),
            ..Default::default()
        }
    }

    pub fn with_storage<P: Into<PathBuf>>(mut self, storage: P) -> Self {
        self.storage = storage.into();
        self
    }

    pub fn with_index_name(mut self, index_name: &str) -> Self {
        self.index_name = index_name.to_string();
        self
    }

    pub fn with_table_prefix(mut self, table_prefix: &str) -> Self {
        self.table_prefix = table_prefix.to_string();
        self
    }

    pub fn with_stemmer(mut self, stemmer: &str) -> Self {
        self.stemmer = Some(stemmer.to_string());
        self
    }

    /// The configured driver, or a configuration error.
    pub fn driver_kind(&self) -> Result<DriverKind> {
        match self.driver.as_deref().map(str::trim) {
            None | Some("") => Err(HalberdError::config("A driver must be specified.")),
            Some(driver) => driver.parse(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !TABLE_PREFIX_PATTERN.is_match(&self.table_prefix) {
            return Err(HalberdError::config(format!(
                "Invalid table prefix [{}]",
                self.table_prefix
            )));
        }
        if self.index_name.trim().is_empty() {
            return Err(HalberdError::config("An index name must be specified."));
        }
        Ok(())
    }
}

/// Opens stores for one driver.
pub trait Connector: fmt::Debug {
    fn kind(&self) -> DriverKind;

    /// Open (creating if needed) the store described by `config`.
    fn connect(&self, config: &IndexConfig) -> Result<StoreHandle>;
}

#[derive(Debug)]
struct SqliteConnector;

impl Connector for SqliteConnector {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    #[cfg(feature = "sqlite")]
    fn connect(&self, config: &IndexConfig) -> Result<StoreHandle> {
        std::fs::create_dir_all(&config.storage)?;
        let path = config.storage.join(format!("{}.sqlite", config.index_name));
        let store = crate::store::SqliteStore::open(&path, &config.table_prefix)?;
        Ok(share(store))
    }

    #[cfg(not(feature = "sqlite"))]
    fn connect(&self, _config: &IndexConfig) -> Result<StoreHandle> {
        Err(HalberdError::config(
            "Unsupported driver [sqlite]: built without the `sqlite` feature",
        ))
    }
}

#[derive(Debug)]
struct FilesystemConnector;

impl Connector for FilesystemConnector {
    fn kind(&self) -> DriverKind {
        DriverKind::Filesystem
    }

    fn connect(&self, config: &IndexConfig) -> Result<StoreHandle> {
        let storage = FileStorage::new(&config.storage, StorageConfig::default())?;
        let file_name = snapshot_name(config);
        let store = TableStore::open(Box::new(storage), &file_name, DriverKind::Filesystem)?;
        Ok(share(store))
    }
}

/// Every connect opens a fresh, empty store; share the returned handle to
/// keep an index alive.
#[derive(Debug)]
struct MemoryConnector;

impl Connector for MemoryConnector {
    fn kind(&self) -> DriverKind {
        DriverKind::Memory
    }

    fn connect(&self, config: &IndexConfig) -> Result<StoreHandle> {
        let storage = MemoryStorage::new();
        let store = TableStore::open(Box::new(storage), &snapshot_name(config), DriverKind::Memory)?;
        Ok(share(store))
    }
}

fn snapshot_name(config: &IndexConfig) -> String {
    format!("{}.halberd", config.index_name)
}

/// Pick the connector for `config.driver`.
///
/// Fails with `A driver must be specified.` or `Unsupported driver [x]`.
pub fn create_connector(config: &IndexConfig) -> Result<Box<dyn Connector>> {
    let kind = config.driver_kind()?;
    config.validate()?;
    Ok(match kind {
        DriverKind::Sqlite => Box::new(SqliteConnector),
        DriverKind::Filesystem => Box::new(FilesystemConnector),
        DriverKind::Memory => Box::new(MemoryConnector),
    })
}

/// Open an index, allocating the default partition's tables and recording
/// the driver and stemmer in the info record.
///
/// The stemmer discriminator is only written when the index has none yet,
/// so reopening with a different `config.stemmer` keeps the original.
pub fn create_index(config: &IndexConfig) -> Result<StoreHandle> {
    let connector = create_connector(config)?;
    let handle = connector.connect(config)?;

    let stemmer = match config.stemmer.as_deref() {
        Some(discriminator) => {
            let registry = StemmerRegistry::new();
            let name = registry.resolve(discriminator).ok_or_else(|| {
                HalberdError::config(format!("Unknown stemmer [{discriminator}]"))
            })?;
            name.to_string()
        }
        None => DEFAULT_STEMMER.to_string(),
    };

    {
        let mut store = handle.lock();
        store.prepare(&PartitionKey::default())?;
        store.set_info(InfoKey::Driver, connector.kind().as_str())?;
        if store.info(InfoKey::Stemmer)?.is_none() {
            store.set_info(InfoKey::Stemmer, &stemmer)?;
        }
        if store.info(InfoKey::TotalDocuments)?.is_none() {
            store.set_info(InfoKey::TotalDocuments, "0")?;
        }
    }

    info!(
        target: "halberd::store",
        driver = %connector.kind(),
        index = %config.index_name,
        "opened index"
    );
    Ok(handle)
}
