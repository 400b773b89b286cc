//! JSON side file describing every persisted table.
//!
//! ```json
//! {
//!   "lineitem": {
//!     "file_name": "lineitem_1.bin",
//!     "file_count": 2,
//!     "chunk_count": 51,
//!     "column_count": 2,
//!     "columns": [{ "column_name": "l_orderkey", "data_type": "int", "nullable": false }]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, ColumnDefinitions};

/// Catalog record of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// File currently receiving appends.
    pub file_name: String,
    /// Number of files written so far.
    pub file_count: u32,
    /// Chunks persisted across all files.
    pub chunk_count: u32,
    /// Number of columns.
    pub column_count: u16,
    /// Column definitions in column order.
    pub columns: ColumnDefinitions,
}

impl CatalogEntry {
    /// Entry of a table with no chunks yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for more than `u16::MAX` columns.
    pub fn new(file_name: String, columns: &[ColumnDefinition]) -> Result<Self> {
        let column_count = u16::try_from(columns.len())
            .map_err(|_| Error::InvalidArgument(format!("{} columns", columns.len())))?;
        Ok(Self {
            file_name,
            file_count: 1,
            chunk_count: 0,
            column_count,
            columns: columns.to_vec(),
        })
    }
}

/// All catalog entries keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the catalog at `path`; a missing file yields an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading fails and [`Error::Serialization`] or
    /// [`Error::Corrupted`] if the document is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let catalog: Self = serde_json::from_str(&text)?;
        for (name, entry) in &catalog.tables {
            if usize::from(entry.column_count) != entry.columns.len() {
                return Err(Error::Corrupted(format!(
                    "catalog entry '{name}' declares {} columns but lists {}",
                    entry.column_count,
                    entry.columns.len()
                )));
            }
        }
        Ok(catalog)
    }

    /// Writes the catalog to `path` through a temporary file and a rename.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing or renaming fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Entry of `table`.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&CatalogEntry> {
        self.tables.get(table)
    }

    /// Inserts or replaces the entry of `table`.
    pub fn insert(&mut self, table: impl Into<String>, entry: CatalogEntry) {
        self.tables.insert(table.into(), entry);
    }

    /// Removes the entry of `table`.
    pub fn remove(&mut self, table: &str) -> Option<CatalogEntry> {
        self.tables.remove(table)
    }

    /// Iterates over entries in table name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.tables
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
