//! Table-level persistence: file mappings, roll-over and the catalog.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::catalog::{Catalog, CatalogEntry};
use super::chunk::Chunk;
use super::format::{ChunkHeader, FileHeader};
use super::layout::{
    append_chunk, map_chunk, read_chunk_header, read_file_header, table_file_name, write_chunks,
};
use super::locks::FileLocks;
use super::mapping::MappedChunk;
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::schema::{ColumnDefinitions, TableSchema};
use crate::types::{ChunkId, DataType};

/// Receiver of chunks reconstructed by [`StorageManager::load_table_into`].
pub trait ChunkSink {
    /// Takes ownership of one mapped chunk.
    ///
    /// # Errors
    ///
    /// An error aborts the load.
    fn append_chunk(&mut self, chunk: MappedChunk) -> Result<()>;
}

impl ChunkSink for Vec<MappedChunk> {
    fn append_chunk(&mut self, chunk: MappedChunk) -> Result<()> {
        self.push(chunk);
        Ok(())
    }
}

/// File currently receiving the chunks of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFileMapping {
    /// Name of the current file, `<table>_<file_index>.bin`.
    pub file_name: String,
    /// Index of the current file.
    pub file_index: u32,
    /// Chunks already written to the current file.
    pub chunk_count_in_file: u32,
    /// Chunks written across all files.
    pub total_chunk_count: u32,
}

impl TableFileMapping {
    fn new(table: &str) -> Self {
        Self {
            file_name: table_file_name(table, 0),
            file_index: 0,
            chunk_count_in_file: 0,
            total_chunk_count: 0,
        }
    }
}

/// Where a persisted chunk ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLocation {
    /// Id of the chunk within its table.
    pub chunk_id: ChunkId,
    /// File holding the chunk.
    pub file_name: String,
    /// Index of that file.
    pub file_index: u32,
    /// Slot in the file header.
    pub slot: usize,
}

struct TableState {
    columns: ColumnDefinitions,
    data_types: Arc<[DataType]>,
    /// Single writer per table.
    mapping: Mutex<TableFileMapping>,
}

impl TableState {
    fn new(columns: ColumnDefinitions, mapping: TableFileMapping) -> Self {
        let data_types = columns.data_types().into();
        Self {
            columns,
            data_types,
            mapping: Mutex::new(mapping),
        }
    }

    fn catalog_entry(&self, mapping: &TableFileMapping) -> Result<CatalogEntry> {
        let mut entry = CatalogEntry::new(mapping.file_name.clone(), &self.columns)?;
        entry.file_count = mapping.file_index + 1;
        entry.chunk_count = mapping.total_chunk_count;
        Ok(entry)
    }

    fn check_schema(&self, table: &str, chunk: &Chunk<'_>) -> Result<()> {
        if chunk.column_count() != self.data_types.len() {
            return Err(Error::SchemaMismatch(format!(
                "table '{table}' has {} columns, chunk has {}",
                self.data_types.len(),
                chunk.column_count()
            )));
        }
        let columns = chunk.segments().iter().zip(self.data_types.iter());
        for (column, (segment, expected)) in columns.enumerate() {
            if segment.data_type() != *expected {
                return Err(Error::SchemaMismatch(format!(
                    "column {column} of table '{table}' is {expected}, segment is {}",
                    segment.data_type()
                )));
            }
        }
        Ok(())
    }
}

/// Persists chunks of registered tables and maps them back.
///
/// Every table owns a sequence of files `<table>_0.bin`, `<table>_1.bin`, ...
/// A file takes up to `max_chunks_per_file` chunks before the next chunk opens
/// a new one. Table metadata is kept in a JSON catalog next to the files.
pub struct StorageManager {
    config: StorageConfig,
    tables: RwLock<HashMap<String, Arc<TableState>>>,
    catalog: Mutex<Catalog>,
    locks: FileLocks,
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("data_dir", &self.config.data_dir)
            .field("tables", &self.table_names())
            .finish_non_exhaustive()
    }
}

impl StorageManager {
    /// Opens the data directory, creating it if needed, and restores every
    /// table recorded in the catalog.
    ///
    /// The chunk count of each table's current file is taken from that file's
    /// header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an invalid configuration, an I/O
    /// error if the directory cannot be created and a format error if the
    /// catalog or a file header is malformed.
    pub fn open(config: StorageConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        std::fs::create_dir_all(&config.data_dir)?;

        let catalog = Catalog::load(&config.catalog_path())?;
        let mut tables = HashMap::with_capacity(catalog.len());
        for (name, entry) in catalog.iter() {
            let mapping = Self::restore_mapping(&config.data_dir, name, entry)?;
            if mapping.total_chunk_count != entry.chunk_count {
                warn!(
                    table = name,
                    catalog = entry.chunk_count,
                    files = mapping.total_chunk_count,
                    "Catalog chunk count is stale, using file headers"
                );
            }
            tables.insert(
                name.to_string(),
                Arc::new(TableState::new(entry.columns.clone(), mapping)),
            );
        }

        info!(
            data_dir = %config.data_dir.display(),
            tables = tables.len(),
            "Storage opened"
        );
        Ok(Self {
            config,
            tables: RwLock::new(tables),
            catalog: Mutex::new(catalog),
            locks: FileLocks::new(),
        })
    }

    /// Opens `data_dir` with default settings.
    ///
    /// # Errors
    ///
    /// Same as [`StorageManager::open`].
    pub fn open_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(StorageConfig::with_data_dir(data_dir))
    }

    /// Rebuilds the mapping of `table` from its file headers.
    ///
    /// Files past the catalog's `file_count` are picked up while they exist;
    /// they were rolled over to after the catalog was last flushed.
    fn restore_mapping(
        data_dir: &Path,
        table: &str,
        entry: &CatalogEntry,
    ) -> Result<TableFileMapping> {
        let recorded = entry.file_count.max(1);
        let mut mapping = TableFileMapping {
            file_name: table_file_name(table, recorded - 1),
            file_index: recorded - 1,
            chunk_count_in_file: 0,
            total_chunk_count: 0,
        };
        for index in 0.. {
            let path = data_dir.join(table_file_name(table, index));
            if !path.exists() {
                if index + 1 < recorded {
                    return Err(Error::Corrupted(format!(
                        "table '{table}' is missing {}",
                        path.display()
                    )));
                }
                break;
            }
            #[allow(clippy::cast_possible_truncation)] // At most MAX_CHUNKS_PER_FILE
            let count = read_file_header(&path)?.chunk_count() as u32;
            mapping.total_chunk_count += count;
            if index >= mapping.file_index {
                if index >= recorded {
                    warn!(table, file = %path.display(), "Found file missing from catalog");
                }
                mapping.file_index = index;
                mapping.file_name = table_file_name(table, index);
                mapping.chunk_count_in_file = count;
            }
        }
        Ok(mapping)
    }

    /// Storage settings in use.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Directory holding files and catalog.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Registers a table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableExists`] for a known name and
    /// [`Error::InvalidArgument`] for a name that is not a plain file name
    /// component or a schema without columns.
    pub fn add_table<S: TableSchema + ?Sized>(&self, name: &str, schema: &S) -> Result<()> {
        Self::check_table_name(name)?;
        let columns = schema.column_definitions().to_vec();
        if columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "table '{name}' has no columns"
            )));
        }

        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(Error::TableExists(name.to_string()));
        }
        let mapping = TableFileMapping::new(name);
        let state = TableState::new(columns, mapping.clone());
        self.catalog
            .lock()
            .insert(name, state.catalog_entry(&mapping)?);
        tables.insert(name.to_string(), Arc::new(state));

        info!(table = name, "Table added");
        Ok(())
    }

    /// Forgets a table and flushes the catalog. Its files stay on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for an unknown name and an I/O error if
    /// the catalog cannot be written.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let state = self
            .tables
            .write()
            .remove(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        // Waits for an in-flight writer.
        let mapping = state.mapping.lock();
        self.catalog.lock().remove(name);
        let prefix = format!("{name}_");
        self.locks.forget(|path| {
            path.file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|f| f.starts_with(&prefix))
        });
        drop(mapping);

        info!(table = name, "Table dropped");
        self.flush_catalog()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Registered table names in ascending order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Column definitions of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for an unknown name.
    pub fn column_definitions(&self, name: &str) -> Result<ColumnDefinitions> {
        Ok(self.table(name)?.columns.clone())
    }

    /// Snapshot of the file mapping of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for an unknown name.
    pub fn table_mapping(&self, name: &str) -> Result<TableFileMapping> {
        Ok(self.table(name)?.mapping.lock().clone())
    }

    /// Appends one chunk to `name`, rolling over to a new file when the
    /// current one is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`], [`Error::SchemaMismatch`] if the chunk
    /// does not match the columns, and I/O or format errors from the file.
    pub fn persist_chunk(&self, name: &str, chunk: &Chunk<'_>) -> Result<ChunkLocation> {
        let mut locations = self.persist_chunks(name, std::slice::from_ref(chunk))?;
        locations
            .pop()
            .ok_or_else(|| Error::InvalidArgument("no chunk persisted".into()))
    }

    /// Appends `chunks` to `name` in order.
    ///
    /// Chunks that start a new file are written together in one pass.
    ///
    /// # Errors
    ///
    /// Same as [`StorageManager::persist_chunk`]. Chunks written before a
    /// failure stay persisted.
    pub fn persist_chunks(&self, name: &str, chunks: &[Chunk<'_>]) -> Result<Vec<ChunkLocation>> {
        let state = self.table(name)?;
        for chunk in chunks {
            state.check_schema(name, chunk)?;
        }

        let mut mapping = state.mapping.lock();
        let result = self.write_batch(name, &mut mapping, chunks);
        self.catalog
            .lock()
            .insert(name, state.catalog_entry(&mapping)?);
        result
    }

    #[allow(clippy::cast_possible_truncation)] // Slot counts are bounded by the file cap
    fn write_batch(
        &self,
        name: &str,
        mapping: &mut TableFileMapping,
        chunks: &[Chunk<'_>],
    ) -> Result<Vec<ChunkLocation>> {
        let cap = self.config.max_chunks_per_file;
        let sync = self.config.sync_on_append;
        let mut locations = Vec::with_capacity(chunks.len());
        let mut rest = chunks;

        while !rest.is_empty() {
            if mapping.chunk_count_in_file as usize >= cap {
                mapping.file_index += 1;
                mapping.file_name = table_file_name(name, mapping.file_index);
                mapping.chunk_count_in_file = 0;
                info!(
                    table = name,
                    file = %mapping.file_name,
                    "Rolling over to a new table file"
                );
            }

            let path = self.config.data_dir.join(&mapping.file_name);
            let lock = self.locks.lock_for(&path);
            let _guard = lock.lock();

            if mapping.chunk_count_in_file == 0 {
                let (batch, tail) = rest.split_at(rest.len().min(cap));
                let first_id = mapping.total_chunk_count;
                let entries: Vec<(ChunkId, &Chunk<'_>)> = batch
                    .iter()
                    .enumerate()
                    .map(|(i, chunk)| (first_id + i as u32, chunk))
                    .collect();
                write_chunks(&path, &entries, sync)?;
                for (slot, (chunk_id, _)) in entries.iter().enumerate() {
                    locations.push(ChunkLocation {
                        chunk_id: *chunk_id,
                        file_name: mapping.file_name.clone(),
                        file_index: mapping.file_index,
                        slot,
                    });
                }
                mapping.chunk_count_in_file = batch.len() as u32;
                mapping.total_chunk_count += batch.len() as u32;
                rest = tail;
            } else {
                let chunk_id = mapping.total_chunk_count;
                let header = append_chunk(&path, chunk_id, &rest[0], sync)?;
                locations.push(ChunkLocation {
                    chunk_id,
                    file_name: mapping.file_name.clone(),
                    file_index: mapping.file_index,
                    slot: header.chunk_count() - 1,
                });
                mapping.chunk_count_in_file += 1;
                mapping.total_chunk_count += 1;
                rest = &rest[1..];
            }
        }

        debug!(
            table = name,
            chunks = chunks.len(),
            total = mapping.total_chunk_count,
            "Persisted chunks"
        );
        Ok(locations)
    }

    /// Maps every chunk of `name` in chunk id order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for an unknown name, and I/O or format
    /// errors from the files.
    pub fn load_table(&self, name: &str) -> Result<Vec<MappedChunk>> {
        let mut chunks = Vec::new();
        self.load_table_into(name, &mut chunks)?;
        Ok(chunks)
    }

    /// Maps every chunk of `name` and hands it to `sink`.
    ///
    /// Returns the number of chunks delivered.
    ///
    /// # Errors
    ///
    /// Same as [`StorageManager::load_table`], plus errors raised by `sink`.
    pub fn load_table_into<S: ChunkSink + ?Sized>(
        &self,
        name: &str,
        sink: &mut S,
    ) -> Result<usize> {
        let state = self.table(name)?;
        let mapping = state.mapping.lock().clone();
        let mut delivered = 0;

        for index in 0..=mapping.file_index {
            if index == mapping.file_index && mapping.chunk_count_in_file == 0 {
                break;
            }
            let path = self.config.data_dir.join(table_file_name(name, index));
            let header = self.locked_header(&path)?;
            for slot in 0..header.chunk_count() {
                let mapped = map_chunk(&path, &header, slot, Arc::clone(&state.data_types))?;
                sink.append_chunk(mapped)?;
                delivered += 1;
            }
        }

        debug!(table = name, chunks = delivered, "Loaded table");
        Ok(delivered)
    }

    /// Header of file `file_index` of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`], [`Error::InvalidArgument`] for a file
    /// index past the current file, and I/O or format errors.
    pub fn file_header(&self, name: &str, file_index: u32) -> Result<FileHeader> {
        let path = self.file_path(name, file_index)?;
        self.locked_header(&path)
    }

    /// Header of the chunk in `slot` of file `file_index` of `name`.
    ///
    /// # Errors
    ///
    /// Same as [`StorageManager::file_header`], plus
    /// [`Error::InvalidArgument`] for an unused slot.
    pub fn chunk_header(&self, name: &str, file_index: u32, slot: usize) -> Result<ChunkHeader> {
        let column_count = self.table(name)?.columns.len();
        let path = self.file_path(name, file_index)?;
        let header = self.locked_header(&path)?;
        read_chunk_header(&path, &header, slot, column_count)
    }

    /// Writes the catalog to its file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn flush_catalog(&self) -> Result<()> {
        let catalog = self.catalog.lock();
        catalog.save(&self.config.catalog_path())?;
        info!(tables = catalog.len(), "Catalog flushed");
        Ok(())
    }

    /// Snapshot of the in-memory catalog.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.catalog.lock().clone()
    }

    fn table(&self, name: &str) -> Result<Arc<TableState>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn file_path(&self, name: &str, file_index: u32) -> Result<PathBuf> {
        let mapping = self.table_mapping(name)?;
        if file_index > mapping.file_index {
            return Err(Error::InvalidArgument(format!(
                "table '{name}' has {} files, no file {file_index}",
                mapping.file_index + 1
            )));
        }
        Ok(self.config.data_dir.join(table_file_name(name, file_index)))
    }

    fn locked_header(&self, path: &Path) -> Result<FileHeader> {
        let lock = self.locks.lock_for(path);
        let _guard = lock.lock();
        read_file_header(path)
    }

    fn check_table_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "table name '{name}' must be non-empty ASCII letters, digits, '_' or '-'"
            )))
        }
    }
}

impl Drop for StorageManager {
    fn drop(&mut self) {
        if let Err(e) = self.flush_catalog() {
            error!(
                data_dir = %self.config.data_dir.display(),
                "Failed to flush catalog on drop: {}", e
            );
        }
    }
}
