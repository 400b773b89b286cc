//! Read-only access to a data directory.
//!
//! Nothing here writes: the catalog is read directly and chunks are mapped
//! through the layout functions instead of a `StorageManager`, which would
//! flush the catalog on drop.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use stratum_core::storage::{map_chunk, read_file_header, table_file_name};
use stratum_core::{Catalog, CatalogEntry, ChunkId, DataType, MappedChunk, TableSchema, Value};

/// Reads `catalog_file` inside `data_dir`.
pub fn load_catalog(data_dir: &Path, catalog_file: &str) -> Result<Catalog> {
    let path = data_dir.join(catalog_file);
    if !path.exists() {
        bail!("No catalog at {}", path.display());
    }
    Catalog::load(&path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Catalog entry of `table`.
pub fn table_entry<'c>(catalog: &'c Catalog, table: &str) -> Result<&'c CatalogEntry> {
    catalog
        .get(table)
        .with_context(|| format!("Table '{table}' not found in catalog"))
}

/// Maps every chunk of `table` in file and slot order.
pub fn table_chunks(
    data_dir: &Path,
    table: &str,
    entry: &CatalogEntry,
) -> Result<Vec<MappedChunk>> {
    let data_types: Arc<[DataType]> = entry.columns.data_types().into();
    let mut chunks = Vec::with_capacity(entry.chunk_count as usize);
    for index in 0..entry.file_count {
        let path = data_dir.join(table_file_name(table, index));
        if !path.exists() && index + 1 == entry.file_count {
            break;
        }
        let header = read_file_header(&path)
            .with_context(|| format!("Failed to read header of {}", path.display()))?;
        for slot in 0..header.chunk_count() {
            let mapped = map_chunk(&path, &header, slot, Arc::clone(&data_types))
                .with_context(|| format!("Failed to map slot {slot} of {}", path.display()))?;
            chunks.push(mapped);
        }
    }
    debug!(table, chunks = chunks.len(), "Mapped table");
    Ok(chunks)
}

/// Decoded rows tagged with their chunk id.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpedRow {
    /// Chunk the row came from.
    pub chunk_id: ChunkId,
    /// Row position within the chunk.
    pub row: usize,
    /// One value per column.
    pub values: Vec<Value>,
}

/// Decodes up to `limit` rows, optionally from a single chunk id.
pub fn dump_rows(
    chunks: &[MappedChunk],
    only_chunk: Option<ChunkId>,
    limit: usize,
) -> Result<Vec<DumpedRow>> {
    let mut rows = Vec::new();
    for mapped in chunks {
        if only_chunk.is_some_and(|id| id != mapped.chunk_id()) {
            continue;
        }
        let chunk = mapped.chunk()?;
        for row in 0..chunk.size() {
            if rows.len() == limit {
                return Ok(rows);
            }
            rows.push(DumpedRow {
                chunk_id: mapped.chunk_id(),
                row,
                values: chunk.row(row),
            });
        }
    }
    if let Some(id) = only_chunk {
        if !chunks.iter().any(|c| c.chunk_id() == id) {
            bail!("Chunk {id} does not exist");
        }
    }
    Ok(rows)
}

/// Outcome of [`verify_table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Files inspected.
    pub files: u32,
    /// Chunks that mapped and validated.
    pub chunks: usize,
    /// Rows across valid chunks.
    pub rows: usize,
    /// Human-readable findings; empty when the table is sound.
    pub problems: Vec<String>,
}

impl VerifyReport {
    /// Returns true if nothing was found.
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Maps every chunk of `table` and records what does not check out.
///
/// Unlike [`table_chunks`], a broken chunk does not stop the scan.
pub fn verify_table(data_dir: &Path, table: &str, entry: &CatalogEntry) -> VerifyReport {
    let data_types: Arc<[DataType]> = entry.columns.data_types().into();
    let mut report = VerifyReport::default();
    let mut expected_id: ChunkId = 0;

    for index in 0..entry.file_count {
        let path = data_dir.join(table_file_name(table, index));
        if !path.exists() {
            if index + 1 < entry.file_count {
                report.problems.push(format!("{} is missing", path.display()));
            }
            continue;
        }
        report.files += 1;
        let header = match read_file_header(&path) {
            Ok(header) => header,
            Err(e) => {
                report.problems.push(format!("{}: {e}", path.display()));
                continue;
            }
        };
        for slot in 0..header.chunk_count() {
            let chunk_id = header.chunk_ids()[slot];
            if chunk_id != expected_id {
                report.problems.push(format!(
                    "{} slot {slot}: chunk id {chunk_id}, expected {expected_id}",
                    path.display()
                ));
            }
            expected_id = chunk_id.saturating_add(1);
            match map_chunk(&path, &header, slot, Arc::clone(&data_types)) {
                Ok(mapped) => {
                    report.chunks += 1;
                    report.rows += mapped.chunk().map_or(0, |c| c.size());
                }
                Err(e) => report
                    .problems
                    .push(format!("{} slot {slot}: {e}", path.display())),
            }
        }
    }

    if report.chunks != entry.chunk_count as usize && report.problems.is_empty() {
        report.problems.push(format!(
            "catalog records {} chunks, files hold {}",
            entry.chunk_count, report.chunks
        ));
    }
    if !report.is_ok() {
        warn!(table, problems = report.problems.len(), "Verification found problems");
    }
    report
}
