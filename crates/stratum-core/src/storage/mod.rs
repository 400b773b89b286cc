//! Persistent table files.
//!
//! A table is stored as a sequence of binary files `<table>_<n>.bin`. Each file
//! starts with a fixed [`FileHeader`] listing up to [`MAX_CHUNKS_PER_FILE`]
//! chunks, followed by the chunks back to back. A chunk is a [`ChunkHeader`]
//! followed by one serialized segment per column. All integers are
//! little-endian `u32`.
//!
//! # Public Types
//!
//! - [`StorageManager`]: table registry, append with roll-over, read-back
//! - [`Chunk`]: one segment per column, equal row counts
//! - [`MappedChunk`]: a chunk reconstructed from a read-only mapping
//! - [`Catalog`]: JSON side file describing every table

mod catalog;
mod chunk;
mod format;
mod layout;
mod locks;
mod manager;
mod mapping;

pub use catalog::{Catalog, CatalogEntry};
pub use chunk::Chunk;
pub use format::{
    chunk_header_bytes, ChunkHeader, FileHeader, FILE_HEADER_BYTES, MAX_CHUNKS_PER_FILE,
    STORAGE_FORMAT_VERSION,
};
pub use layout::{
    append_chunk, map_chunk, read_chunk_header, read_file_header, table_file_name, write_chunk,
    write_chunks,
};
pub use locks::FileLocks;
pub use manager::{ChunkLocation, ChunkSink, StorageManager, TableFileMapping};
pub use mapping::{page_size, ChunkMapping, MappedChunk};

#[cfg(test)]
mod chunk_tests;
#[cfg(test)]
mod format_tests;
#[cfg(test)]
mod test_support;
