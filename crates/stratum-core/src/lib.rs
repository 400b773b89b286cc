//! # `Stratum` Core
//!
//! Persistent columnar chunk storage for in-memory analytical engines.
//!
//! Column values are dictionary encoded into segments, segments are grouped
//! into chunks, and chunks are appended to per-table binary files. Reading a
//! table maps each chunk read-only and views its segments in place, without
//! deserialization.
//!
//! ## Features
//!
//! - **Four attribute vector layouts**: 1, 2 and 4-byte integers or bit packing
//! - **Typed dictionaries**: `int`, `long`, `float`, `double` and fixed-width strings
//! - **Append-only files**: fixed 50-slot headers, roll-over to a new file when full
//! - **Zero-copy read-back**: page-aligned `memmap2` mappings, borrowed segment views
//! - **JSON catalog**: table definitions and file mappings survive restarts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stratum_core::{
//!     Chunk, ColumnDefinition, CompressedVectorType, DataType, DictionarySegment,
//!     StorageManager,
//! };
//!
//! let storage = StorageManager::open_dir("./data")?;
//! storage.add_table("orders", &vec![ColumnDefinition::new("qty", DataType::Int, true)])?;
//!
//! let qty = DictionarySegment::from_values(
//!     &[Some(3), None, Some(7)],
//!     CompressedVectorType::FixedWidthInteger1Byte,
//! )?;
//! storage.persist_chunk("orders", &Chunk::new(vec![qty.into()])?)?;
//!
//! for mapped in storage.load_table("orders")? {
//!     let chunk = mapped.chunk()?;
//!     println!("{:?}", chunk.row(0));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// On-disk words are u32 while lengths are usize. Every narrowing cast below a
// checked constructor carries a local comment naming the bound.
// =============================================================================
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::use_self)]

pub mod compression;
pub mod config;
pub mod error;
pub mod schema;
pub mod segment;
pub mod storage;
pub mod types;
pub mod util;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod error_tests;

pub use compression::{BitPackedVector, CompressedVector, CompressedVectorType};
pub use config::{ConfigError, LoggingConfig, StorageConfig, StratumConfig};
pub use error::{Error, ErrorKind, Result};
pub use schema::{ColumnDefinition, ColumnDefinitions, TableSchema};
pub use segment::{
    Dictionary, DictionarySegment, DictionaryValue, FixedStringDictionary, FixedStringSegment,
    PersistedEncoding, Segment,
};
pub use storage::{
    Catalog, CatalogEntry, Chunk, ChunkHeader, ChunkLocation, ChunkMapping, ChunkSink, FileHeader,
    MappedChunk, StorageManager, TableFileMapping, FILE_HEADER_BYTES, MAX_CHUNKS_PER_FILE,
    STORAGE_FORMAT_VERSION,
};
pub use types::{ChunkId, ChunkOffset, ColumnId, DataType, Value, ValueId, INVALID_VALUE_ID};
