//! Read-only memory mappings of single chunks.
//!
//! A chunk starts at an arbitrary file offset. The mapping begins at the
//! nearest page boundary at or below that offset and the chunk bytes start
//! `delta` bytes into it.

use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::chunk::Chunk;
use crate::error::{Error, Result};
use crate::types::{ChunkId, DataType};

/// Returns the alignment required for mapping offsets.
///
/// This is the page size on Unix. Other targets use 64 KiB, the Windows
/// allocation granularity.
#[must_use]
pub fn page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions and only reads a constant.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if let Ok(size) = usize::try_from(size) {
            if size > 0 {
                return size;
            }
        }
    }
    if cfg!(unix) {
        4096
    } else {
        65536
    }
}

/// Owner of the mapped bytes of one chunk.
pub struct ChunkMapping {
    mmap: Mmap,
    delta: usize,
    len: usize,
}

impl std::fmt::Debug for ChunkMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkMapping")
            .field("delta", &self.delta)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl ChunkMapping {
    /// Maps `range` of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or mapped, and
    /// [`Error::Truncated`] if the file ends before `range`.
    pub fn open(path: &Path, range: Range<usize>) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = usize::try_from(file.metadata()?.len()).unwrap_or(usize::MAX);
        if range.end > file_len || range.start > range.end {
            return Err(Error::Truncated {
                context: "chunk mapping",
                needed: range.end,
                available: file_len,
            });
        }

        let boundary = range.start - range.start % page_size();
        let delta = range.start - boundary;
        let len = range.end - range.start;

        // SAFETY: the file is opened read-only and the mapped range lies inside
        // it (checked above). Table files are append-only and chunk bytes are
        // never rewritten once their header slot exists.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(boundary as u64)
                .len(delta + len)
                .map(&file)?
        };

        Ok(Self { mmap, delta, len })
    }

    /// The chunk bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.mmap[self.delta..self.delta + self.len]
    }

    /// Distance between the page boundary and the chunk start.
    #[must_use]
    pub fn delta(&self) -> usize {
        self.delta
    }

    /// Length of the chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for an empty range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A reconstructed chunk: the mapping plus what is needed to view it.
///
/// Segment views returned by [`MappedChunk::chunk`] borrow the mapping and
/// cannot outlive it.
#[derive(Debug)]
pub struct MappedChunk {
    chunk_id: ChunkId,
    file: PathBuf,
    data_types: Arc<[DataType]>,
    mapping: ChunkMapping,
}

impl MappedChunk {
    /// Maps and validates a chunk.
    ///
    /// Every value id is checked once here, so views returned by
    /// [`MappedChunk::chunk`] can be read without bounds failures.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if mapping fails and a format error if the bytes
    /// do not parse as a chunk of `data_types`.
    pub fn open(
        path: &Path,
        range: Range<usize>,
        chunk_id: ChunkId,
        data_types: Arc<[DataType]>,
    ) -> Result<Self> {
        let mapping = ChunkMapping::open(path, range)?;
        Chunk::from_bytes(mapping.bytes(), &data_types)?.validate()?;
        Ok(Self {
            chunk_id,
            file: path.to_path_buf(),
            data_types,
            mapping,
        })
    }

    /// Id of the chunk within its table.
    #[must_use]
    pub fn chunk_id(&self) -> ChunkId {
        self.chunk_id
    }

    /// File the chunk was mapped from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Column types.
    #[must_use]
    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    /// The underlying mapping.
    #[must_use]
    pub fn mapping(&self) -> &ChunkMapping {
        &self.mapping
    }

    /// Zero-copy view of the chunk.
    ///
    /// String records were checked by [`MappedChunk::open`] and are not
    /// scanned again.
    ///
    /// # Errors
    ///
    /// Returns a format error if the bytes do not parse; validated on open.
    pub fn chunk(&self) -> Result<Chunk<'_>> {
        Chunk::from_validated_bytes(self.mapping.bytes(), &self.data_types)
    }
}
