//! File and chunk headers of the binary table format.
//!
//! # File layout
//!
//! ```text
//! FileHeader  := format_version(4) chunk_count(4)
//!                chunk_ids[50](4 each) chunk_offset_ends[50](4 each)     (408 bytes)
//! Chunk       := ChunkHeader Segment*          (one segment per column)
//! ChunkHeader := row_count(4) segment_offset_ends[column_count](4 each)
//! ```
//!
//! All words are little-endian `u32`. Offset ends are prefix sums: entry `i`
//! spans `[ends[i - 1], ends[i])` with `ends[-1] = 0`, measured from the end of
//! the enclosing header.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::types::ChunkId;
use crate::util::{put_u32, ByteReader};

/// Format version written to, and required in, every file header.
pub const STORAGE_FORMAT_VERSION: u32 = 1;

/// Capacity of the chunk tables in a file header.
pub const MAX_CHUNKS_PER_FILE: usize = 50;

/// Size of an encoded [`FileHeader`].
pub const FILE_HEADER_BYTES: usize = 8 + 2 * MAX_CHUNKS_PER_FILE * 4;

/// Size of an encoded [`ChunkHeader`] for `column_count` columns.
#[must_use]
pub const fn chunk_header_bytes(column_count: usize) -> usize {
    4 + 4 * column_count
}

/// Fixed-size header at offset 0 of every table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    version: u32,
    chunk_count: usize,
    chunk_ids: [ChunkId; MAX_CHUNKS_PER_FILE],
    chunk_offset_ends: [u32; MAX_CHUNKS_PER_FILE],
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileHeader {
    /// Empty header of the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: STORAGE_FORMAT_VERSION,
            chunk_count: 0,
            chunk_ids: [0; MAX_CHUNKS_PER_FILE],
            chunk_offset_ends: [0; MAX_CHUNKS_PER_FILE],
        }
    }

    /// Format version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of chunks recorded.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Returns true if no slot is left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.chunk_count == MAX_CHUNKS_PER_FILE
    }

    /// Ids of the recorded chunks in slot order.
    #[must_use]
    pub fn chunk_ids(&self) -> &[ChunkId] {
        &self.chunk_ids[..self.chunk_count]
    }

    /// Offset ends of the recorded chunks in slot order.
    #[must_use]
    pub fn chunk_offset_ends(&self) -> &[u32] {
        &self.chunk_offset_ends[..self.chunk_count]
    }

    /// Bytes of chunk data following the header.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.chunk_offset_ends()
            .last()
            .map_or(0, |&end| end as usize)
    }

    /// Expected total file length.
    #[must_use]
    pub fn file_len(&self) -> usize {
        FILE_HEADER_BYTES + self.data_len()
    }

    /// Records a chunk of `byte_len` bytes in the next free slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HeaderFull`] if all slots are taken and
    /// [`Error::InvalidArgument`] if the offset would overflow `u32`.
    pub fn push_chunk(&mut self, chunk_id: ChunkId, byte_len: usize) -> Result<()> {
        if self.is_full() {
            return Err(Error::HeaderFull(MAX_CHUNKS_PER_FILE));
        }
        let end = u32::try_from(byte_len)
            .ok()
            .and_then(|len| (self.data_len() as u32).checked_add(len))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "chunk of {byte_len} bytes overflows the 32-bit file offsets"
                ))
            })?;
        self.chunk_ids[self.chunk_count] = chunk_id;
        self.chunk_offset_ends[self.chunk_count] = end;
        self.chunk_count += 1;
        Ok(())
    }

    /// Byte range of slot `index`, relative to the end of the header.
    #[must_use]
    pub fn chunk_range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.chunk_count {
            return None;
        }
        let start = if index == 0 {
            0
        } else {
            self.chunk_offset_ends[index - 1] as usize
        };
        Some(start..self.chunk_offset_ends[index] as usize)
    }

    /// Byte range of slot `index`, relative to the start of the file.
    #[must_use]
    pub fn chunk_file_range(&self, index: usize) -> Option<Range<usize>> {
        self.chunk_range(index)
            .map(|r| r.start + FILE_HEADER_BYTES..r.end + FILE_HEADER_BYTES)
    }

    /// Encodes the full fixed-size header, unused slots zeroed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // chunk_count <= MAX_CHUNKS_PER_FILE
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FILE_HEADER_BYTES);
        put_u32(&mut out, self.version);
        put_u32(&mut out, self.chunk_count as u32);
        for &id in &self.chunk_ids {
            put_u32(&mut out, id);
        }
        for &end in &self.chunk_offset_ends {
            put_u32(&mut out, end);
        }
        out
    }

    /// Decodes a header from the first [`FILE_HEADER_BYTES`] of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns a format error for short input, a foreign version, a chunk
    /// count above capacity or offsets that are not strictly increasing.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let version = reader.u32("file header")?;
        if version != STORAGE_FORMAT_VERSION {
            return Err(Error::VersionMismatch {
                expected: STORAGE_FORMAT_VERSION,
                found: version,
            });
        }
        let chunk_count = reader.u32("file header")? as usize;
        if chunk_count > MAX_CHUNKS_PER_FILE {
            return Err(Error::Corrupted(format!(
                "file header records {chunk_count} chunks, capacity is {MAX_CHUNKS_PER_FILE}"
            )));
        }

        let mut header = Self::new();
        header.chunk_count = chunk_count;
        for slot in &mut header.chunk_ids {
            *slot = reader.u32("file header")?;
        }
        for slot in &mut header.chunk_offset_ends {
            *slot = reader.u32("file header")?;
        }

        let mut previous = 0;
        for &end in header.chunk_offset_ends() {
            if end <= previous {
                return Err(Error::Corrupted(format!(
                    "chunk offsets not increasing: {end} after {previous}"
                )));
            }
            previous = end;
        }
        Ok(header)
    }
}

/// Header in front of every chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Rows in every segment of the chunk.
    pub row_count: u32,
    /// Offset ends of the segments, relative to the end of this header.
    pub segment_offset_ends: Vec<u32>,
}

impl ChunkHeader {
    /// Encoded size.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        chunk_header_bytes(self.segment_offset_ends.len())
    }

    /// Bytes of segment data following the header.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.segment_offset_ends
            .last()
            .map_or(0, |&end| end as usize)
    }

    /// Byte range of segment `column`, relative to the end of the header.
    #[must_use]
    pub fn segment_range(&self, column: usize) -> Option<Range<usize>> {
        let end = *self.segment_offset_ends.get(column)? as usize;
        let start = if column == 0 {
            0
        } else {
            self.segment_offset_ends[column - 1] as usize
        };
        Some(start..end)
    }

    /// Appends the encoded header to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        put_u32(out, self.row_count);
        for &end in &self.segment_offset_ends {
            put_u32(out, end);
        }
    }

    /// Decodes the header of a chunk with `column_count` columns.
    ///
    /// # Errors
    ///
    /// Returns a format error for short input or decreasing offsets.
    pub fn decode(bytes: &[u8], column_count: usize) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let row_count = reader.u32("chunk header")?;
        let segment_offset_ends = reader.u32_array(column_count, "chunk header")?;
        if segment_offset_ends.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(Error::Corrupted("segment offsets are not monotonic".into()));
        }
        Ok(Self {
            row_count,
            segment_offset_ends,
        })
    }
}
