//! Writing, appending and reading table files.
//!
//! These functions know nothing about tables; callers hold the per-file lock
//! around [`append_chunk`].

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::chunk::Chunk;
use super::format::{
    chunk_header_bytes, ChunkHeader, FileHeader, FILE_HEADER_BYTES, MAX_CHUNKS_PER_FILE,
};
use super::mapping::MappedChunk;
use crate::error::{Error, Result};
use crate::types::{ChunkId, DataType};

/// Name of file `index` of `table`.
#[must_use]
pub fn table_file_name(table: &str, index: u32) -> String {
    format!("{table}_{index}.bin")
}

/// Writes `chunks` into a fresh file.
///
/// An existing file at `path` is replaced only if it is shorter than a file
/// header or its header records no chunks.
///
/// # Errors
///
/// Returns [`Error::HeaderFull`] for more than [`MAX_CHUNKS_PER_FILE`]
/// chunks, [`Error::Corrupted`] if `path` already holds chunks and an I/O
/// error if writing fails.
pub fn write_chunks(
    path: &Path,
    chunks: &[(ChunkId, &Chunk<'_>)],
    sync: bool,
) -> Result<FileHeader> {
    if chunks.len() > MAX_CHUNKS_PER_FILE {
        return Err(Error::HeaderFull(MAX_CHUNKS_PER_FILE));
    }
    let mut header = FileHeader::new();
    for (chunk_id, chunk) in chunks {
        header.push_chunk(*chunk_id, chunk.byte_len())?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    if file.metadata()?.len() > 0 {
        match read_header_from(&mut file) {
            Ok(existing) if existing.chunk_count() > 0 => {
                return Err(Error::Corrupted(format!(
                    "{} already holds {} chunks",
                    path.display(),
                    existing.chunk_count()
                )));
            }
            Ok(_) | Err(Error::Truncated { .. }) => {}
            Err(e) => return Err(e),
        }
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
    }
    let mut writer = BufWriter::new(file);
    writer.write_all(&header.encode())?;
    for (_, chunk) in chunks {
        chunk.serialize(&mut writer)?;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    if sync {
        file.sync_all()?;
    }

    debug!(
        path = %path.display(),
        chunks = chunks.len(),
        bytes = header.file_len(),
        "Wrote chunk file"
    );
    Ok(header)
}

/// Writes a single chunk into a fresh file.
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn write_chunk(
    path: &Path,
    chunk_id: ChunkId,
    chunk: &Chunk<'_>,
    sync: bool,
) -> Result<FileHeader> {
    write_chunks(path, &[(chunk_id, chunk)], sync)
}

/// Appends a chunk to an existing file and records it in the header.
///
/// Chunk bytes are written before the header is rewritten, so a crash in
/// between leaves a header that still describes a valid prefix. Bytes past
/// the last recorded chunk are such leftovers and are discarded. A failed
/// chunk write is cut back off before returning.
///
/// # Errors
///
/// Returns [`Error::HeaderFull`] if the file already holds
/// [`MAX_CHUNKS_PER_FILE`] chunks, [`Error::Corrupted`] if the file is
/// shorter than its header describes and an I/O error if writing fails.
pub fn append_chunk(
    path: &Path,
    chunk_id: ChunkId,
    chunk: &Chunk<'_>,
    sync: bool,
) -> Result<FileHeader> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut header = read_header_from(&mut file)?;

    let committed = header.file_len() as u64;
    let file_len = file.metadata()?.len();
    if file_len < committed {
        return Err(Error::Corrupted(format!(
            "{} is {file_len} bytes, header describes {committed}",
            path.display()
        )));
    }
    if file_len > committed {
        warn!(
            path = %path.display(),
            bytes = file_len - committed,
            "Discarding bytes past the last recorded chunk"
        );
        file.set_len(committed)?;
    }
    header.push_chunk(chunk_id, chunk.byte_len())?;

    if let Err(e) = write_tail(&mut file, committed, chunk) {
        if let Err(rollback) = file.set_len(committed) {
            warn!(
                path = %path.display(),
                error = %rollback,
                "Failed to cut back partial chunk"
            );
        }
        return Err(e);
    }

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.encode())?;
    if sync {
        file.sync_all()?;
    }

    debug!(
        path = %path.display(),
        chunk_id,
        slot = header.chunk_count() - 1,
        "Appended chunk"
    );
    Ok(header)
}

/// Reads the header of the file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read and a format error if the
/// header is malformed.
pub fn read_file_header(path: &Path) -> Result<FileHeader> {
    let mut file = File::open(path)?;
    read_header_from(&mut file)
}

/// Reads the chunk header stored in `slot`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an unused slot, an I/O error if
/// reading fails and a format error if the header is malformed.
pub fn read_chunk_header(
    path: &Path,
    header: &FileHeader,
    slot: usize,
    column_count: usize,
) -> Result<ChunkHeader> {
    let range = slot_range(header, slot)?;
    let len = chunk_header_bytes(column_count);
    if len > range.len() {
        return Err(Error::Truncated {
            context: "chunk header",
            needed: len,
            available: range.len(),
        });
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.start as u64))?;
    let mut bytes = Vec::with_capacity(len);
    file.take(len as u64).read_to_end(&mut bytes)?;
    ChunkHeader::decode(&bytes, column_count)
}

/// Maps the chunk stored in `slot`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an unused slot, an I/O error if
/// mapping fails and a format error if the chunk does not parse.
pub fn map_chunk(
    path: &Path,
    header: &FileHeader,
    slot: usize,
    data_types: Arc<[DataType]>,
) -> Result<MappedChunk> {
    let range = slot_range(header, slot)?;
    let chunk_id = header.chunk_ids()[slot];
    debug!(
        path = %path.display(),
        slot,
        chunk_id,
        bytes = range.len(),
        "Mapping chunk"
    );
    MappedChunk::open(path, range, chunk_id, data_types)
}

fn write_tail(file: &mut File, offset: u64, chunk: &Chunk<'_>) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    let mut writer = BufWriter::new(file);
    chunk.serialize(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn slot_range(header: &FileHeader, slot: usize) -> Result<std::ops::Range<usize>> {
    header.chunk_file_range(slot).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "chunk slot {slot} unused, file holds {} chunks",
            header.chunk_count()
        ))
    })
}

fn read_header_from(file: &mut File) -> Result<FileHeader> {
    let mut bytes = Vec::with_capacity(FILE_HEADER_BYTES);
    file.seek(SeekFrom::Start(0))?;
    Read::by_ref(file)
        .take(FILE_HEADER_BYTES as u64)
        .read_to_end(&mut bytes)?;
    if bytes.len() < FILE_HEADER_BYTES {
        return Err(Error::Truncated {
            context: "file header",
            needed: FILE_HEADER_BYTES,
            available: bytes.len(),
        });
    }
    FileHeader::decode(&bytes)
}
