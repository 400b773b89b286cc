//! Tests for file and chunk headers

use super::format::*;
use crate::error::{Error, ErrorKind};

fn header_with(ends: &[usize]) -> FileHeader {
    let mut header = FileHeader::new();
    let mut previous = 0;
    for (id, &end) in ends.iter().enumerate() {
        header.push_chunk(id as u32, end - previous).unwrap();
        previous = end;
    }
    header
}

// ========== FileHeader ==========

#[test]
fn test_empty_header_layout() {
    let bytes = FileHeader::new().encode();

    assert_eq!(bytes.len(), FILE_HEADER_BYTES);
    assert_eq!(FILE_HEADER_BYTES, 408);
    assert_eq!(&bytes[0..4], &STORAGE_FORMAT_VERSION.to_le_bytes());
    assert!(bytes[4..].iter().all(|&b| b == 0));
}

#[test]
fn test_push_chunk_accumulates_offset_ends() {
    // Arrange
    let mut header = FileHeader::new();

    // Act
    header.push_chunk(7, 100).unwrap();
    header.push_chunk(8, 40).unwrap();

    // Assert
    assert_eq!(header.chunk_ids(), &[7, 8]);
    assert_eq!(header.chunk_offset_ends(), &[100, 140]);
    assert_eq!(header.chunk_range(1), Some(100..140));
    assert_eq!(header.chunk_file_range(0), Some(408..508));
    assert_eq!(header.chunk_range(2), None);
    assert_eq!(header.file_len(), 408 + 140);
}

#[test]
fn test_encoded_slots_follow_count_and_version() {
    let header = header_with(&[10, 25]);

    let bytes = header.encode();

    let word = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    assert_eq!(word(1), 2);
    assert_eq!(word(2), 0);
    assert_eq!(word(3), 1);
    assert_eq!(word(2 + MAX_CHUNKS_PER_FILE), 10);
    assert_eq!(word(3 + MAX_CHUNKS_PER_FILE), 25);
    assert_eq!(FileHeader::decode(&bytes).unwrap(), header);
}

#[test]
fn test_header_full_after_capacity() {
    let mut header = FileHeader::new();
    for id in 0..MAX_CHUNKS_PER_FILE {
        header.push_chunk(id as u32, 1).unwrap();
    }
    assert!(header.is_full());

    let err = header.push_chunk(99, 1).unwrap_err();

    assert!(matches!(err, Error::HeaderFull(50)));
    assert_eq!(err.kind(), ErrorKind::Contract);
    assert_eq!(header.chunk_count(), MAX_CHUNKS_PER_FILE);
}

#[test]
fn test_decode_rejects_foreign_version() {
    let mut bytes = FileHeader::new().encode();
    bytes[0..4].copy_from_slice(&2u32.to_le_bytes());

    let err = FileHeader::decode(&bytes).unwrap_err();

    assert!(matches!(
        err,
        Error::VersionMismatch {
            expected: 1,
            found: 2
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_decode_rejects_count_above_capacity() {
    let mut bytes = FileHeader::new().encode();
    bytes[4..8].copy_from_slice(&51u32.to_le_bytes());

    let err = FileHeader::decode(&bytes).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_decode_rejects_non_increasing_offsets() {
    let mut bytes = header_with(&[10, 20]).encode();
    let second_end = (3 + MAX_CHUNKS_PER_FILE) * 4;
    bytes[second_end..second_end + 4].copy_from_slice(&10u32.to_le_bytes());

    let err = FileHeader::decode(&bytes).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_decode_rejects_short_input() {
    let bytes = FileHeader::new().encode();

    let err = FileHeader::decode(&bytes[..FILE_HEADER_BYTES - 1]).unwrap_err();

    assert!(matches!(err, Error::Truncated { .. }));
}

// ========== ChunkHeader ==========

#[test]
fn test_chunk_header_ranges() {
    let header = ChunkHeader {
        row_count: 3,
        segment_offset_ends: vec![16, 16, 40],
    };

    assert_eq!(header.byte_len(), chunk_header_bytes(3));
    assert_eq!(header.byte_len(), 16);
    assert_eq!(header.data_len(), 40);
    assert_eq!(header.segment_range(0), Some(0..16));
    assert_eq!(header.segment_range(1), Some(16..16));
    assert_eq!(header.segment_range(2), Some(16..40));
    assert_eq!(header.segment_range(3), None);
}

#[test]
fn test_chunk_header_encode_decode() {
    let header = ChunkHeader {
        row_count: 500,
        segment_offset_ends: vec![3012, 4524],
    };
    let mut bytes = Vec::new();

    header.encode_into(&mut bytes);

    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[0..4], &500u32.to_le_bytes());
    assert_eq!(ChunkHeader::decode(&bytes, 2).unwrap(), header);
}

#[test]
fn test_chunk_header_rejects_decreasing_offsets() {
    let mut bytes = Vec::new();
    ChunkHeader {
        row_count: 1,
        segment_offset_ends: vec![20, 10],
    }
    .encode_into(&mut bytes);

    let err = ChunkHeader::decode(&bytes, 2).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_chunk_header_truncated() {
    let err = ChunkHeader::decode(&[0; 8], 2).unwrap_err();

    assert!(matches!(err, Error::Truncated { .. }));
}
