//! Tests for chunk assembly and serialization

use super::chunk::Chunk;
use super::format::chunk_header_bytes;
use super::test_support::{int_chunk, int_segment, repeated_values_chunk, string_segment};
use crate::compression::CompressedVectorType;
use crate::error::Error;
use crate::types::{DataType, Value};

#[test]
fn test_new_rejects_unequal_row_counts() {
    let segments = vec![int_segment(&[Some(1), Some(2)]), int_segment(&[Some(1)])];

    let err = Chunk::new(segments).unwrap_err();

    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn test_new_rejects_empty_chunk() {
    let err = Chunk::new(Vec::new()).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_segment_offsets_of_repeated_value_columns() {
    // Arrange: 500 rows, column i repeats each value i + 1 times
    let chunk = repeated_values_chunk(500, 5);

    // Act
    let ends = chunk.segment_offset_ends().unwrap();

    // Assert
    assert_eq!(ends, vec![3012, 4524, 5704, 6716, 7628]);
    assert_eq!(
        chunk.get_segment(0).unwrap().compressed_vector_type(),
        CompressedVectorType::FixedWidthInteger2Byte
    );
    assert_eq!(
        chunk.get_segment(1).unwrap().compressed_vector_type(),
        CompressedVectorType::FixedWidthInteger1Byte
    );
    assert_eq!(chunk.byte_len(), chunk_header_bytes(5) + 7628);
}

#[test]
fn test_serialized_chunk_starts_with_header() {
    let chunk = repeated_values_chunk(500, 5);

    let bytes = chunk.to_bytes().unwrap();

    assert_eq!(bytes.len(), chunk.byte_len());
    let word = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    assert_eq!(word(0), 500);
    assert_eq!(word(1), 3012);
    assert_eq!(word(5), 7628);
}

#[test]
fn test_from_bytes_reproduces_rows() {
    // Arrange
    let chunk = Chunk::new(vec![
        int_segment(&[Some(5), None, Some(-3)]),
        string_segment(&[Some("pear"), Some("fig"), None]),
    ])
    .unwrap();
    let bytes = chunk.to_bytes().unwrap();

    // Act
    let parsed = Chunk::from_bytes(&bytes, &[DataType::Int, DataType::String]).unwrap();

    // Assert
    assert_eq!(parsed.size(), 3);
    assert_eq!(parsed.data_types(), vec![DataType::Int, DataType::String]);
    assert_eq!(
        parsed.row(0),
        vec![Value::Int(5), Value::String("pear".into())]
    );
    assert_eq!(
        parsed.row(1),
        vec![Value::Null, Value::String("fig".into())]
    );
    assert_eq!(parsed.row(2), vec![Value::Int(-3), Value::Null]);
}

#[test]
fn test_from_bytes_rejects_trailing_data() {
    let mut bytes = int_chunk(&[vec![1, 2, 3]]).to_bytes().unwrap();
    bytes.push(0);

    let err = Chunk::from_bytes(&bytes, &[DataType::Int]).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_from_bytes_rejects_row_count_disagreement() {
    let mut bytes = int_chunk(&[vec![1, 2, 3]]).to_bytes().unwrap();
    bytes[0..4].copy_from_slice(&4u32.to_le_bytes());

    let err = Chunk::from_bytes(&bytes, &[DataType::Int]).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_from_bytes_truncated_header() {
    let err = Chunk::from_bytes(&[1, 0, 0], &[DataType::Int]).unwrap_err();

    assert!(matches!(err, Error::Truncated { .. }));
}

#[test]
fn test_validate_catches_value_id_past_dictionary() {
    // Arrange: the last byte is the 1-byte id of the last row
    let mut bytes = int_chunk(&[vec![1, 2, 3]]).to_bytes().unwrap();
    *bytes.last_mut().unwrap() = 9;

    // Act
    let parsed = Chunk::from_bytes(&bytes, &[DataType::Int]).unwrap();

    // Assert
    assert!(matches!(
        parsed.validate().unwrap_err(),
        Error::Corrupted(_)
    ));
}
