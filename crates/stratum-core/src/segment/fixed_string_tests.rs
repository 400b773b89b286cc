//! Tests for fixed-width string segments

use super::*;
use crate::compression::{CompressedVector, CompressedVectorType};
use crate::error::Error;
use crate::types::{ValueId, INVALID_VALUE_ID};

fn fruit_segment() -> FixedStringSegment<'static> {
    let dictionary = FixedStringDictionary::new(&["apple", "fig", "kiwi"], 5).unwrap();
    FixedStringSegment::new(dictionary, CompressedVector::from_u8(vec![2, 0, 3, 1])).unwrap()
}

fn serialized(segment: &FixedStringSegment<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    segment.serialize(&mut out).unwrap();
    out
}

#[test]
fn test_dictionary_pads_records() {
    let dictionary = FixedStringDictionary::new(&["ab", "abc"], 4).unwrap();

    assert_eq!(dictionary.chars(), b"ab\0\0abc\0");
    assert_eq!(dictionary.get(0), "ab");
    assert_eq!(dictionary.get(1), "abc");
    assert_eq!(dictionary.byte_len(), 8);
}

#[test]
fn test_dictionary_rejects_long_strings() {
    let err = FixedStringDictionary::new(&["toolong"], 3).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(err.kind(), crate::error::ErrorKind::Contract);
}

#[test]
fn test_dictionary_rejects_interior_nul() {
    assert!(FixedStringDictionary::new(&["a\0b"], 3).is_err());
}

#[test]
fn test_dictionary_rejects_unsorted_strings() {
    let err = FixedStringDictionary::new(&["pear", "apple"], 5).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(FixedStringDictionary::new(&["kiwi", "kiwi"], 4).is_err());
}

#[test]
fn test_full_width_record_has_no_padding() {
    let dictionary = FixedStringDictionary::with_minimal_record_len(&["abcd", "xy"]).unwrap();

    assert_eq!(dictionary.record_len(), 4);
    assert_eq!(dictionary.get(0), "abcd");
    assert_eq!(dictionary.get(1), "xy");
}

#[test]
fn test_typed_values_and_null() {
    let segment = fruit_segment();

    let values: Vec<Option<&str>> = segment.values().collect();

    assert_eq!(values, vec![Some("kiwi"), Some("apple"), None, Some("fig")]);
    assert_eq!(segment.null_value_id(), ValueId(3));
}

#[test]
fn test_string_bounds() {
    let segment = fruit_segment();

    assert_eq!(segment.lower_bound("fig"), ValueId(1));
    assert_eq!(segment.lower_bound("banana"), ValueId(1));
    assert_eq!(segment.upper_bound("fig"), ValueId(2));
    assert_eq!(segment.upper_bound("kiwi"), INVALID_VALUE_ID);
    assert_eq!(segment.lower_bound("zzz"), INVALID_VALUE_ID);
}

#[test]
fn test_serialized_header_order() {
    // Arrange
    let segment = fruit_segment();

    // Act
    let bytes = serialized(&segment);

    // Assert: tag, record length, dictionary length, vector length
    assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
    assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
    assert_eq!(&bytes[8..12], &3u32.to_le_bytes());
    assert_eq!(&bytes[12..16], &4u32.to_le_bytes());
    assert_eq!(&bytes[16..21], b"apple");
    assert_eq!(bytes.len(), 16 + 15 + 4);
    assert_eq!(bytes.len(), segment.serialized_len());
}

#[test]
fn test_mapped_round_trip() {
    // Arrange
    let owned = FixedStringSegment::from_values(
        &[Some("delta"), None, Some("alpha"), Some("delta"), Some("")],
        CompressedVectorType::FixedWidthInteger2Byte,
    )
    .unwrap();
    let mut buffer = vec![0xAB];
    owned.serialize(&mut buffer).unwrap();

    // Act
    let mapped = FixedStringSegment::from_bytes(&buffer[1..]).unwrap();

    // Assert
    assert!(!mapped.dictionary().is_owned());
    assert_eq!(
        mapped.values().collect::<Vec<_>>(),
        vec![Some("delta"), None, Some("alpha"), Some("delta"), Some("")]
    );
    assert_eq!(
        mapped.dictionary().iter().collect::<Vec<_>>(),
        vec!["", "alpha", "delta"]
    );
}

#[test]
fn test_from_bytes_rejects_invalid_utf8() {
    let mut bytes = serialized(&fruit_segment());
    bytes[16] = 0xFF;

    let err = FixedStringSegment::from_bytes(&bytes).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_validated_bytes_skip_record_checks() {
    // Arrange
    let mut bytes = serialized(&fruit_segment());
    bytes[16] = 0xFF;

    // Act
    let segment = FixedStringSegment::from_validated_bytes(&bytes).unwrap();

    // Assert
    assert!(!segment.dictionary().is_owned());
    assert_eq!(segment.dictionary().get(0), "");
    assert_eq!(segment.get_typed_value(3), Some("fig"));
}

#[test]
fn test_from_bytes_rejects_data_after_padding() {
    let dictionary = FixedStringDictionary::new(&["a"], 3).unwrap();
    let segment = FixedStringSegment::new(dictionary, CompressedVector::from_u8(vec![0])).unwrap();
    let mut bytes = serialized(&segment);
    bytes[18] = b'z';

    let err = FixedStringSegment::from_bytes(&bytes).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_value_of_value_id_out_of_bounds() {
    let segment = fruit_segment();

    assert_eq!(segment.value_of_value_id(ValueId(0)).unwrap(), "apple");
    assert!(matches!(
        segment.value_of_value_id(ValueId(3)),
        Err(Error::ValueIdOutOfBounds { .. })
    ));
}

#[test]
fn test_deep_copy_rules() {
    let segment = fruit_segment();
    assert_eq!(segment.deep_copy().unwrap(), segment);

    let bytes = serialized(&segment);
    let mapped = FixedStringSegment::from_bytes(&bytes).unwrap();
    assert!(matches!(mapped.deep_copy(), Err(Error::BorrowedSegment)));
}
