//! Tests for `error` module

use super::error::*;

fn all_variants() -> Vec<Error> {
    vec![
        Error::Io(std::io::Error::other("test")),
        Error::UnknownEncoding(9),
        Error::VersionMismatch {
            expected: 1,
            found: 2,
        },
        Error::Truncated {
            context: "dictionary",
            needed: 16,
            available: 4,
        },
        Error::Corrupted("test".into()),
        Error::DictionaryTooLarge(usize::MAX),
        Error::Serialization("test".into()),
        Error::ValueIdOutOfBounds {
            value_id: 7,
            len: 3,
        },
        Error::BorrowedSegment,
        Error::HeaderFull(50),
        Error::TableExists("t".into()),
        Error::TableNotFound("t".into()),
        Error::SchemaMismatch("test".into()),
        Error::InvalidArgument("test".into()),
    ]
}

// -------------------------------------------------------------------------
// Error code tests
// -------------------------------------------------------------------------

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors = all_variants();

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(
        codes.len(),
        unique_codes.len(),
        "Error codes must be unique"
    );

    for code in &codes {
        assert!(
            code.starts_with("STRAT-"),
            "Code {code} should start with STRAT-"
        );
    }
}

#[test]
fn test_error_display_includes_code() {
    // Arrange
    let err = Error::TableNotFound("lineitem".into());

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.starts_with("[STRAT-012]"));
    assert!(display.contains("lineitem"));
}

#[test]
fn test_io_error_keeps_os_description() {
    // Arrange
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");

    // Act
    let err: Error = io.into();

    // Assert
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("no such file"));
}

// -------------------------------------------------------------------------
// Error kind tests
// -------------------------------------------------------------------------

#[test]
fn test_format_faults_are_classified() {
    assert_eq!(Error::UnknownEncoding(42).kind(), ErrorKind::Format);
    assert_eq!(
        Error::VersionMismatch {
            expected: 1,
            found: 0
        }
        .kind(),
        ErrorKind::Format
    );
    assert_eq!(Error::DictionaryTooLarge(1).kind(), ErrorKind::Format);
}

#[test]
fn test_contract_faults_are_classified() {
    assert_eq!(Error::BorrowedSegment.kind(), ErrorKind::Contract);
    assert_eq!(Error::HeaderFull(50).kind(), ErrorKind::Contract);
    assert_eq!(
        Error::ValueIdOutOfBounds {
            value_id: 3,
            len: 3
        }
        .kind(),
        ErrorKind::Contract
    );
}

#[test]
fn test_only_registry_errors_are_recoverable() {
    for err in all_variants() {
        assert_eq!(
            err.is_recoverable(),
            matches!(err, Error::TableExists(_) | Error::TableNotFound(_)),
            "{err}"
        );
    }
}

#[test]
fn test_io_and_contract_faults_are_final() {
    assert!(!Error::Io(std::io::Error::other("disk full")).is_recoverable());
    assert!(!Error::BorrowedSegment.is_recoverable());
    assert!(!Error::HeaderFull(50).is_recoverable());
    assert!(!Error::Corrupted("x".into()).is_recoverable());
}

#[test]
fn test_serde_json_error_converts_to_serialization() {
    // Arrange
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();

    // Act
    let err: Error = parse_err.into();

    // Assert
    assert_eq!(err.code(), "STRAT-007");
}
