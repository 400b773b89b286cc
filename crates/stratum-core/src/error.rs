//! Error types for `Stratum`.
//!
//! Every failure in the storage core falls into one of three kinds:
//! I/O faults, format faults (the bytes on disk are not what we expect) and
//! contract faults (the caller broke a precondition). None of them is retried.

use thiserror::Error;

/// Result type alias for `Stratum` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An open, map, read or write system call failed.
    Io,
    /// Stored bytes are malformed, truncated or of an unknown version.
    Format,
    /// The caller violated an API contract.
    Contract,
}

/// Errors that can occur in `Stratum` operations.
///
/// Error codes follow the pattern `STRAT-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (STRAT-001).
    #[error("[STRAT-001] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown on-disk encoding tag (STRAT-002).
    #[error("[STRAT-002] Unknown segment encoding tag {0}")]
    UnknownEncoding(u32),

    /// Storage format version mismatch (STRAT-003).
    #[error("[STRAT-003] Unsupported storage format version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build reads and writes.
        expected: u32,
        /// Version found in the file header.
        found: u32,
    },

    /// Declared sizes do not fit the available bytes (STRAT-004).
    #[error("[STRAT-004] Truncated data: {context} needs {needed} bytes, {available} available")]
    Truncated {
        /// What was being parsed.
        context: &'static str,
        /// Bytes required by the declared sizes.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// Stored data is structurally invalid (STRAT-005).
    #[error("[STRAT-005] Corrupted data: {0}")]
    Corrupted(String),

    /// Dictionary too large to be addressed by a `ValueId` (STRAT-006).
    #[error("[STRAT-006] Dictionary of {0} entries exceeds the ValueID range")]
    DictionaryTooLarge(usize),

    /// Serialization error (STRAT-007).
    #[error("[STRAT-007] Serialization error: {0}")]
    Serialization(String),

    /// `ValueId` outside the dictionary (STRAT-008).
    #[error("[STRAT-008] ValueID {value_id} out of bounds for dictionary of {len} entries")]
    ValueIdOutOfBounds {
        /// Requested value id.
        value_id: u32,
        /// Dictionary length.
        len: usize,
    },

    /// Deep copy requested on a segment that does not own its data (STRAT-009).
    #[error("[STRAT-009] Cannot deep-copy a segment that borrows its dictionary")]
    BorrowedSegment,

    /// File header chunk table is full (STRAT-010).
    #[error("[STRAT-010] File header capacity of {0} chunks exhausted")]
    HeaderFull(usize),

    /// Table already exists (STRAT-011).
    #[error("[STRAT-011] Table '{0}' already exists")]
    TableExists(String),

    /// Table not found (STRAT-012).
    #[error("[STRAT-012] Table '{0}' not found")]
    TableNotFound(String),

    /// Chunk does not match the table schema (STRAT-013).
    #[error("[STRAT-013] Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Any other caller mistake (STRAT-014).
    #[error("[STRAT-014] Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns the error code (e.g., "STRAT-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "STRAT-001",
            Self::UnknownEncoding(_) => "STRAT-002",
            Self::VersionMismatch { .. } => "STRAT-003",
            Self::Truncated { .. } => "STRAT-004",
            Self::Corrupted(_) => "STRAT-005",
            Self::DictionaryTooLarge(_) => "STRAT-006",
            Self::Serialization(_) => "STRAT-007",
            Self::ValueIdOutOfBounds { .. } => "STRAT-008",
            Self::BorrowedSegment => "STRAT-009",
            Self::HeaderFull(_) => "STRAT-010",
            Self::TableExists(_) => "STRAT-011",
            Self::TableNotFound(_) => "STRAT-012",
            Self::SchemaMismatch(_) => "STRAT-013",
            Self::InvalidArgument(_) => "STRAT-014",
        }
    }

    /// Returns the kind of fault this error represents.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::UnknownEncoding(_)
            | Self::VersionMismatch { .. }
            | Self::Truncated { .. }
            | Self::Corrupted(_)
            | Self::DictionaryTooLarge(_)
            | Self::Serialization(_) => ErrorKind::Format,
            Self::ValueIdOutOfBounds { .. }
            | Self::BorrowedSegment
            | Self::HeaderFull(_)
            | Self::TableExists(_)
            | Self::TableNotFound(_)
            | Self::SchemaMismatch(_)
            | Self::InvalidArgument(_) => ErrorKind::Contract,
        }
    }

    /// Returns true if the same call can succeed once the table registry
    /// changes, i.e. for [`Error::TableExists`] and [`Error::TableNotFound`].
    ///
    /// Every other error is final for the operation: I/O faults are not
    /// retried and format or contract faults fail the same way again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::TableExists(_) | Self::TableNotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
