//! On-disk encoding tags and segment header sizes.

use crate::compression::CompressedVectorType;
use crate::error::{Error, Result};

/// Bytes of a numeric segment header: tag, dictionary length, vector length.
pub const NUMERIC_SEGMENT_HEADER_BYTES: usize = 12;

/// Bytes of a fixed-string segment header: tag, record length, dictionary
/// length, vector length.
pub const FIXED_STRING_SEGMENT_HEADER_BYTES: usize = 16;

/// Tag stored in the first word of every segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PersistedEncoding {
    /// Plain values. Never written; rejected on read.
    Unencoded = 0,
    /// Dictionary with 1-byte value ids.
    Dictionary8Bit = 1,
    /// Dictionary with 2-byte value ids.
    Dictionary16Bit = 2,
    /// Dictionary with 4-byte value ids.
    Dictionary32Bit = 3,
    /// Dictionary with bit-packed value ids.
    DictionaryBitPacking = 4,
}

impl PersistedEncoding {
    /// Parses a tag word.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEncoding`] for tags above 4.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Unencoded),
            1 => Ok(Self::Dictionary8Bit),
            2 => Ok(Self::Dictionary16Bit),
            3 => Ok(Self::Dictionary32Bit),
            4 => Ok(Self::DictionaryBitPacking),
            other => Err(Error::UnknownEncoding(other)),
        }
    }

    /// Returns the tag word.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Returns the attribute vector layout behind a dictionary tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] for [`PersistedEncoding::Unencoded`].
    pub fn vector_type(self) -> Result<CompressedVectorType> {
        match self {
            Self::Unencoded => Err(Error::Corrupted(
                "unencoded segments cannot be read from mapped storage".into(),
            )),
            Self::Dictionary8Bit => Ok(CompressedVectorType::FixedWidthInteger1Byte),
            Self::Dictionary16Bit => Ok(CompressedVectorType::FixedWidthInteger2Byte),
            Self::Dictionary32Bit => Ok(CompressedVectorType::FixedWidthInteger4Byte),
            Self::DictionaryBitPacking => Ok(CompressedVectorType::BitPacking),
        }
    }
}

impl From<CompressedVectorType> for PersistedEncoding {
    fn from(vector_type: CompressedVectorType) -> Self {
        match vector_type {
            CompressedVectorType::FixedWidthInteger1Byte => Self::Dictionary8Bit,
            CompressedVectorType::FixedWidthInteger2Byte => Self::Dictionary16Bit,
            CompressedVectorType::FixedWidthInteger4Byte => Self::Dictionary32Bit,
            CompressedVectorType::BitPacking => Self::DictionaryBitPacking,
        }
    }
}

/// Rejects dictionaries whose length collides with [`INVALID_VALUE_ID`].
///
/// [`INVALID_VALUE_ID`]: crate::types::INVALID_VALUE_ID
pub(crate) fn check_dictionary_len(len: usize) -> Result<u32> {
    match u32::try_from(len) {
        Ok(len) if len < u32::MAX => Ok(len),
        _ => Err(Error::DictionaryTooLarge(len)),
    }
}

/// Converts an attribute vector length to its header word.
pub(crate) fn check_row_count(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::InvalidArgument(format!("attribute vector of {len} rows")))
}
