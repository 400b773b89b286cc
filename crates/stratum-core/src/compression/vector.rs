//! The closed set of attribute vector layouts.

use std::borrow::Cow;
use std::io::{self, Write};

use super::bitpacking::BitPackedVector;
use crate::error::{Error, Result};
use crate::types::ValueId;
use crate::util::ByteReader;

/// Physical layout of an attribute vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedVectorType {
    /// One byte per value.
    FixedWidthInteger1Byte,
    /// Two little-endian bytes per value.
    FixedWidthInteger2Byte,
    /// Four little-endian bytes per value.
    FixedWidthInteger4Byte,
    /// Runtime-chosen bit width.
    BitPacking,
}

impl CompressedVectorType {
    /// Bytes per element for the fixed-width layouts.
    #[must_use]
    pub const fn element_width(self) -> Option<usize> {
        match self {
            Self::FixedWidthInteger1Byte => Some(1),
            Self::FixedWidthInteger2Byte => Some(2),
            Self::FixedWidthInteger4Byte => Some(4),
            Self::BitPacking => None,
        }
    }

    /// Narrowest fixed-width layout holding `max_value_id`.
    #[must_use]
    pub const fn narrowest_fixed_width(max_value_id: u32) -> Self {
        if max_value_id <= u8::MAX as u32 {
            Self::FixedWidthInteger1Byte
        } else if max_value_id <= u16::MAX as u32 {
            Self::FixedWidthInteger2Byte
        } else {
            Self::FixedWidthInteger4Byte
        }
    }
}

/// Attribute vector: one value id per row in one of four layouts.
///
/// Fixed-width payloads are kept as little-endian bytes, so a vector imported
/// from a mapping borrows the mapped bytes without any alignment requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressedVector<'a> {
    /// 1-byte value ids.
    U8(Cow<'a, [u8]>),
    /// 2-byte value ids.
    U16(Cow<'a, [u8]>),
    /// 4-byte value ids.
    U32(Cow<'a, [u8]>),
    /// Bit-packed value ids.
    BitPacked(BitPackedVector<'a>),
}

impl CompressedVector<'static> {
    /// Builds a 1-byte vector that owns `values`.
    #[must_use]
    pub fn from_u8(values: Vec<u8>) -> Self {
        Self::U8(Cow::Owned(values))
    }

    /// Builds a 2-byte vector.
    #[must_use]
    pub fn from_u16(values: &[u16]) -> Self {
        Self::U16(Cow::Owned(
            values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ))
    }

    /// Builds a 4-byte vector.
    #[must_use]
    pub fn from_u32(values: &[u32]) -> Self {
        Self::U32(Cow::Owned(
            values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        ))
    }

    /// Compresses `values` into the requested layout.
    ///
    /// Bit packing uses the narrowest width holding the largest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a value does not fit the layout.
    pub fn compress(values: &[u32], vector_type: CompressedVectorType) -> Result<Self> {
        let too_wide = |limit: u32| {
            values
                .iter()
                .find(|&&v| v > limit)
                .map(|v| Error::InvalidArgument(format!("value id {v} exceeds {vector_type:?}")))
        };
        match vector_type {
            CompressedVectorType::FixedWidthInteger1Byte => {
                if let Some(err) = too_wide(u32::from(u8::MAX)) {
                    return Err(err);
                }
                #[allow(clippy::cast_possible_truncation)] // Range checked above
                Ok(Self::from_u8(values.iter().map(|&v| v as u8).collect()))
            }
            CompressedVectorType::FixedWidthInteger2Byte => {
                if let Some(err) = too_wide(u32::from(u16::MAX)) {
                    return Err(err);
                }
                #[allow(clippy::cast_possible_truncation)] // Range checked above
                let narrowed: Vec<u16> = values.iter().map(|&v| v as u16).collect();
                Ok(Self::from_u16(&narrowed))
            }
            CompressedVectorType::FixedWidthInteger4Byte => Ok(Self::from_u32(values)),
            CompressedVectorType::BitPacking => {
                Ok(Self::BitPacked(BitPackedVector::pack_minimal(values)?))
            }
        }
    }
}

impl<'a> CompressedVector<'a> {
    /// Parses `len` values of `vector_type` from `reader`, borrowing the bytes.
    ///
    /// # Errors
    ///
    /// Returns a format error if the bytes are truncated or malformed.
    pub fn import(
        vector_type: CompressedVectorType,
        len: usize,
        reader: &mut ByteReader<'a>,
    ) -> Result<Self> {
        let fixed = |reader: &mut ByteReader<'a>, width: usize| {
            let bytes = len
                .checked_mul(width)
                .ok_or_else(|| Error::Corrupted(format!("attribute vector length {len}")))?;
            reader.take(bytes, "attribute vector").map(Cow::Borrowed)
        };
        Ok(match vector_type {
            CompressedVectorType::FixedWidthInteger1Byte => Self::U8(fixed(reader, 1)?),
            CompressedVectorType::FixedWidthInteger2Byte => Self::U16(fixed(reader, 2)?),
            CompressedVectorType::FixedWidthInteger4Byte => Self::U32(fixed(reader, 4)?),
            CompressedVectorType::BitPacking => {
                Self::BitPacked(BitPackedVector::import(len, reader)?)
            }
        })
    }

    /// Returns the layout of this vector.
    #[must_use]
    pub fn vector_type(&self) -> CompressedVectorType {
        match self {
            Self::U8(_) => CompressedVectorType::FixedWidthInteger1Byte,
            Self::U16(_) => CompressedVectorType::FixedWidthInteger2Byte,
            Self::U32(_) => CompressedVectorType::FixedWidthInteger4Byte,
            Self::BitPacked(_) => CompressedVectorType::BitPacking,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(bytes) => bytes.len(),
            Self::U16(bytes) => bytes.len() / 2,
            Self::U32(bytes) => bytes.len() / 4,
            Self::BitPacked(packed) => packed.len(),
        }
    }

    /// Returns true if the vector has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value id stored for `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize) -> ValueId {
        ValueId(match self {
            Self::U8(bytes) => u32::from(bytes[row]),
            Self::U16(bytes) => {
                let at = row * 2;
                u32::from(u16::from_le_bytes([bytes[at], bytes[at + 1]]))
            }
            Self::U32(bytes) => {
                let at = row * 4;
                u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
            }
            Self::BitPacked(packed) => packed.get(row),
        })
    }

    /// Iterates over all value ids in row order.
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        (0..self.len()).map(move |row| self.get(row))
    }

    /// Serialized size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Self::U8(bytes) | Self::U16(bytes) | Self::U32(bytes) => bytes.len(),
            Self::BitPacked(packed) => 4 + packed.payload_bytes(),
        }
    }

    /// Serialized size of `len` rows in the given layout.
    ///
    /// Bit packing needs the width because the payload depends on it.
    #[must_use]
    pub fn byte_len_for(vector_type: CompressedVectorType, len: usize, bits: u32) -> usize {
        match vector_type.element_width() {
            Some(width) => len * width,
            None => 4 + BitPackedVector::payload_len(len, bits),
        }
    }

    /// Writes the serialized form to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    pub fn export<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        match self {
            Self::U8(bytes) | Self::U16(bytes) | Self::U32(bytes) => sink.write_all(bytes),
            Self::BitPacked(packed) => packed.export(sink),
        }
    }

    /// Returns true if the payload borrows external memory.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        match self {
            Self::U8(bytes) | Self::U16(bytes) | Self::U32(bytes) => {
                matches!(bytes, Cow::Borrowed(_))
            }
            Self::BitPacked(packed) => packed.is_borrowed(),
        }
    }

    /// Copies the payload into owned memory.
    #[must_use]
    pub fn into_owned(self) -> CompressedVector<'static> {
        match self {
            Self::U8(bytes) => CompressedVector::U8(Cow::Owned(bytes.into_owned())),
            Self::U16(bytes) => CompressedVector::U16(Cow::Owned(bytes.into_owned())),
            Self::U32(bytes) => CompressedVector::U32(Cow::Owned(bytes.into_owned())),
            Self::BitPacked(packed) => CompressedVector::BitPacked(packed.into_owned()),
        }
    }
}
