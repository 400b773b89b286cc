//! Dictionary-encoded column segments.
//!
//! A segment is one column of one chunk: a sorted dictionary of distinct
//! values plus an attribute vector holding one [`ValueId`] per row. The id
//! equal to the dictionary length marks NULL.
//!
//! Segments either own their data (write path) or borrow it from a mapped
//! file (read path). Borrowed segments are tied to the mapping by `'a`.

mod dictionary;
mod encoding;
mod fixed_string;
mod numeric;

pub use dictionary::{Dictionary, DictionaryValue};
pub use encoding::{
    PersistedEncoding, FIXED_STRING_SEGMENT_HEADER_BYTES, NUMERIC_SEGMENT_HEADER_BYTES,
};
pub use fixed_string::{FixedStringDictionary, FixedStringSegment};
pub use numeric::DictionarySegment;

#[cfg(test)]
mod fixed_string_tests;

use std::io::Write;

use crate::compression::CompressedVectorType;
use crate::error::{Error, Result};
use crate::types::{DataType, Value, ValueId};

/// Any supported column segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    /// `int` column.
    Int(DictionarySegment<'a, i32>),
    /// `long` column.
    Long(DictionarySegment<'a, i64>),
    /// `float` column.
    Float(DictionarySegment<'a, f32>),
    /// `double` column.
    Double(DictionarySegment<'a, f64>),
    /// Fixed-width `string` column.
    FixedString(FixedStringSegment<'a>),
}

macro_rules! dispatch {
    ($segment:expr, $s:ident => $body:expr) => {
        match $segment {
            Segment::Int($s) => $body,
            Segment::Long($s) => $body,
            Segment::Float($s) => $body,
            Segment::Double($s) => $body,
            Segment::FixedString($s) => $body,
        }
    };
}

impl<'a> Segment<'a> {
    /// Parses a serialized segment of `data_type` without copying.
    ///
    /// # Errors
    ///
    /// Returns a format error if `bytes` is not a well-formed segment.
    pub fn from_bytes(data_type: DataType, bytes: &'a [u8]) -> Result<Self> {
        Ok(match data_type {
            DataType::Int => Self::Int(DictionarySegment::from_bytes(bytes)?),
            DataType::Long => Self::Long(DictionarySegment::from_bytes(bytes)?),
            DataType::Float => Self::Float(DictionarySegment::from_bytes(bytes)?),
            DataType::Double => Self::Double(DictionarySegment::from_bytes(bytes)?),
            DataType::String => Self::FixedString(FixedStringSegment::from_bytes(bytes)?),
        })
    }

    /// Parses bytes that already passed [`Segment::from_bytes`], skipping
    /// the per-record string checks.
    pub(crate) fn from_validated_bytes(data_type: DataType, bytes: &'a [u8]) -> Result<Self> {
        match data_type {
            DataType::String => {
                FixedStringSegment::from_validated_bytes(bytes).map(Self::FixedString)
            }
            _ => Self::from_bytes(data_type, bytes),
        }
    }

    /// Logical type of the column.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int(_) => DataType::Int,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::FixedString(_) => DataType::String,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        dispatch!(self, s => s.size())
    }

    /// Value id stored for `row`.
    #[must_use]
    pub fn value_id(&self, row: usize) -> ValueId {
        dispatch!(self, s => s.value_id(row))
    }

    /// Decodes `row` into a [`Value`].
    ///
    /// # Panics
    ///
    /// Panics if `row >= size()`.
    #[must_use]
    pub fn value(&self, row: usize) -> Value {
        match self {
            Self::Int(s) => s.get_typed_value(row).into(),
            Self::Long(s) => s.get_typed_value(row).into(),
            Self::Float(s) => s.get_typed_value(row).into(),
            Self::Double(s) => s.get_typed_value(row).into(),
            Self::FixedString(s) => s.get_typed_value(row).into(),
        }
    }

    /// First id whose entry is `>= value`, or [`INVALID_VALUE_ID`](crate::types::INVALID_VALUE_ID).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value` has a different type.
    pub fn lower_bound(&self, value: &Value) -> Result<ValueId> {
        Ok(match self {
            Self::Int(s) => s.lower_bound(self.typed(value)?),
            Self::Long(s) => s.lower_bound(self.typed(value)?),
            Self::Float(s) => s.lower_bound(self.typed(value)?),
            Self::Double(s) => s.lower_bound(self.typed(value)?),
            Self::FixedString(s) => s.lower_bound(self.string(value)?),
        })
    }

    /// First id whose entry is `> value`, or [`INVALID_VALUE_ID`](crate::types::INVALID_VALUE_ID).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `value` has a different type.
    pub fn upper_bound(&self, value: &Value) -> Result<ValueId> {
        Ok(match self {
            Self::Int(s) => s.upper_bound(self.typed(value)?),
            Self::Long(s) => s.upper_bound(self.typed(value)?),
            Self::Float(s) => s.upper_bound(self.typed(value)?),
            Self::Double(s) => s.upper_bound(self.typed(value)?),
            Self::FixedString(s) => s.upper_bound(self.string(value)?),
        })
    }

    /// Returns the dictionary entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueIdOutOfBounds`] unless `id < unique_values_count()`.
    pub fn value_of_value_id(&self, id: ValueId) -> Result<Value> {
        Ok(match self {
            Self::Int(s) => s.value_of_value_id(id)?.into(),
            Self::Long(s) => s.value_of_value_id(id)?.into(),
            Self::Float(s) => s.value_of_value_id(id)?.into(),
            Self::Double(s) => s.value_of_value_id(id)?.into(),
            Self::FixedString(s) => s.value_of_value_id(id)?.into(),
        })
    }

    /// Number of distinct non-null values.
    #[must_use]
    pub fn unique_values_count(&self) -> usize {
        dispatch!(self, s => s.unique_values_count())
    }

    /// Id that marks a NULL row.
    #[must_use]
    pub fn null_value_id(&self) -> ValueId {
        dispatch!(self, s => s.null_value_id())
    }

    /// Layout of the attribute vector.
    #[must_use]
    pub fn compressed_vector_type(&self) -> CompressedVectorType {
        dispatch!(self, s => s.compressed_vector_type())
    }

    /// Checks that every stored id addresses the dictionary or is NULL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] naming the first offending row.
    pub fn validate(&self) -> Result<()> {
        dispatch!(self, s => s.validate())
    }

    /// Exact number of bytes [`Segment::serialize`] writes.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        dispatch!(self, s => s.serialized_len())
    }

    /// Writes the on-disk form.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    pub fn serialize<W: Write>(&self, sink: &mut W) -> Result<()> {
        dispatch!(self, s => s.serialize(sink))
    }

    /// Copies an owned segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BorrowedSegment`] if the dictionary is borrowed.
    pub fn deep_copy(&self) -> Result<Segment<'static>> {
        Ok(match self {
            Self::Int(s) => Segment::Int(s.deep_copy()?),
            Self::Long(s) => Segment::Long(s.deep_copy()?),
            Self::Float(s) => Segment::Float(s.deep_copy()?),
            Self::Double(s) => Segment::Double(s.deep_copy()?),
            Self::FixedString(s) => Segment::FixedString(s.deep_copy()?),
        })
    }

    /// Bytes held by this segment.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        dispatch!(self, s => s.memory_usage())
    }

    fn typed<T: DictionaryValue>(&self, value: &Value) -> Result<T> {
        T::from_value(value).ok_or_else(|| self.type_mismatch(value))
    }

    fn string<'v>(&self, value: &'v Value) -> Result<&'v str> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(self.type_mismatch(other)),
        }
    }

    fn type_mismatch(&self, value: &Value) -> Error {
        Error::InvalidArgument(format!(
            "cannot compare {} column with {value:?}",
            self.data_type()
        ))
    }
}

impl<'a> From<DictionarySegment<'a, i32>> for Segment<'a> {
    fn from(segment: DictionarySegment<'a, i32>) -> Self {
        Self::Int(segment)
    }
}

impl<'a> From<DictionarySegment<'a, i64>> for Segment<'a> {
    fn from(segment: DictionarySegment<'a, i64>) -> Self {
        Self::Long(segment)
    }
}

impl<'a> From<DictionarySegment<'a, f32>> for Segment<'a> {
    fn from(segment: DictionarySegment<'a, f32>) -> Self {
        Self::Float(segment)
    }
}

impl<'a> From<DictionarySegment<'a, f64>> for Segment<'a> {
    fn from(segment: DictionarySegment<'a, f64>) -> Self {
        Self::Double(segment)
    }
}

impl<'a> From<FixedStringSegment<'a>> for Segment<'a> {
    fn from(segment: FixedStringSegment<'a>) -> Self {
        Self::FixedString(segment)
    }
}
