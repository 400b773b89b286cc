//! Dictionary segments over fixed-width numeric values.
//!
//! # Layout
//!
//! ```text
//! [encoding tag: u32][dictionary len: u32][attribute vector len: u32]
//! [dictionary: len * WIDTH little-endian bytes]
//! [attribute vector bytes]
//! ```

use std::io::Write;
use std::mem::size_of;

use super::dictionary::{Dictionary, DictionaryValue};
use super::encoding::{
    check_dictionary_len, check_row_count, PersistedEncoding, NUMERIC_SEGMENT_HEADER_BYTES,
};
use crate::compression::{CompressedVector, CompressedVectorType};
use crate::error::{Error, Result};
use crate::types::{ValueId, INVALID_VALUE_ID};
use crate::util::ByteReader;

/// One column of one chunk: a sorted dictionary plus one value id per row.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionarySegment<'a, T: DictionaryValue> {
    dictionary: Dictionary<'a, T>,
    attribute_vector: CompressedVector<'a>,
}

impl<T: DictionaryValue> DictionarySegment<'static, T> {
    /// Dictionary-encodes `values`, `None` being NULL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for NaN values or if a value id does
    /// not fit `vector_type`.
    pub fn from_values(values: &[Option<T>], vector_type: CompressedVectorType) -> Result<Self> {
        let mut dictionary: Vec<T> = values.iter().flatten().copied().collect();
        if dictionary.iter().any(|v| v.partial_cmp(v).is_none()) {
            return Err(Error::InvalidArgument(
                "NaN cannot be dictionary encoded".into(),
            ));
        }
        dictionary.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        dictionary.dedup();

        let null_id = check_dictionary_len(dictionary.len())?;
        #[allow(clippy::cast_possible_truncation)] // Bounded by null_id
        let ids: Vec<u32> = values
            .iter()
            .map(|value| match value {
                Some(v) => dictionary.partition_point(|d| d < v) as u32,
                None => null_id,
            })
            .collect();

        let attribute_vector = CompressedVector::compress(&ids, vector_type)?;
        Self::new(dictionary, attribute_vector)
    }
}

impl<'a, T: DictionaryValue> DictionarySegment<'a, T> {
    /// Creates a segment that owns its dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DictionaryTooLarge`] if the dictionary length reaches
    /// [`INVALID_VALUE_ID`] and [`Error::InvalidArgument`] if it is not
    /// strictly ascending.
    pub fn new(dictionary: Vec<T>, attribute_vector: CompressedVector<'a>) -> Result<Self> {
        Self::from_parts(Dictionary::Owned(dictionary), attribute_vector)
    }

    /// Creates a segment over a borrowed dictionary slice.
    ///
    /// # Errors
    ///
    /// Same as [`DictionarySegment::new`].
    pub fn new_borrowed(
        dictionary: &'a [T],
        attribute_vector: CompressedVector<'a>,
    ) -> Result<Self> {
        Self::from_parts(Dictionary::Borrowed(dictionary), attribute_vector)
    }

    fn from_parts(
        dictionary: Dictionary<'a, T>,
        attribute_vector: CompressedVector<'a>,
    ) -> Result<Self> {
        check_dictionary_len(dictionary.len())?;
        check_row_count(attribute_vector.len())?;
        if !dictionary
            .iter()
            .zip(dictionary.iter().skip(1))
            .all(|(lower, upper)| lower < upper)
        {
            return Err(Error::InvalidArgument(
                "dictionary must be strictly ascending".into(),
            ));
        }
        Ok(Self {
            dictionary,
            attribute_vector,
        })
    }

    /// Parses a serialized segment without copying.
    ///
    /// `bytes` must span exactly one segment; it may start at any alignment.
    ///
    /// # Errors
    ///
    /// Returns a format error for unknown tags, oversized dictionaries,
    /// truncated input or trailing bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let encoding = PersistedEncoding::from_tag(reader.u32("segment header")?)?;
        let dictionary_len = reader.u32("segment header")? as usize;
        let vector_len = reader.u32("segment header")? as usize;

        let vector_type = encoding.vector_type()?;
        check_dictionary_len(dictionary_len)?;

        let dictionary_bytes = dictionary_len
            .checked_mul(T::WIDTH)
            .ok_or(Error::DictionaryTooLarge(dictionary_len))?;
        let dictionary = Dictionary::Mapped(reader.take(dictionary_bytes, "dictionary")?);
        let attribute_vector = CompressedVector::import(vector_type, vector_len, &mut reader)?;

        if reader.remaining() != 0 {
            return Err(Error::Corrupted(format!(
                "{} trailing bytes after {} segment",
                reader.remaining(),
                T::DATA_TYPE
            )));
        }

        Ok(Self {
            dictionary,
            attribute_vector,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.attribute_vector.len()
    }

    /// Returns the dictionary.
    #[must_use]
    pub fn dictionary(&self) -> &Dictionary<'a, T> {
        &self.dictionary
    }

    /// Returns the attribute vector.
    #[must_use]
    pub fn attribute_vector(&self) -> &CompressedVector<'a> {
        &self.attribute_vector
    }

    /// Value id stored for `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= size()`.
    #[must_use]
    pub fn value_id(&self, row: usize) -> ValueId {
        self.attribute_vector.get(row)
    }

    /// Decodes `row`; `None` means NULL.
    ///
    /// # Panics
    ///
    /// Panics if `row >= size()` or the stored id lies past the NULL id
    /// (see [`DictionarySegment::validate`]).
    #[must_use]
    pub fn get_typed_value(&self, row: usize) -> Option<T> {
        let id = self.attribute_vector.get(row);
        if id == self.null_value_id() {
            None
        } else {
            Some(self.dictionary.get(id.index()))
        }
    }

    /// Iterates over the decoded rows.
    pub fn values(&self) -> impl Iterator<Item = Option<T>> + '_ {
        (0..self.size()).map(move |row| self.get_typed_value(row))
    }

    /// First id whose entry is `>= value`, or [`INVALID_VALUE_ID`].
    #[must_use]
    pub fn lower_bound(&self, value: T) -> ValueId {
        self.bound(self.dictionary.partition_point(|entry| entry < value))
    }

    /// First id whose entry is `> value`, or [`INVALID_VALUE_ID`].
    #[must_use]
    pub fn upper_bound(&self, value: T) -> ValueId {
        self.bound(self.dictionary.partition_point(|entry| entry <= value))
    }

    #[allow(clippy::cast_possible_truncation)] // Dictionary length checked at construction
    fn bound(&self, index: usize) -> ValueId {
        if index == self.dictionary.len() {
            INVALID_VALUE_ID
        } else {
            ValueId(index as u32)
        }
    }

    /// Returns the entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueIdOutOfBounds`] unless `id < unique_values_count()`.
    pub fn value_of_value_id(&self, id: ValueId) -> Result<T> {
        if id.index() >= self.dictionary.len() {
            return Err(Error::ValueIdOutOfBounds {
                value_id: id.0,
                len: self.dictionary.len(),
            });
        }
        Ok(self.dictionary.get(id.index()))
    }

    /// Number of distinct non-null values.
    #[must_use]
    pub fn unique_values_count(&self) -> usize {
        self.dictionary.len()
    }

    /// Id that marks a NULL row.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Dictionary length checked at construction
    pub fn null_value_id(&self) -> ValueId {
        ValueId(self.dictionary.len() as u32)
    }

    /// Layout of the attribute vector.
    #[must_use]
    pub fn compressed_vector_type(&self) -> CompressedVectorType {
        self.attribute_vector.vector_type()
    }

    /// Checks that every stored id addresses the dictionary or is NULL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] naming the first offending row.
    pub fn validate(&self) -> Result<()> {
        let null_id = self.null_value_id();
        match self.attribute_vector.iter().position(|id| id > null_id) {
            Some(row) => Err(Error::Corrupted(format!(
                "row {row} holds value id {} past dictionary of {}",
                self.attribute_vector.get(row),
                self.dictionary.len()
            ))),
            None => Ok(()),
        }
    }

    /// Exact number of bytes [`DictionarySegment::serialize`] writes.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        NUMERIC_SEGMENT_HEADER_BYTES + self.dictionary.byte_len() + self.attribute_vector.byte_len()
    }

    /// Writes header, dictionary and attribute vector.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    #[allow(clippy::cast_possible_truncation)] // Lengths checked at construction
    pub fn serialize<W: Write>(&self, sink: &mut W) -> Result<()> {
        let encoding = PersistedEncoding::from(self.compressed_vector_type());
        sink.write_all(&encoding.tag().to_le_bytes())?;
        sink.write_all(&(self.dictionary.len() as u32).to_le_bytes())?;
        sink.write_all(&(self.attribute_vector.len() as u32).to_le_bytes())?;
        self.dictionary.export(sink)?;
        self.attribute_vector.export(sink)?;
        Ok(())
    }

    /// Copies dictionary and attribute vector into owned memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BorrowedSegment`] if the dictionary is not owned.
    pub fn deep_copy(&self) -> Result<DictionarySegment<'static, T>> {
        match &self.dictionary {
            Dictionary::Owned(values) => Ok(DictionarySegment {
                dictionary: Dictionary::Owned(values.clone()),
                attribute_vector: self.attribute_vector.clone().into_owned(),
            }),
            Dictionary::Borrowed(_) | Dictionary::Mapped(_) => Err(Error::BorrowedSegment),
        }
    }

    /// Bytes held by this segment, borrowed data included.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        size_of::<Self>() + self.dictionary.byte_len() + self.attribute_vector.byte_len()
    }
}
