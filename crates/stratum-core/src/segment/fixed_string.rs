//! Dictionary segments over fixed-width string records.
//!
//! Every dictionary entry occupies `record_len` bytes, NUL padded, so entry
//! `n` starts at `n * record_len`.
//!
//! # Layout
//!
//! ```text
//! [encoding tag: u32][record len: u32][dictionary len: u32][attribute vector len: u32]
//! [dictionary: len * record_len bytes]
//! [attribute vector bytes]
//! ```

use std::borrow::Cow;
use std::io::Write;
use std::mem::size_of;

use super::encoding::{
    check_dictionary_len, check_row_count, PersistedEncoding, FIXED_STRING_SEGMENT_HEADER_BYTES,
};
use crate::compression::{CompressedVector, CompressedVectorType};
use crate::error::{Error, Result};
use crate::types::{ValueId, INVALID_VALUE_ID};
use crate::util::ByteReader;

/// Sorted strings stored as uniform, NUL-padded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedStringDictionary<'a> {
    record_len: usize,
    len: usize,
    chars: Cow<'a, [u8]>,
}

impl FixedStringDictionary<'static> {
    /// Builds a dictionary with records of `record_len` bytes.
    ///
    /// `values` must be strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if a string is longer than
    /// `record_len`, contains a NUL byte or breaks the ascending order, and
    /// [`Error::DictionaryTooLarge`] for more than `u32::MAX - 1` entries.
    pub fn new<S: AsRef<str>>(values: &[S], record_len: usize) -> Result<Self> {
        check_dictionary_len(values.len())?;
        u32::try_from(record_len)
            .map_err(|_| Error::InvalidArgument(format!("record length {record_len}")))?;

        let mut chars = Vec::with_capacity(values.len() * record_len);
        for value in values {
            let bytes = value.as_ref().as_bytes();
            if bytes.len() > record_len {
                return Err(Error::InvalidArgument(format!(
                    "string of {} bytes exceeds record length {record_len}",
                    bytes.len()
                )));
            }
            if bytes.contains(&0) {
                return Err(Error::InvalidArgument(
                    "strings in a fixed-width dictionary cannot contain NUL".into(),
                ));
            }
            chars.extend_from_slice(bytes);
            chars.resize(chars.len() + record_len - bytes.len(), 0);
        }
        if !values
            .windows(2)
            .all(|pair| pair[0].as_ref() < pair[1].as_ref())
        {
            return Err(Error::InvalidArgument(
                "dictionary must be strictly ascending".into(),
            ));
        }

        Ok(Self {
            record_len,
            len: values.len(),
            chars: Cow::Owned(chars),
        })
    }

    /// Builds a dictionary whose record length is its longest string.
    ///
    /// # Errors
    ///
    /// Same as [`FixedStringDictionary::new`].
    pub fn with_minimal_record_len<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let record_len = values.iter().map(|v| v.as_ref().len()).max().unwrap_or(0);
        Self::new(values, record_len)
    }
}

impl<'a> FixedStringDictionary<'a> {
    /// Wraps `len` mapped records of `record_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] if a record is not valid UTF-8, has
    /// bytes after its padding, or records cannot be distinct.
    pub fn from_mapped(chars: &'a [u8], record_len: usize, len: usize) -> Result<Self> {
        if record_len == 0 && len > 1 {
            return Err(Error::Corrupted(format!(
                "{len} empty string records cannot be distinct"
            )));
        }
        let dictionary = Self::from_mapped_unchecked(chars, record_len, len);
        for index in 0..len {
            let record = dictionary.record(index);
            let text_len = Self::text_len(record);
            if record[text_len..].iter().any(|&b| b != 0) {
                return Err(Error::Corrupted(format!(
                    "string record {index} has data after its padding"
                )));
            }
            std::str::from_utf8(&record[..text_len]).map_err(|e| {
                Error::Corrupted(format!("string record {index} is not UTF-8: {e}"))
            })?;
        }
        Ok(dictionary)
    }

    /// Wraps records that already passed [`FixedStringDictionary::from_mapped`].
    ///
    /// `chars` must hold `len * record_len` bytes.
    pub(crate) fn from_mapped_unchecked(chars: &'a [u8], record_len: usize, len: usize) -> Self {
        Self {
            record_len,
            len,
            chars: Cow::Borrowed(chars),
        }
    }

    /// Bytes per record.
    #[must_use]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if the records live on the heap of this dictionary.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self.chars, Cow::Owned(_))
    }

    /// Size of the record area in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.chars.len()
    }

    /// Raw record area.
    #[must_use]
    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    /// Returns entry `index` without its padding.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        assert!(
            index < self.len,
            "string dictionary index {index} out of bounds (len {})",
            self.len
        );
        let record = self.record(index);
        // Records are validated when the dictionary is built.
        std::str::from_utf8(&record[..Self::text_len(record)]).unwrap_or_default()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Index of the first entry for which `pred` is false.
    pub fn partition_point(&self, mut pred: impl FnMut(&str) -> bool) -> usize {
        let (mut low, mut high) = (0, self.len);
        while low < high {
            let mid = low + (high - low) / 2;
            if pred(self.get(mid)) {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Copies the records into owned memory.
    #[must_use]
    pub fn into_owned(self) -> FixedStringDictionary<'static> {
        FixedStringDictionary {
            record_len: self.record_len,
            len: self.len,
            chars: Cow::Owned(self.chars.into_owned()),
        }
    }

    fn record(&self, index: usize) -> &[u8] {
        let start = index * self.record_len;
        &self.chars[start..start + self.record_len]
    }

    fn text_len(record: &[u8]) -> usize {
        record.iter().position(|&b| b == 0).unwrap_or(record.len())
    }
}

/// Fixed-width string column of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedStringSegment<'a> {
    dictionary: FixedStringDictionary<'a>,
    attribute_vector: CompressedVector<'a>,
}

impl FixedStringSegment<'static> {
    /// Dictionary-encodes `values`, `None` being NULL.
    ///
    /// The record length is the longest value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for strings containing NUL or if a
    /// value id does not fit `vector_type`.
    pub fn from_values<S: AsRef<str>>(
        values: &[Option<S>],
        vector_type: CompressedVectorType,
    ) -> Result<Self> {
        let mut distinct: Vec<&str> = values.iter().flatten().map(|v| v.as_ref()).collect();
        distinct.sort_unstable();
        distinct.dedup();

        let null_id = check_dictionary_len(distinct.len())?;
        #[allow(clippy::cast_possible_truncation)] // Bounded by null_id
        let ids: Vec<u32> = values
            .iter()
            .map(|value| match value {
                Some(v) => distinct.partition_point(|d| *d < v.as_ref()) as u32,
                None => null_id,
            })
            .collect();

        let dictionary = FixedStringDictionary::with_minimal_record_len(&distinct)?;
        Self::new(dictionary, CompressedVector::compress(&ids, vector_type)?)
    }
}

impl<'a> FixedStringSegment<'a> {
    /// Pairs a dictionary with an attribute vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the vector has more than
    /// `u32::MAX` rows.
    pub fn new(
        dictionary: FixedStringDictionary<'a>,
        attribute_vector: CompressedVector<'a>,
    ) -> Result<Self> {
        check_row_count(attribute_vector.len())?;
        Ok(Self {
            dictionary,
            attribute_vector,
        })
    }

    /// Parses a serialized segment without copying.
    ///
    /// # Errors
    ///
    /// Returns a format error for unknown tags, oversized dictionaries,
    /// malformed records, truncated input or trailing bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Self::parse(bytes, true)
    }

    /// Parses a segment whose records were checked by an earlier
    /// [`FixedStringSegment::from_bytes`] over the same bytes.
    pub(crate) fn from_validated_bytes(bytes: &'a [u8]) -> Result<Self> {
        Self::parse(bytes, false)
    }

    fn parse(bytes: &'a [u8], check_records: bool) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let encoding = PersistedEncoding::from_tag(reader.u32("segment header")?)?;
        let record_len = reader.u32("segment header")? as usize;
        let dictionary_len = reader.u32("segment header")? as usize;
        let vector_len = reader.u32("segment header")? as usize;

        let vector_type = encoding.vector_type()?;
        check_dictionary_len(dictionary_len)?;

        let chars_len = dictionary_len
            .checked_mul(record_len)
            .ok_or(Error::DictionaryTooLarge(dictionary_len))?;
        let chars = reader.take(chars_len, "string dictionary")?;
        let dictionary = if check_records {
            FixedStringDictionary::from_mapped(chars, record_len, dictionary_len)?
        } else {
            FixedStringDictionary::from_mapped_unchecked(chars, record_len, dictionary_len)
        };
        let attribute_vector = CompressedVector::import(vector_type, vector_len, &mut reader)?;

        if reader.remaining() != 0 {
            return Err(Error::Corrupted(format!(
                "{} trailing bytes after string segment",
                reader.remaining()
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
    pub fn dictionary(&self) -> &FixedStringDictionary<'a> {
        &self.dictionary
    }

    /// Returns the attribute vector.
    #[must_use]
    pub fn attribute_vector(&self) -> &CompressedVector<'a> {
        &self.attribute_vector
    }

    /// Value id stored for `row`.
    #[must_use]
    pub fn value_id(&self, row: usize) -> ValueId {
        self.attribute_vector.get(row)
    }

    /// Decodes `row`; `None` means NULL.
    ///
    /// # Panics
    ///
    /// Panics if `row >= size()` or the stored id lies past the NULL id.
    #[must_use]
    pub fn get_typed_value(&self, row: usize) -> Option<&str> {
        let id = self.attribute_vector.get(row);
        if id == self.null_value_id() {
            None
        } else {
            Some(self.dictionary.get(id.index()))
        }
    }

    /// Iterates over the decoded rows.
    pub fn values(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.size()).map(move |row| self.get_typed_value(row))
    }

    /// First id whose entry is `>= value`, or [`INVALID_VALUE_ID`].
    #[must_use]
    pub fn lower_bound(&self, value: &str) -> ValueId {
        self.bound(self.dictionary.partition_point(|entry| entry < value))
    }

    /// First id whose entry is `> value`, or [`INVALID_VALUE_ID`].
    #[must_use]
    pub fn upper_bound(&self, value: &str) -> ValueId {
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
    pub fn value_of_value_id(&self, id: ValueId) -> Result<&str> {
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

    /// Exact number of bytes [`FixedStringSegment::serialize`] writes.
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        FIXED_STRING_SEGMENT_HEADER_BYTES
            + self.dictionary.byte_len()
            + self.attribute_vector.byte_len()
    }

    /// Writes header, records and attribute vector.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    #[allow(clippy::cast_possible_truncation)] // Lengths checked at construction
    pub fn serialize<W: Write>(&self, sink: &mut W) -> Result<()> {
        let encoding = PersistedEncoding::from(self.compressed_vector_type());
        sink.write_all(&encoding.tag().to_le_bytes())?;
        sink.write_all(&(self.dictionary.record_len() as u32).to_le_bytes())?;
        sink.write_all(&(self.dictionary.len() as u32).to_le_bytes())?;
        sink.write_all(&(self.attribute_vector.len() as u32).to_le_bytes())?;
        sink.write_all(self.dictionary.chars())?;
        self.attribute_vector.export(sink)?;
        Ok(())
    }

    /// Copies records and attribute vector into owned memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BorrowedSegment`] if the dictionary is not owned.
    pub fn deep_copy(&self) -> Result<FixedStringSegment<'static>> {
        if !self.dictionary.is_owned() {
            return Err(Error::BorrowedSegment);
        }
        Ok(FixedStringSegment {
            dictionary: self.dictionary.clone().into_owned(),
            attribute_vector: self.attribute_vector.clone().into_owned(),
        })
    }

    /// Bytes held by this segment, borrowed data included.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        size_of::<Self>() + self.dictionary.byte_len() + self.attribute_vector.byte_len()
    }
}
