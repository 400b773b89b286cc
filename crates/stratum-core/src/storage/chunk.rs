//! Chunks: equally long segments, one per column.

use std::io::Write;

use super::format::{chunk_header_bytes, ChunkHeader};
use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::types::{DataType, Value};

/// Horizontal slice of a table holding one segment per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<'a> {
    segments: Vec<Segment<'a>>,
    size: usize,
}

impl<'a> Chunk<'a> {
    /// Groups `segments` into a chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the segments differ in row count
    /// and [`Error::InvalidArgument`] if there are none.
    pub fn new(segments: Vec<Segment<'a>>) -> Result<Self> {
        let Some(first) = segments.first() else {
            return Err(Error::InvalidArgument("chunk without segments".into()));
        };
        let size = first.size();
        if let Some((column, segment)) = segments.iter().enumerate().find(|(_, s)| s.size() != size)
        {
            return Err(Error::SchemaMismatch(format!(
                "column {column} has {} rows, column 0 has {size}",
                segment.size()
            )));
        }
        if u32::try_from(size).is_err() {
            return Err(Error::InvalidArgument(format!("chunk of {size} rows")));
        }
        Ok(Self { segments, size })
    }

    /// Parses a serialized chunk whose columns have `data_types`.
    ///
    /// Segments borrow from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the chunk header or a segment is malformed,
    /// or if a segment disagrees with the chunk's row count.
    pub fn from_bytes(bytes: &'a [u8], data_types: &[DataType]) -> Result<Self> {
        Self::parse(bytes, data_types, Segment::from_bytes)
    }

    /// Re-parses bytes that already passed [`Chunk::from_bytes`].
    pub(crate) fn from_validated_bytes(bytes: &'a [u8], data_types: &[DataType]) -> Result<Self> {
        Self::parse(bytes, data_types, Segment::from_validated_bytes)
    }

    fn parse(
        bytes: &'a [u8],
        data_types: &[DataType],
        parse_segment: fn(DataType, &'a [u8]) -> Result<Segment<'a>>,
    ) -> Result<Self> {
        let header = ChunkHeader::decode(bytes, data_types.len())?;
        let data = &bytes[header.byte_len()..];
        if header.data_len() != data.len() {
            return Err(Error::Corrupted(format!(
                "chunk header covers {} bytes of segment data, {} present",
                header.data_len(),
                data.len()
            )));
        }

        let mut segments = Vec::with_capacity(data_types.len());
        for (column, &data_type) in data_types.iter().enumerate() {
            let range = header
                .segment_range(column)
                .ok_or_else(|| Error::Corrupted(format!("missing offset for column {column}")))?;
            let segment = parse_segment(data_type, &data[range])?;
            if segment.size() != header.row_count as usize {
                return Err(Error::Corrupted(format!(
                    "column {column} has {} rows, chunk header says {}",
                    segment.size(),
                    header.row_count
                )));
            }
            segments.push(segment);
        }

        Ok(Self {
            segments,
            size: header.row_count as usize,
        })
    }

    /// Checks every segment's value ids against its dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corrupted`] for the first out-of-range id.
    pub fn validate(&self) -> Result<()> {
        self.segments.iter().try_for_each(Segment::validate)
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Segment of `column`, if it exists.
    #[must_use]
    pub fn get_segment(&self, column: usize) -> Option<&Segment<'a>> {
        self.segments.get(column)
    }

    /// All segments in column order.
    #[must_use]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Column types in column order.
    #[must_use]
    pub fn data_types(&self) -> Vec<DataType> {
        self.segments.iter().map(Segment::data_type).collect()
    }

    /// Decodes one row across all columns.
    ///
    /// # Panics
    ///
    /// Panics if `row >= size()`.
    #[must_use]
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.segments.iter().map(|s| s.value(row)).collect()
    }

    /// Offset ends of the segments relative to the end of the chunk header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the chunk exceeds 32-bit offsets.
    pub fn segment_offset_ends(&self) -> Result<Vec<u32>> {
        let mut end = 0u32;
        self.segments
            .iter()
            .map(|segment| {
                end = u32::try_from(segment.serialized_len())
                    .ok()
                    .and_then(|len| end.checked_add(len))
                    .ok_or_else(|| {
                        Error::InvalidArgument("chunk exceeds 32-bit segment offsets".into())
                    })?;
                Ok(end)
            })
            .collect()
    }

    /// Header describing this chunk.
    ///
    /// # Errors
    ///
    /// Same as [`Chunk::segment_offset_ends`].
    #[allow(clippy::cast_possible_truncation)] // Row count checked in `new`
    pub fn header(&self) -> Result<ChunkHeader> {
        Ok(ChunkHeader {
            row_count: self.size as u32,
            segment_offset_ends: self.segment_offset_ends()?,
        })
    }

    /// Exact number of bytes [`Chunk::serialize`] writes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        chunk_header_bytes(self.segments.len())
            + self
                .segments
                .iter()
                .map(Segment::serialized_len)
                .sum::<usize>()
    }

    /// Writes chunk header and segments.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    pub fn serialize<W: Write>(&self, sink: &mut W) -> Result<()> {
        let mut header = Vec::with_capacity(chunk_header_bytes(self.segments.len()));
        self.header()?.encode_into(&mut header);
        sink.write_all(&header)?;
        for segment in &self.segments {
            segment.serialize(sink)?;
        }
        Ok(())
    }

    /// Serialized bytes of this chunk.
    ///
    /// # Errors
    ///
    /// Same as [`Chunk::serialize`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.byte_len());
        self.serialize(&mut out)?;
        Ok(out)
    }
}
