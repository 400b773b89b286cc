//! Chunk builders shared by the storage tests.

use std::collections::BTreeSet;

use super::Chunk;
use crate::compression::CompressedVectorType;
use crate::schema::{ColumnDefinition, ColumnDefinitions};
use crate::segment::{DictionarySegment, FixedStringSegment, Segment};
use crate::types::DataType;

/// Int segment using the narrowest fixed width that holds the NULL id.
pub(super) fn int_segment(values: &[Option<i32>]) -> Segment<'static> {
    let distinct: BTreeSet<i32> = values.iter().flatten().copied().collect();
    let vector_type = CompressedVectorType::narrowest_fixed_width(distinct.len() as u32);
    DictionarySegment::from_values(values, vector_type)
        .unwrap()
        .into()
}

pub(super) fn string_segment(values: &[Option<&str>]) -> Segment<'static> {
    FixedStringSegment::from_values(values, CompressedVectorType::FixedWidthInteger1Byte)
        .unwrap()
        .into()
}

/// Non-null int chunk, one inner vector per column.
pub(super) fn int_chunk(columns: &[Vec<i32>]) -> Chunk<'static> {
    let segments = columns
        .iter()
        .map(|column| int_segment(&column.iter().copied().map(Some).collect::<Vec<_>>()))
        .collect();
    Chunk::new(segments).unwrap()
}

/// Column `i` repeats every value `i + 1` times.
pub(super) fn repeated_values_chunk(rows: usize, columns: usize) -> Chunk<'static> {
    let columns: Vec<Vec<i32>> = (0..columns)
        .map(|column| (0..rows).map(|row| (row / (column + 1)) as i32).collect())
        .collect();
    int_chunk(&columns)
}

/// Single-column chunk holding `seed..seed + rows`.
pub(super) fn sequence_chunk(seed: i32, rows: i32) -> Chunk<'static> {
    int_chunk(&[(seed..seed + rows).collect()])
}

pub(super) fn int_columns(count: usize) -> ColumnDefinitions {
    (0..count)
        .map(|i| ColumnDefinition::new(format!("c{i}"), DataType::Int, false))
        .collect()
}
