//! Column encoder and data generators shared by the integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratum_core::{
    Chunk, ColumnDefinition, CompressedVectorType, DataType, DictionarySegment,
    FixedStringSegment, Segment, Value,
};

/// Layout an encoder would pick for a dictionary of `dictionary_len` entries
/// plus the NULL id.
#[must_use]
pub fn vector_type_for(dictionary_len: usize, bit_packing: bool) -> CompressedVectorType {
    if bit_packing {
        CompressedVectorType::BitPacking
    } else {
        CompressedVectorType::narrowest_fixed_width(dictionary_len as u32)
    }
}

fn distinct_count<T: PartialOrd + Copy>(values: &[Option<T>]) -> usize {
    let mut present: Vec<T> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.partial_cmp(b).unwrap());
    present.dedup();
    present.len()
}

/// Encodes `values` of one column into a segment of the matching type.
pub fn encode_column(data_type: DataType, values: &[Value], bit_packing: bool) -> Segment<'static> {
    macro_rules! numeric {
        ($variant:ident) => {{
            let typed: Vec<_> = values
                .iter()
                .map(|v| match v {
                    Value::$variant(x) => Some(*x),
                    Value::Null => None,
                    other => panic!("unexpected {other:?}"),
                })
                .collect();
            let vector_type = vector_type_for(distinct_count(&typed), bit_packing);
            DictionarySegment::from_values(&typed, vector_type)
                .unwrap()
                .into()
        }};
    }

    match data_type {
        DataType::Int => numeric!(Int),
        DataType::Long => numeric!(Long),
        DataType::Float => numeric!(Float),
        DataType::Double => numeric!(Double),
        DataType::String => {
            let typed: Vec<Option<&str>> = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => Some(s.as_str()),
                    Value::Null => None,
                    other => panic!("unexpected {other:?}"),
                })
                .collect();
            let mut distinct: Vec<&str> = typed.iter().flatten().copied().collect();
            distinct.sort_unstable();
            distinct.dedup();
            let vector_type = vector_type_for(distinct.len(), bit_packing);
            FixedStringSegment::from_values(&typed, vector_type)
                .unwrap()
                .into()
        }
    }
}

/// One column of every type, all nullable.
#[must_use]
pub fn mixed_schema() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("i", DataType::Int, true),
        ColumnDefinition::new("l", DataType::Long, true),
        ColumnDefinition::new("f", DataType::Float, true),
        ColumnDefinition::new("d", DataType::Double, true),
        ColumnDefinition::new("s", DataType::String, true),
    ]
}

/// Deterministic rows for [`mixed_schema`], roughly one value in eight NULL.
#[must_use]
pub fn mixed_rows(seed: u64, rows: usize, cardinality: u32) -> Vec<Vec<Value>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|_| {
            let mut row = Vec::with_capacity(5);
            for column in 0..5 {
                if rng.gen_ratio(1, 8) {
                    row.push(Value::Null);
                    continue;
                }
                let k = rng.gen_range(0..cardinality);
                row.push(match column {
                    0 => Value::Int(k as i32 - 50),
                    1 => Value::Long(i64::from(k) * 1_000_000_007),
                    2 => Value::Float(k as f32 * 0.5),
                    3 => Value::Double(f64::from(k) / 3.0),
                    _ => Value::String(format!("v{k}")),
                });
            }
            row
        })
        .collect()
}

/// Encodes row-major `rows` of `schema` into a chunk.
pub fn encode_chunk(
    schema: &[ColumnDefinition],
    rows: &[Vec<Value>],
    bit_packing: bool,
) -> Chunk<'static> {
    let segments = schema
        .iter()
        .enumerate()
        .map(|(column, definition)| {
            let values: Vec<Value> = rows.iter().map(|row| row[column].clone()).collect();
            encode_column(definition.data_type, &values, bit_packing)
        })
        .collect();
    Chunk::new(segments).unwrap()
}

/// Decodes every row of `chunk`.
pub fn decode_rows(chunk: &Chunk<'_>) -> Vec<Vec<Value>> {
    (0..chunk.size()).map(|row| chunk.row(row)).collect()
}

/// Sum of the non-null `int` values in `column`.
pub fn int_sum(chunk: &Chunk<'_>, column: usize) -> i64 {
    let segment = chunk.get_segment(column).unwrap();
    (0..segment.size())
        .filter_map(|row| match segment.value(row) {
            Value::Int(v) => Some(i64::from(v)),
            _ => None,
        })
        .sum()
}
