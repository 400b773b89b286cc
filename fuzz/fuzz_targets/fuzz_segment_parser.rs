//! Fuzz target for segment and header decoding.
//!
//! Every length, tag and offset in these structures comes from the file.
//! Decoding arbitrary bytes must return an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stratum_core::storage::{ChunkHeader, FileHeader};
use stratum_core::{DataType, Segment};

const DATA_TYPES: [DataType; 5] = [
    DataType::Int,
    DataType::Long,
    DataType::Float,
    DataType::Double,
    DataType::String,
];

fuzz_target!(|data: &[u8]| {
    let _ = FileHeader::decode(data);

    if let Some((&columns, rest)) = data.split_first() {
        let _ = ChunkHeader::decode(rest, usize::from(columns % 64));
    }

    for data_type in DATA_TYPES {
        if let Ok(segment) = Segment::from_bytes(data_type, data) {
            if segment.validate().is_ok() {
                for row in 0..segment.size().min(64) {
                    let _ = segment.value(row);
                }
            }
        }
    }
});
