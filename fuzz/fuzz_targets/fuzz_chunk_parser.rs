//! Fuzz target for whole-chunk decoding.
//!
//! The first byte picks the column types, the rest is the chunk image.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stratum_core::{Chunk, DataType};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, bytes)) = data.split_first() else {
        return;
    };
    let data_types: Vec<DataType> = (0..usize::from(selector % 4) + 1)
        .map(|i| match (selector >> (2 + i)) & 1 {
            0 => DataType::Int,
            _ => DataType::String,
        })
        .collect();

    if let Ok(chunk) = Chunk::from_bytes(bytes, &data_types) {
        if chunk.validate().is_ok() && chunk.size() > 0 {
            let _ = chunk.row(0);
        }
    }
});
