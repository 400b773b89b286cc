//! Attribute vector compression.
//!
//! An attribute vector stores one [`ValueId`](crate::types::ValueId) per row.
//! Four physical layouts exist:
//! - Fixed-width little-endian integers of 1, 2 or 4 bytes
//! - Bit packing with a per-vector bit width between 1 and 32
//!
//! The layout is picked by the encoder from the dictionary cardinality; this
//! module only stores, reads, exports and imports each layout.

mod bitpacking;
mod vector;

pub use bitpacking::BitPackedVector;
pub use vector::{CompressedVector, CompressedVectorType};
