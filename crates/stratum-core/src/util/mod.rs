//! Utility module for common helper functions.
//!
//! This module provides:
//! - Little-endian byte cursors used by every on-disk parser

pub mod bytes;

pub use bytes::{put_u32, ByteReader};
