//! Bit-packed attribute vectors.
//!
//! # Layout
//!
//! ```text
//! [bit width: u32 LE]
//! [payload: ceil(len * bits / 64) little-endian u64 words]
//! ```
//!
//! Value `i` occupies bits `[i * bits, (i + 1) * bits)` of the word stream,
//! least significant bit first. A value straddles at most two words.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::util::ByteReader;

const WORD_BYTES: usize = 8;
const WORD_BITS: usize = 64;

/// Bit-packed sequence of value ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPackedVector<'a> {
    bits: u32,
    len: usize,
    payload: Cow<'a, [u8]>,
}

impl BitPackedVector<'static> {
    /// Packs `values` using `bits` bits per value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `bits` is outside `1..=32` or a
    /// value does not fit into `bits` bits.
    pub fn pack(values: &[u32], bits: u32) -> Result<Self> {
        if !(1..=32).contains(&bits) {
            return Err(Error::InvalidArgument(format!(
                "bit width {bits} outside 1..=32"
            )));
        }
        let mask = Self::mask(bits);
        let width = bits as usize;
        let mut words = vec![0u64; Self::word_count(values.len(), bits)];

        for (i, &value) in values.iter().enumerate() {
            let value = u64::from(value);
            if value & !mask != 0 {
                return Err(Error::InvalidArgument(format!(
                    "value {value} does not fit into {bits} bits"
                )));
            }
            let bit = i * width;
            let (word, shift) = (bit / WORD_BITS, bit % WORD_BITS);
            words[word] |= value << shift;
            if shift + width > WORD_BITS {
                words[word + 1] |= value >> (WORD_BITS - shift);
            }
        }

        let payload = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Ok(Self {
            bits,
            len: values.len(),
            payload: Cow::Owned(payload),
        })
    }

    /// Packs `values` with the smallest width that holds the largest value.
    ///
    /// # Errors
    ///
    /// Never fails in practice; see [`BitPackedVector::pack`].
    pub fn pack_minimal(values: &[u32]) -> Result<Self> {
        let max = values.iter().copied().max().unwrap_or(0);
        let bits = (u32::BITS - max.leading_zeros()).max(1);
        Self::pack(values, bits)
    }
}

impl<'a> BitPackedVector<'a> {
    /// Parses a bit-packed vector of `len` values, borrowing the payload.
    ///
    /// # Errors
    ///
    /// Returns a format error if the bit width is invalid or the payload is
    /// shorter than `len` values require.
    pub fn import(len: usize, reader: &mut ByteReader<'a>) -> Result<Self> {
        let bits = reader.u32("bit-packed width")?;
        if !(1..=32).contains(&bits) {
            return Err(Error::Corrupted(format!(
                "bit-packed width {bits} outside 1..=32"
            )));
        }
        let payload_len = Self::payload_len(len, bits);
        let payload = reader.take(payload_len, "bit-packed payload")?;
        Ok(Self {
            bits,
            len,
            payload: Cow::Borrowed(payload),
        })
    }

    /// Bits per value.
    #[must_use]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Payload size in bytes (excluding the width word).
    #[must_use]
    pub fn payload_bytes(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the payload borrows external memory.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.payload, Cow::Borrowed(_))
    }

    /// Returns the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Masked to at most 32 bits
    pub fn get(&self, index: usize) -> u32 {
        assert!(
            index < self.len,
            "bit-packed index {index} out of bounds (len {})",
            self.len
        );
        let width = self.bits as usize;
        let bit = index * width;
        let (word, shift) = (bit / WORD_BITS, bit % WORD_BITS);

        let mut value = self.word(word) >> shift;
        if shift + width > WORD_BITS {
            value |= self.word(word + 1) << (WORD_BITS - shift);
        }
        (value & Self::mask(self.bits)) as u32
    }

    /// Writes the width word followed by the payload.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    pub fn export<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.bits.to_le_bytes())?;
        sink.write_all(&self.payload)
    }

    /// Copies a borrowed payload into an owned one.
    #[must_use]
    pub fn into_owned(self) -> BitPackedVector<'static> {
        BitPackedVector {
            bits: self.bits,
            len: self.len,
            payload: Cow::Owned(self.payload.into_owned()),
        }
    }

    /// Serialized payload size for `len` values of `bits` bits.
    #[must_use]
    pub fn payload_len(len: usize, bits: u32) -> usize {
        Self::word_count(len, bits) * WORD_BYTES
    }

    fn word_count(len: usize, bits: u32) -> usize {
        (len * bits as usize).div_ceil(WORD_BITS)
    }

    fn mask(bits: u32) -> u64 {
        (1u64 << bits) - 1
    }

    #[inline]
    fn word(&self, index: usize) -> u64 {
        let start = index * WORD_BYTES;
        let mut bytes = [0u8; WORD_BYTES];
        bytes.copy_from_slice(&self.payload[start..start + WORD_BYTES]);
        u64::from_le_bytes(bytes)
    }
}
