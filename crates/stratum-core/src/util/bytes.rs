//! Little-endian helpers for the on-disk layout.
//!
//! Mapped regions carry no alignment guarantee (a 1-byte attribute vector can
//! be followed by a 4-byte dictionary), so all reads go through
//! `from_le_bytes` on byte slices instead of pointer casts.

use crate::error::{Error, Result};

/// Appends `value` as four little-endian bytes.
#[inline]
pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Reads the little-endian `u32` at byte `offset`.
///
/// # Panics
///
/// Panics if fewer than four bytes remain at `offset`.
#[inline]
#[must_use]
pub fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Forward-only cursor over borrowed bytes.
///
/// Every slice handed out borrows from the input, never from the cursor.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a cursor at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Consumes `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Truncated {
                context,
                needed: len,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += len;
        Ok(&self.bytes[start..self.position])
    }

    /// Consumes one little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if fewer than four bytes remain.
    pub fn u32(&mut self, context: &'static str) -> Result<u32> {
        let word = self.take(4, context)?;
        Ok(u32_at(word, 0))
    }

    /// Consumes `count` little-endian `u32` words.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if the words do not fit.
    pub fn u32_array(&mut self, count: usize, context: &'static str) -> Result<Vec<u32>> {
        let len = count.checked_mul(4).ok_or(Error::Truncated {
            context,
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        let words = self.take(len, context)?;
        Ok(words.chunks_exact(4).map(|w| u32_at(w, 0)).collect())
    }

    /// Consumes everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = self.position;
        self.position = self.bytes.len();
        &self.bytes[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reads_words_in_order() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 7);
        put_u32(&mut bytes, 0xDEAD_BEEF);
        bytes.push(1);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.u32("a").unwrap(), 7);
        assert_eq!(reader.u32("b").unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.rest(), &[1]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_reports_truncation() {
        let bytes = [1u8, 2, 3];
        let mut reader = ByteReader::new(&bytes);

        let err = reader.u32("header").unwrap_err();

        assert!(matches!(
            err,
            Error::Truncated {
                context: "header",
                needed: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_u32_array_on_unaligned_input() {
        let mut bytes = vec![0xFFu8];
        put_u32(&mut bytes, 1);
        put_u32(&mut bytes, 2);

        let mut reader = ByteReader::new(&bytes[1..]);
        assert_eq!(reader.u32_array(2, "words").unwrap(), vec![1, 2]);
    }
}
