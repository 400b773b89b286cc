//! Typed dictionaries over owned, borrowed or mapped storage.

use std::fmt;
use std::io::{self, Write};
use std::mem::size_of;

use crate::types::{DataType, Value};

/// Fixed-width numeric type that can be stored in a dictionary.
///
/// Implemented for `i32`, `i64`, `f32` and `f64`.
pub trait DictionaryValue: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Logical type of the column.
    const DATA_TYPE: DataType;

    /// Decodes one little-endian value from exactly `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Writes the little-endian encoding to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    fn write_le<W: Write>(self, sink: &mut W) -> io::Result<()>;

    /// Wraps the value into a [`Value`].
    fn into_value(self) -> Value;

    /// Extracts a value of this type, if `value` has it.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_dictionary_value {
    ($ty:ty, $variant:ident) => {
        impl DictionaryValue for $ty {
            const WIDTH: usize = size_of::<$ty>();
            const DATA_TYPE: DataType = DataType::$variant;

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_le_bytes(raw)
            }

            fn write_le<W: Write>(self, sink: &mut W) -> io::Result<()> {
                sink.write_all(&self.to_le_bytes())
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_dictionary_value!(i32, Int);
impl_dictionary_value!(i64, Long);
impl_dictionary_value!(f32, Float);
impl_dictionary_value!(f64, Double);

/// Ascending, duplicate-free values of one column.
///
/// `Mapped` reads values straight out of a byte region that has no
/// alignment guarantee.
#[derive(Debug, Clone, PartialEq)]
pub enum Dictionary<'a, T: DictionaryValue> {
    /// Heap-allocated values.
    Owned(Vec<T>),
    /// Borrowed typed slice.
    Borrowed(&'a [T]),
    /// Borrowed little-endian bytes, `WIDTH` bytes per value.
    Mapped(&'a [u8]),
}

impl<'a, T: DictionaryValue> Dictionary<'a, T> {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Owned(values) => values.len(),
            Self::Borrowed(values) => values.len(),
            Self::Mapped(bytes) => bytes.len() / T::WIDTH,
        }
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the values live on the heap of this dictionary.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Returns the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> T {
        match self {
            Self::Owned(values) => values[index],
            Self::Borrowed(values) => values[index],
            Self::Mapped(bytes) => {
                let start = index * T::WIDTH;
                T::read_le(&bytes[start..start + T::WIDTH])
            }
        }
    }

    /// Index of the first entry for which `pred` is false.
    ///
    /// The dictionary must be partitioned by `pred` (true entries first).
    pub fn partition_point(&self, mut pred: impl FnMut(T) -> bool) -> usize {
        match self {
            Self::Owned(values) => values.partition_point(|&v| pred(v)),
            Self::Borrowed(values) => values.partition_point(|&v| pred(v)),
            Self::Mapped(_) => {
                let (mut low, mut high) = (0, self.len());
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
        }
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Copies the entries into a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::Owned(values) => values.clone(),
            Self::Borrowed(values) => values.to_vec(),
            Self::Mapped(_) => self.iter().collect(),
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len() * T::WIDTH
    }

    /// Writes the entries as little-endian values.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the sink fails.
    pub fn export<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        match self {
            Self::Mapped(bytes) => sink.write_all(bytes),
            _ => self.iter().try_for_each(|v| v.write_le(sink)),
        }
    }
}
