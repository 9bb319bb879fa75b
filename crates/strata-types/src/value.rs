//! Encoded value references.
//!
//! An `EncodedValue` is a byte span of a backing buffer. The buffer is owned
//! by whoever produced it (usually a row read from the store) and is
//! reference counted, so many values can slice one row without copying
//! and no value can outlive the buffer it points into.

use bytes::Bytes;
use std::fmt;
use std::ops::Deref;

use strata_common::constants::{FALSE_BYTES, TRUE_BYTES};

/// The canonical order-preserving bytes of one logical value.
///
/// Equality, hashing and ordering are defined over the byte contents,
/// never over the identity of the backing buffer. The empty span encodes
/// logical NULL.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodedValue(Bytes);

impl EncodedValue {
    /// The NULL value (empty span).
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self(Bytes::new())
    }

    /// Encoded boolean `true`.
    #[inline]
    #[must_use]
    pub const fn true_value() -> Self {
        Self(Bytes::from_static(TRUE_BYTES))
    }

    /// Encoded boolean `false`.
    #[inline]
    #[must_use]
    pub const fn false_value() -> Self {
        Self(Bytes::from_static(FALSE_BYTES))
    }

    /// Encoded boolean for `value`.
    #[inline]
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        if value {
            Self::true_value()
        } else {
            Self::false_value()
        }
    }

    /// References `len` bytes of `buf` starting at `offset` without copying.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds of `buf`.
    #[inline]
    #[must_use]
    pub fn slice_of(buf: &Bytes, offset: usize, len: usize) -> Self {
        Self(buf.slice(offset..offset + len))
    }

    /// Creates a value owning a copy of `bytes`.
    #[inline]
    #[must_use]
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    /// Creates a value from owned bytes.
    #[inline]
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(Bytes::from(vec))
    }

    /// Wraps an existing buffer.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: Bytes) -> Self {
        Self(bytes)
    }

    /// Returns true if this is the NULL value.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the span length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the span is empty (NULL).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the bytes of the span.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the shared buffer handle of the span.
    #[inline]
    #[must_use]
    pub fn as_raw(&self) -> &Bytes {
        &self.0
    }

    /// Consumes the value, returning the buffer handle.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Interprets the value as an encoded boolean.
    ///
    /// Returns `None` for NULL.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.0.first().map(|b| *b != 0)
    }
}

impl Deref for EncodedValue {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedValue {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for EncodedValue {
    #[inline]
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for EncodedValue {
    #[inline]
    fn from(vec: Vec<u8>) -> Self {
        Self::from_vec(vec)
    }
}

impl fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "EncodedValue(NULL)");
        }
        write!(f, "EncodedValue(0x")?;
        for byte in &self.0[..self.0.len().min(32)] {
            write!(f, "{byte:02x}")?;
        }
        if self.0.len() > 32 {
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}
