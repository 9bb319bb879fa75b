//! Row key type for Strata.
//!
//! Keys are the unsigned-lexicographically ordered byte strings the backing
//! store sorts by.

use bytes::Bytes;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// A row key in the backing store.
///
/// Cloning is cheap: the bytes are reference counted.
///
/// # Example
///
/// ```rust
/// use strata_common::types::Key;
///
/// let key = Key::from_bytes(b"user:1234");
/// assert_eq!(key.len(), 9);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Key(Bytes);

impl Key {
    /// Creates an empty key.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Creates a key from a byte slice.
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }

    /// Creates a key from owned bytes.
    #[inline]
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(Bytes::from(vec))
    }

    /// Returns the length of the key in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the key as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Checks if this key starts with the given prefix.
    #[inline]
    #[must_use]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Returns the smallest key greater than every key with this prefix.
    ///
    /// Returns an empty key (unbounded) when every byte is `0xFF`.
    #[must_use]
    pub fn prefix_successor(&self) -> Self {
        let mut bytes = self.0.to_vec();

        // Find the rightmost byte that is not 0xFF
        while let Some(last) = bytes.pop() {
            if last < 0xFF {
                bytes.push(last + 1);
                return Self::from_vec(bytes);
            }
        }

        Self::empty()
    }
}

impl Deref for Key {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Key {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Ord for Key {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Row keys are mostly printable names split by 0x00
        write!(f, "Key(")?;
        for &byte in &self.0[..self.0.len().min(64)] {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        if self.0.len() > 64 {
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

impl From<&[u8]> for Key {
    #[inline]
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Key {
    #[inline]
    fn from(vec: Vec<u8>) -> Self {
        Self::from_vec(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_creation() {
        let key = Key::from_bytes(b"hello");
        assert_eq!(key.len(), 5);
        assert_eq!(key.as_bytes(), b"hello");
        assert!(Key::empty().is_empty());
    }

    #[test]
    fn test_key_ordering() {
        let a = Key::from_bytes(b"a");
        let ab = Key::from_bytes(b"ab");
        let b = Key::from_bytes(b"b");
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn test_prefix_successor() {
        assert_eq!(Key::from_bytes(b"ab").prefix_successor().as_bytes(), b"ac");
        assert_eq!(
            Key::from_bytes(&[0x01, 0xFF]).prefix_successor().as_bytes(),
            &[0x02]
        );
        assert!(Key::from_bytes(&[0xFF, 0xFF]).prefix_successor().is_empty());
    }

    #[test]
    fn test_debug_escapes_separators() {
        let key = Key::from_bytes(b"\0APP\0T");
        assert_eq!(format!("{key:?}"), "Key(\\x00APP\\x00T)");
    }
}
