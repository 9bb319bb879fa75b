//! Row access during evaluation.

use bytes::{BufMut, Bytes, BytesMut};

use strata_types::EncodedValue;

/// Supplies column values to [`Expression::evaluate`](crate::Expression::evaluate).
pub trait RowSource {
    /// Returns the encoded value at `position`.
    ///
    /// `None` means the value is not available in this row (for example a
    /// column outside a projected subset); the empty span means NULL.
    fn value(&self, position: usize) -> Option<EncodedValue>;
}

/// A row with no columns. Used to evaluate row-independent expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRow;

impl RowSource for NullRow {
    fn value(&self, _position: usize) -> Option<EncodedValue> {
        None
    }
}

/// A row whose values are spans of one shared buffer.
#[derive(Debug, Clone, Default)]
pub struct EncodedRow {
    buffer: Bytes,
    spans: Vec<(usize, usize)>,
}

impl EncodedRow {
    /// Creates a row over `buffer`; each span is `(offset, len)`.
    ///
    /// Spans outside the buffer read as unavailable.
    pub fn new(buffer: Bytes, spans: Vec<(usize, usize)>) -> Self {
        Self { buffer, spans }
    }

    /// Packs `values` into one buffer.
    pub fn from_values(values: &[&[u8]]) -> Self {
        let total = values.iter().map(|v| v.len()).sum();
        let mut buffer = BytesMut::with_capacity(total);
        let mut spans = Vec::with_capacity(values.len());
        for value in values {
            spans.push((buffer.len(), value.len()));
            buffer.put_slice(value);
        }
        Self {
            buffer: buffer.freeze(),
            spans,
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl RowSource for EncodedRow {
    fn value(&self, position: usize) -> Option<EncodedValue> {
        let &(offset, len) = self.spans.get(position)?;
        if offset.checked_add(len)? > self.buffer.len() {
            return None;
        }
        Some(EncodedValue::slice_of(&self.buffer, offset, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_share_buffer() {
        let row = EncodedRow::from_values(&[b"ab", b"", b"cde"]);
        assert_eq!(row.len(), 3);
        assert_eq!(row.value(0).unwrap().as_bytes(), b"ab");
        assert!(row.value(1).unwrap().is_null());
        assert_eq!(row.value(2).unwrap().as_bytes(), b"cde");
        assert!(row.value(3).is_none());
    }

    #[test]
    fn test_out_of_bounds_span_unavailable() {
        let row = EncodedRow::new(Bytes::from_static(b"abc"), vec![(2, 5)]);
        assert!(row.value(0).is_none());
        assert!(NullRow.value(0).is_none());
    }
}
