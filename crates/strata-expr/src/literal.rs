//! Constant node.

use std::fmt;

use strata_common::StrataResult;
use strata_types::{codec, coerce_bytes, Datum, EncodedValue, LogicalType, SortOrder};

/// A constant encoded value of a fixed type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralExpression {
    value: EncodedValue,
    data_type: LogicalType,
    sort_order: SortOrder,
}

impl LiteralExpression {
    /// Creates a literal from already encoded bytes.
    pub fn new(value: EncodedValue, data_type: LogicalType, sort_order: SortOrder) -> Self {
        Self {
            value,
            data_type,
            sort_order,
        }
    }

    /// Encodes `datum` as a literal of its natural type.
    pub fn from_datum(datum: &Datum) -> StrataResult<Self> {
        Self::from_datum_as(datum, datum.data_type())
    }

    /// Encodes `datum` as a literal of type `ty`.
    pub fn from_datum_as(datum: &Datum, ty: LogicalType) -> StrataResult<Self> {
        Ok(Self::new(codec::encode(ty, datum)?, ty, SortOrder::Asc))
    }

    /// NULL of type `ty`.
    pub fn null(ty: LogicalType) -> Self {
        Self::new(EncodedValue::null(), ty, SortOrder::Asc)
    }

    /// Boolean constant.
    pub fn boolean(value: bool) -> Self {
        Self::new(EncodedValue::boolean(value), LogicalType::Boolean, SortOrder::Asc)
    }

    /// Returns the encoded value.
    pub fn value(&self) -> &EncodedValue {
        &self.value
    }

    /// Returns the type of the value.
    pub fn data_type(&self) -> LogicalType {
        self.data_type
    }

    /// Returns the storage order of the value bytes.
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Returns true if the literal is NULL.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Re-encodes the literal as `ty` in `order`, or fails if the value does
    /// not convert.
    pub fn coerce_to(&self, ty: LogicalType, order: SortOrder) -> StrataResult<Self> {
        let value = coerce_bytes(&self.value, self.data_type, self.sort_order, ty, order)?;
        Ok(Self::new(value, ty, order))
    }

    /// Like [`coerce_to`](Self::coerce_to), but only when converting back
    /// reproduces the original bytes.
    pub fn coerce_exact(&self, ty: LogicalType, order: SortOrder) -> Option<Self> {
        let converted = self.coerce_to(ty, order).ok()?;
        let back = converted.coerce_to(self.data_type, self.sort_order).ok()?;
        (back.value == self.value).then_some(converted)
    }

    pub(crate) fn evaluate(&self) -> Option<EncodedValue> {
        Some(self.value.clone())
    }
}

impl fmt::Display for LiteralExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match codec::to_string_literal(self.data_type, &self.value, self.sort_order) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.value),
        }
    }
}
