//! Ascending/descending storage order.
//!
//! Descending columns store every byte inverted. Inversion alone would
//! make a value sort *before* its own extensions (`"ab"` inverted is a
//! prefix of `"abc"` inverted), so variable-width values are first made
//! prefix-free: each 0x00 is followed by [`DESC_ESCAPE_BYTE`] and the
//! value ends with [`DESC_TERMINATOR`].

use bytes::Bytes;
use std::fmt;

use strata_common::constants::{DESC_ESCAPE_BYTE, DESC_TERMINATOR};
use strata_common::{StrataError, StrataResult};

use crate::data_type::LogicalType;

/// Storage order of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Natural byte order.
    #[default]
    Asc,
    /// Inverted byte order.
    Desc,
}

impl SortOrder {
    /// Identifier used on the wire and in catalog rows.
    pub fn system_value(self) -> u8 {
        match self {
            SortOrder::Asc => 0,
            SortOrder::Desc => 1,
        }
    }

    /// Looks up an order by its identifier.
    pub fn from_system_value(value: u8) -> StrataResult<Self> {
        match value {
            0 => Ok(SortOrder::Asc),
            1 => Ok(SortOrder::Desc),
            other => Err(StrataError::serialization(format!(
                "unknown sort order {other}"
            ))),
        }
    }

    /// Returns true for descending order.
    #[inline]
    pub fn is_desc(self) -> bool {
        self == SortOrder::Desc
    }

    /// Applies this order to ascending bytes of type `ty`.
    ///
    /// NULL (empty) stays empty in either order.
    pub fn apply(self, ty: LogicalType, asc: &[u8]) -> Bytes {
        if self == SortOrder::Asc || asc.is_empty() {
            return Bytes::copy_from_slice(asc);
        }
        if ty.is_fixed_width() {
            return asc.iter().map(|b| !b).collect();
        }
        let mut out = Vec::with_capacity(asc.len() + DESC_TERMINATOR.len() + 1);
        for &b in asc {
            out.push(!b);
            if b == 0x00 {
                out.push(!DESC_ESCAPE_BYTE);
            }
        }
        out.extend(DESC_TERMINATOR.iter().map(|b| !b));
        Bytes::from(out)
    }

    /// Recovers ascending bytes of type `ty` from bytes stored in this order.
    pub fn strip(self, ty: LogicalType, stored: &[u8]) -> StrataResult<Bytes> {
        if self == SortOrder::Asc || stored.is_empty() {
            return Ok(Bytes::copy_from_slice(stored));
        }
        if ty.is_fixed_width() {
            return Ok(stored.iter().map(|b| !b).collect());
        }
        let mut out = Vec::with_capacity(stored.len());
        let mut bytes = stored.iter().map(|b| !b);
        while let Some(b) = bytes.next() {
            if b != 0x00 {
                out.push(b);
                continue;
            }
            match bytes.next() {
                Some(DESC_ESCAPE_BYTE) => out.push(0x00),
                Some(t) if t == DESC_TERMINATOR[1] => {
                    if bytes.next().is_some() {
                        return Err(StrataError::illegal_data(
                            ty,
                            "bytes after descending terminator",
                        ));
                    }
                    return Ok(Bytes::from(out));
                }
                _ => {
                    return Err(StrataError::illegal_data(
                        ty,
                        "bad escape in descending value",
                    ))
                }
            }
        }
        Err(StrataError::illegal_data(
            ty,
            "descending value is missing its terminator",
        ))
    }

    /// Converts bytes of type `ty` stored in `from` order to `to` order.
    pub fn convert(ty: LogicalType, bytes: &[u8], from: SortOrder, to: SortOrder) -> StrataResult<Bytes> {
        if from == to {
            return Ok(Bytes::copy_from_slice(bytes));
        }
        let asc = from.strip(ty, bytes)?;
        Ok(to.apply(ty, &asc))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}
