//! Decoded SQL values.
//!
//! A `Datum` is never NULL; absence of a value is `Option<Datum>` on the
//! decoded side and the empty span on the encoded side.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

use crate::data_type::LogicalType;

/// A non-null SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    TinyInt(i8),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 32-bit signed integer.
    Integer(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Decimal value.
    Decimal(Decimal),
    /// Character string (CHAR or VARCHAR).
    String(String),
    /// Binary string (BINARY or VARBINARY).
    Binary(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time, UTC.
    Timestamp(NaiveDateTime),
}

impl Datum {
    /// Returns the natural logical type of this value.
    ///
    /// Strings report VARCHAR and binaries VARBINARY.
    pub fn data_type(&self) -> LogicalType {
        match self {
            Datum::Boolean(_) => LogicalType::Boolean,
            Datum::TinyInt(_) => LogicalType::TinyInt,
            Datum::SmallInt(_) => LogicalType::SmallInt,
            Datum::Integer(_) => LogicalType::Integer,
            Datum::BigInt(_) => LogicalType::BigInt,
            Datum::Float(_) => LogicalType::Float,
            Datum::Double(_) => LogicalType::Double,
            Datum::Decimal(_) => LogicalType::Decimal,
            Datum::String(_) => LogicalType::Varchar,
            Datum::Binary(_) => LogicalType::VarBinary,
            Datum::Date(_) => LogicalType::Date,
            Datum::Time(_) => LogicalType::Time,
            Datum::Timestamp(_) => LogicalType::Timestamp,
        }
    }

    /// Returns true if this value can be encoded as `ty` without coercion.
    pub fn is_instance_of(&self, ty: LogicalType) -> bool {
        match self {
            Datum::String(_) => matches!(ty, LogicalType::Char | LogicalType::Varchar),
            Datum::Binary(_) => matches!(ty, LogicalType::Binary | LogicalType::VarBinary),
            other => other.data_type() == ty,
        }
    }

    /// Compares two values of the same variant.
    ///
    /// Returns `None` for values of different variants. Floats use the
    /// IEEE total order, matching their byte encoding.
    pub fn compare(&self, other: &Datum) -> Option<Ordering> {
        let ordering = match (self, other) {
            (Datum::Boolean(a), Datum::Boolean(b)) => a.cmp(b),
            (Datum::TinyInt(a), Datum::TinyInt(b)) => a.cmp(b),
            (Datum::SmallInt(a), Datum::SmallInt(b)) => a.cmp(b),
            (Datum::Integer(a), Datum::Integer(b)) => a.cmp(b),
            (Datum::BigInt(a), Datum::BigInt(b)) => a.cmp(b),
            (Datum::Float(a), Datum::Float(b)) => a.total_cmp(b),
            (Datum::Double(a), Datum::Double(b)) => a.total_cmp(b),
            (Datum::Decimal(a), Datum::Decimal(b)) => a.cmp(b),
            (Datum::String(a), Datum::String(b)) => a.cmp(b),
            (Datum::Binary(a), Datum::Binary(b)) => a.cmp(b),
            (Datum::Date(a), Datum::Date(b)) => a.cmp(b),
            (Datum::Time(a), Datum::Time(b)) => a.cmp(b),
            (Datum::Timestamp(a), Datum::Timestamp(b)) => a.cmp(b),
            _ => return None,
        };
        Some(ordering)
    }
}

/// Renders the value as a SQL literal.
impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Datum::TinyInt(v) => write!(f, "{v}"),
            Datum::SmallInt(v) => write!(f, "{v}"),
            Datum::Integer(v) => write!(f, "{v}"),
            Datum::BigInt(v) => write!(f, "{v}"),
            Datum::Float(v) => write!(f, "{v}"),
            Datum::Double(v) => write!(f, "{v}"),
            Datum::Decimal(v) => write!(f, "{v}"),
            Datum::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Datum::Binary(bytes) => {
                write!(f, "X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "'")
            }
            Datum::Date(d) => write!(f, "DATE '{}'", d.format("%Y-%m-%d")),
            Datum::Time(t) => write!(f, "TIME '{}'", t.format("%H:%M:%S%.f")),
            Datum::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Boolean(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Integer(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::BigInt(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Double(v)
    }
}

impl From<Decimal> for Datum {
    fn from(v: Decimal) -> Self {
        Datum::Decimal(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::String(v)
    }
}
