//! Logical SQL types.
//!
//! A logical type fixes the byte encoding of its values, whether that
//! encoding has a fixed width, and which other types its values can be
//! coerced to.

use std::fmt;

/// Broad type family; coercion never crosses families except
/// string-to-binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// BOOLEAN.
    Boolean,
    /// Integer, floating point and decimal types.
    Numeric,
    /// CHAR and VARCHAR.
    String,
    /// BINARY and VARBINARY.
    Binary,
    /// DATE, TIME and TIMESTAMP.
    Temporal,
}

/// A logical SQL scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalType {
    /// BOOLEAN.
    Boolean,
    /// 8-bit signed integer.
    TinyInt,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Arbitrary precision decimal (up to 28 digits).
    Decimal,
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    Varchar,
    /// Fixed-length binary string.
    Binary,
    /// Variable-length binary string.
    VarBinary,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time with nanosecond precision.
    Timestamp,
}

impl LogicalType {
    /// All logical types, in type-id order.
    pub const ALL: [LogicalType; 15] = [
        LogicalType::Boolean,
        LogicalType::TinyInt,
        LogicalType::SmallInt,
        LogicalType::Integer,
        LogicalType::BigInt,
        LogicalType::Float,
        LogicalType::Double,
        LogicalType::Decimal,
        LogicalType::Char,
        LogicalType::Varchar,
        LogicalType::Binary,
        LogicalType::VarBinary,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Timestamp,
    ];

    /// Stable one-byte identifier used on the wire and in catalog rows.
    pub fn type_id(self) -> u8 {
        match self {
            LogicalType::Boolean => 1,
            LogicalType::TinyInt => 2,
            LogicalType::SmallInt => 3,
            LogicalType::Integer => 4,
            LogicalType::BigInt => 5,
            LogicalType::Float => 6,
            LogicalType::Double => 7,
            LogicalType::Decimal => 8,
            LogicalType::Char => 9,
            LogicalType::Varchar => 10,
            LogicalType::Binary => 11,
            LogicalType::VarBinary => 12,
            LogicalType::Date => 13,
            LogicalType::Time => 14,
            LogicalType::Timestamp => 15,
        }
    }

    /// Looks up a type by its identifier.
    pub fn from_type_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.type_id() == id)
    }

    /// Returns the SQL name of the type.
    pub fn sql_name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::Char => "CHAR",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::Binary => "BINARY",
            LogicalType::VarBinary => "VARBINARY",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
        }
    }

    /// Byte width of every encoded value, if the type is fixed width.
    ///
    /// CHAR and BINARY are fixed width per column, not per type.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            LogicalType::Boolean | LogicalType::TinyInt => Some(1),
            LogicalType::SmallInt => Some(2),
            LogicalType::Integer | LogicalType::Float | LogicalType::Date => Some(4),
            LogicalType::BigInt | LogicalType::Double | LogicalType::Time => Some(8),
            LogicalType::Timestamp => Some(12),
            LogicalType::Decimal
            | LogicalType::Char
            | LogicalType::Varchar
            | LogicalType::Binary
            | LogicalType::VarBinary => None,
        }
    }

    /// Returns true if every encoded value has the same width.
    pub fn is_fixed_width(self) -> bool {
        self.fixed_width().is_some()
    }

    /// Returns the type family.
    pub fn family(self) -> TypeFamily {
        match self {
            LogicalType::Boolean => TypeFamily::Boolean,
            LogicalType::TinyInt
            | LogicalType::SmallInt
            | LogicalType::Integer
            | LogicalType::BigInt
            | LogicalType::Float
            | LogicalType::Double
            | LogicalType::Decimal => TypeFamily::Numeric,
            LogicalType::Char | LogicalType::Varchar => TypeFamily::String,
            LogicalType::Binary | LogicalType::VarBinary => TypeFamily::Binary,
            LogicalType::Date | LogicalType::Time | LogicalType::Timestamp => TypeFamily::Temporal,
        }
    }

    /// Returns true for exact integer types.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt | LogicalType::SmallInt | LogicalType::Integer | LogicalType::BigInt
        )
    }

    /// Returns true for numeric types.
    pub fn is_numeric(self) -> bool {
        self.family() == TypeFamily::Numeric
    }

    /// Returns true if values of this type may be coerced to `target`.
    ///
    /// Individual values can still fail with a constraint violation when
    /// they do not fit (e.g. 300 as TINYINT).
    pub fn is_coercible_to(self, target: LogicalType) -> bool {
        if self == target {
            return true;
        }
        match (self.family(), target.family()) {
            (TypeFamily::Numeric, TypeFamily::Numeric)
            | (TypeFamily::String, TypeFamily::String)
            | (TypeFamily::Binary, TypeFamily::Binary)
            | (TypeFamily::String, TypeFamily::Binary) => true,
            (TypeFamily::Temporal, TypeFamily::Temporal) => matches!(
                (self, target),
                (LogicalType::Date, LogicalType::Timestamp)
                    | (LogicalType::Timestamp, LogicalType::Date)
            ),
            _ => false,
        }
    }

    /// Returns the type both operands of a comparison are coerced to.
    pub fn common_type(self, other: LogicalType) -> Option<LogicalType> {
        if self == other {
            return Some(self);
        }
        match (self.family(), other.family()) {
            (TypeFamily::Numeric, TypeFamily::Numeric) => {
                let wider = if self.numeric_rank() >= other.numeric_rank() {
                    self
                } else {
                    other
                };
                // FLOAT cannot hold every INTEGER/BIGINT exactly
                if wider == LogicalType::Float
                    && matches!(self.min(other), LogicalType::Integer | LogicalType::BigInt)
                {
                    Some(LogicalType::Double)
                } else {
                    Some(wider)
                }
            }
            (TypeFamily::String, TypeFamily::String) => Some(LogicalType::Varchar),
            (TypeFamily::Binary, TypeFamily::Binary) => Some(LogicalType::VarBinary),
            (TypeFamily::Temporal, TypeFamily::Temporal)
                if self.is_coercible_to(other) =>
            {
                Some(LogicalType::Timestamp)
            }
            _ => None,
        }
    }

    fn numeric_rank(self) -> u8 {
        match self {
            LogicalType::TinyInt => 1,
            LogicalType::SmallInt => 2,
            LogicalType::Integer => 3,
            LogicalType::BigInt => 4,
            LogicalType::Float => 5,
            LogicalType::Double => 6,
            LogicalType::Decimal => 7,
            _ => 0,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}
