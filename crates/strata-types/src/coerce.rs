//! Coercion between logical types.
//!
//! A coercion across families fails with `TypeMismatch`; a value that does
//! not fit the narrower target fails with `ConstraintViolation`. Membership
//! predicates drop candidates on either error, so both must be cheap to
//! recognize via [`StrataError::is_coercion_failure`].

use chrono::NaiveTime;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use strata_common::{StrataError, StrataResult};

use crate::codec;
use crate::data_type::LogicalType;
use crate::datum::Datum;
use crate::decimal::normalize;
use crate::sort_order::SortOrder;
use crate::value::EncodedValue;

/// Coerces a value to `target`.
pub fn coerce_datum(datum: &Datum, target: LogicalType) -> StrataResult<Datum> {
    if datum.is_instance_of(target) {
        return Ok(datum.clone());
    }
    let source = datum.data_type();
    if !source.is_coercible_to(target) {
        return Err(StrataError::type_mismatch(source, target));
    }

    match datum {
        Datum::String(s) => Ok(Datum::Binary(s.as_bytes().to_vec())),
        Datum::Date(d) => Ok(Datum::Timestamp(d.and_time(NaiveTime::MIN))),
        Datum::Timestamp(ts) => {
            if ts.time() == NaiveTime::MIN {
                Ok(Datum::Date(ts.date()))
            } else {
                Err(StrataError::constraint_violation(format!(
                    "{datum} has a time component and cannot become a DATE"
                )))
            }
        }
        _ => coerce_numeric(datum, target),
    }
}

fn coerce_numeric(datum: &Datum, target: LogicalType) -> StrataResult<Datum> {
    match target {
        LogicalType::TinyInt => {
            let v = to_i64(datum)?;
            i8::try_from(v).map(Datum::TinyInt).map_err(|_| out_of_range(datum, target))
        }
        LogicalType::SmallInt => {
            let v = to_i64(datum)?;
            i16::try_from(v).map(Datum::SmallInt).map_err(|_| out_of_range(datum, target))
        }
        LogicalType::Integer => {
            let v = to_i64(datum)?;
            i32::try_from(v).map(Datum::Integer).map_err(|_| out_of_range(datum, target))
        }
        LogicalType::BigInt => to_i64(datum).map(Datum::BigInt),
        LogicalType::Float => {
            let v = to_f64(datum);
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                return Err(out_of_range(datum, target));
            }
            Ok(Datum::Float(v as f32))
        }
        LogicalType::Double => Ok(Datum::Double(to_f64(datum))),
        LogicalType::Decimal => {
            let d = match datum {
                Datum::TinyInt(v) => Decimal::from(*v),
                Datum::SmallInt(v) => Decimal::from(*v),
                Datum::Integer(v) => Decimal::from(*v),
                Datum::BigInt(v) => Decimal::from(*v),
                Datum::Float(v) => {
                    Decimal::from_f32(*v).ok_or_else(|| out_of_range(datum, target))?
                }
                Datum::Double(v) => {
                    Decimal::from_f64(*v).ok_or_else(|| out_of_range(datum, target))?
                }
                Datum::Decimal(v) => *v,
                _ => return Err(StrataError::type_mismatch(datum.data_type(), target)),
            };
            Ok(Datum::Decimal(normalize(d)?))
        }
        _ => Err(StrataError::type_mismatch(datum.data_type(), target)),
    }
}

fn to_i64(datum: &Datum) -> StrataResult<i64> {
    let integral = |ok: bool, v: Option<i64>| match (ok, v) {
        (true, Some(v)) => Ok(v),
        (false, _) => Err(StrataError::constraint_violation(format!(
            "{datum} is not an integral value"
        ))),
        (true, None) => Err(out_of_range(datum, LogicalType::BigInt)),
    };
    match datum {
        Datum::TinyInt(v) => Ok(i64::from(*v)),
        Datum::SmallInt(v) => Ok(i64::from(*v)),
        Datum::Integer(v) => Ok(i64::from(*v)),
        Datum::BigInt(v) => Ok(*v),
        Datum::Float(v) => integral(v.fract() == 0.0, v.to_i64()),
        Datum::Double(v) => integral(v.fract() == 0.0, v.to_i64()),
        Datum::Decimal(v) => integral(v.fract().is_zero(), v.to_i64()),
        other => Err(StrataError::type_mismatch(other.data_type(), LogicalType::BigInt)),
    }
}

fn to_f64(datum: &Datum) -> f64 {
    match datum {
        Datum::TinyInt(v) => f64::from(*v),
        Datum::SmallInt(v) => f64::from(*v),
        Datum::Integer(v) => f64::from(*v),
        Datum::BigInt(v) => *v as f64,
        Datum::Float(v) => f64::from(*v),
        Datum::Double(v) => *v,
        Datum::Decimal(v) => v.to_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn out_of_range(datum: &Datum, target: LogicalType) -> StrataError {
    StrataError::constraint_violation(format!("{datum} is out of range for {target}"))
}

/// Re-encodes `value` from (`from`, `from_order`) to (`to`, `to_order`).
///
/// NULL stays NULL. The same type and order returns the input span
/// without copying.
pub fn coerce_bytes(
    value: &EncodedValue,
    from: LogicalType,
    from_order: SortOrder,
    to: LogicalType,
    to_order: SortOrder,
) -> StrataResult<EncodedValue> {
    if value.is_null() {
        return Ok(EncodedValue::null());
    }
    if from == to || same_encoding(from, to) {
        if from_order == to_order {
            return Ok(value.clone());
        }
        return SortOrder::convert(from, value, from_order, to_order).map(EncodedValue::from_bytes);
    }
    if !from.is_coercible_to(to) {
        return Err(StrataError::type_mismatch(from, to));
    }
    match codec::decode_with_order(from, value, from_order)? {
        Some(datum) => codec::encode_with_order(to, &coerce_datum(&datum, to)?, to_order),
        None => Ok(EncodedValue::null()),
    }
}

/// Types whose encodings are byte-identical.
fn same_encoding(from: LogicalType, to: LogicalType) -> bool {
    use LogicalType::*;
    matches!(
        (from, to),
        (Char, Varchar)
            | (Varchar, Char)
            | (Binary, VarBinary)
            | (VarBinary, Binary)
            | (Char | Varchar, Binary | VarBinary)
    )
}
