//! Encoding and decoding of SQL values.
//!
//! # Encoding Format
//!
//! | type                  | bytes                                        |
//! |-----------------------|----------------------------------------------|
//! | BOOLEAN               | `0x00` / `0x01`                              |
//! | TINYINT .. BIGINT     | big-endian, sign bit flipped                 |
//! | FLOAT, DOUBLE         | sortable IEEE bits, big-endian               |
//! | DECIMAL               | exponent byte + base-100 digits              |
//! | CHAR, VARCHAR         | UTF-8 bytes                                  |
//! | BINARY, VARBINARY     | raw bytes                                    |
//! | DATE, TIME, TIMESTAMP | see the temporal module                      |
//!
//! NULL is the empty span for every type. Values stored in descending
//! order go through [`SortOrder::apply`] after encoding.

mod decimal;
mod numeric;
mod temporal;

use std::cmp::Ordering;

use strata_common::{StrataError, StrataResult};

use crate::coerce::coerce_datum;
use crate::data_type::LogicalType;
use crate::datum::Datum;
use crate::sort_order::SortOrder;
use crate::value::EncodedValue;

/// Encodes a value as `ty` in ascending order.
///
/// A value of a different type is coerced to `ty` first.
pub fn encode(ty: LogicalType, datum: &Datum) -> StrataResult<EncodedValue> {
    if !datum.is_instance_of(ty) {
        let coerced = coerce_datum(datum, ty)?;
        return encode(ty, &coerced);
    }
    let bytes = match datum {
        Datum::Boolean(b) => vec![u8::from(*b)],
        Datum::TinyInt(v) => numeric::encode_i8(*v).to_vec(),
        Datum::SmallInt(v) => numeric::encode_i16(*v).to_vec(),
        Datum::Integer(v) => numeric::encode_i32(*v).to_vec(),
        Datum::BigInt(v) => numeric::encode_i64(*v).to_vec(),
        Datum::Float(v) => numeric::encode_f32(*v).to_vec(),
        Datum::Double(v) => numeric::encode_f64(*v).to_vec(),
        Datum::Decimal(v) => decimal::encode_decimal(v),
        Datum::String(s) => s.as_bytes().to_vec(),
        Datum::Binary(b) => b.clone(),
        Datum::Date(d) => temporal::encode_date(d).to_vec(),
        Datum::Time(t) => temporal::encode_time(t).to_vec(),
        Datum::Timestamp(ts) => temporal::encode_timestamp(ts).to_vec(),
    };
    Ok(EncodedValue::from_vec(bytes))
}

/// Encodes a value as `ty` in the given storage order.
pub fn encode_with_order(
    ty: LogicalType,
    datum: &Datum,
    order: SortOrder,
) -> StrataResult<EncodedValue> {
    let asc = encode(ty, datum)?;
    match order {
        SortOrder::Asc => Ok(asc),
        SortOrder::Desc => Ok(EncodedValue::from_bytes(order.apply(ty, &asc))),
    }
}

/// Decodes ascending bytes of type `ty`. The empty span decodes to `None`.
pub fn decode(ty: LogicalType, bytes: &[u8]) -> StrataResult<Option<Datum>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let datum = match ty {
        LogicalType::Boolean => match bytes {
            [0] => Datum::Boolean(false),
            [1] => Datum::Boolean(true),
            _ => return Err(StrataError::illegal_data(ty, "expected 0x00 or 0x01")),
        },
        LogicalType::TinyInt => Datum::TinyInt(numeric::decode_i8(bytes)?),
        LogicalType::SmallInt => Datum::SmallInt(numeric::decode_i16(bytes)?),
        LogicalType::Integer => Datum::Integer(numeric::decode_i32(bytes)?),
        LogicalType::BigInt => Datum::BigInt(numeric::decode_i64(bytes)?),
        LogicalType::Float => Datum::Float(numeric::decode_f32(bytes)?),
        LogicalType::Double => Datum::Double(numeric::decode_f64(bytes)?),
        LogicalType::Decimal => Datum::Decimal(decimal::decode_decimal(bytes)?),
        LogicalType::Char | LogicalType::Varchar => Datum::String(
            std::str::from_utf8(bytes)
                .map_err(|e| StrataError::illegal_data(ty, e.to_string()))?
                .to_string(),
        ),
        LogicalType::Binary | LogicalType::VarBinary => Datum::Binary(bytes.to_vec()),
        LogicalType::Date => Datum::Date(temporal::decode_date(bytes)?),
        LogicalType::Time => Datum::Time(temporal::decode_time(bytes)?),
        LogicalType::Timestamp => Datum::Timestamp(temporal::decode_timestamp(bytes)?),
    };
    Ok(Some(datum))
}

/// Decodes bytes of type `ty` stored in `order`.
pub fn decode_with_order(
    ty: LogicalType,
    bytes: &[u8],
    order: SortOrder,
) -> StrataResult<Option<Datum>> {
    match order {
        SortOrder::Asc => decode(ty, bytes),
        SortOrder::Desc => decode(ty, &order.strip(ty, bytes)?),
    }
}

/// Unsigned lexicographic comparison of two encodings.
#[inline]
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Compares two encoded values of type `ty` by their logical order.
///
/// Values stored in the same order are compared byte-wise; values stored
/// in different orders are decoded first. NULL sorts before every value
/// regardless of order.
pub fn compare_encoded(
    ty: LogicalType,
    a: &[u8],
    a_order: SortOrder,
    b: &[u8],
    b_order: SortOrder,
) -> StrataResult<Ordering> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Less),
        (false, true) => return Ok(Ordering::Greater),
        (false, false) => {}
    }
    if a_order == b_order {
        let ordering = compare(a, b);
        return Ok(if a_order.is_desc() {
            ordering.reverse()
        } else {
            ordering
        });
    }
    let left = decode_with_order(ty, a, a_order)?;
    let right = decode_with_order(ty, b, b_order)?;
    match (left, right) {
        (Some(l), Some(r)) => l
            .compare(&r)
            .ok_or_else(|| StrataError::internal(format!("cannot compare {l} with {r}"))),
        _ => Err(StrataError::internal("non-empty value decoded to NULL")),
    }
}

/// Renders encoded bytes as a SQL literal, `NULL` for the empty span.
pub fn to_string_literal(ty: LogicalType, bytes: &[u8], order: SortOrder) -> StrataResult<String> {
    Ok(match decode_with_order(ty, bytes, order)? {
        Some(datum) => datum.to_string(),
        None => "NULL".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn roundtrip(ty: LogicalType, datum: Datum) {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let encoded = encode_with_order(ty, &datum, order).unwrap();
            let decoded = decode_with_order(ty, encoded.as_bytes(), order).unwrap();
            assert_eq!(decoded, Some(datum.clone()), "{ty} {order}");
        }
    }

    #[test]
    fn test_roundtrip_every_type() {
        roundtrip(LogicalType::Boolean, Datum::Boolean(true));
        roundtrip(LogicalType::TinyInt, Datum::TinyInt(-7));
        roundtrip(LogicalType::SmallInt, Datum::SmallInt(i16::MAX));
        roundtrip(LogicalType::Integer, Datum::Integer(i32::MIN));
        roundtrip(LogicalType::BigInt, Datum::BigInt(1 << 40));
        roundtrip(LogicalType::Float, Datum::Float(1.5));
        roundtrip(LogicalType::Double, Datum::Double(-2.25));
        roundtrip(
            LogicalType::Decimal,
            Datum::Decimal(Decimal::from_str("-12.5").unwrap()),
        );
        roundtrip(LogicalType::Char, Datum::from("abc"));
        roundtrip(LogicalType::Varchar, Datum::from("héllo"));
        roundtrip(LogicalType::VarBinary, Datum::Binary(vec![0, 0xFF, 7]));
        roundtrip(
            LogicalType::Date,
            Datum::Date(NaiveDate::from_ymd_opt(2001, 9, 9).unwrap()),
        );
        roundtrip(
            LogicalType::Timestamp,
            Datum::Timestamp(
                NaiveDate::from_ymd_opt(2001, 9, 9)
                    .unwrap()
                    .and_hms_milli_opt(1, 46, 40, 250)
                    .unwrap(),
            ),
        );
    }

    #[test]
    fn test_null_is_empty() {
        assert_eq!(decode(LogicalType::Integer, &[]).unwrap(), None);
        assert_eq!(
            to_string_literal(LogicalType::Integer, &[], SortOrder::Asc).unwrap(),
            "NULL"
        );
    }

    #[test]
    fn test_encode_coerces_other_types() {
        let encoded = encode(LogicalType::BigInt, &Datum::Integer(5)).unwrap();
        assert_eq!(encoded.len(), 8);
        assert!(encode(LogicalType::Integer, &Datum::from("five")).is_err());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = decode(LogicalType::Varchar, &[0xC3]).unwrap_err();
        assert_eq!(err.code(), strata_common::ErrorCode::IllegalData);
    }

    #[test]
    fn test_compare_encoded_mixed_orders() {
        let ty = LogicalType::Integer;
        let a = encode_with_order(ty, &Datum::Integer(1), SortOrder::Asc).unwrap();
        let b = encode_with_order(ty, &Datum::Integer(2), SortOrder::Desc).unwrap();
        let c = encode_with_order(ty, &Datum::Integer(3), SortOrder::Desc).unwrap();
        assert_eq!(
            compare_encoded(ty, &a, SortOrder::Asc, &b, SortOrder::Desc).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_encoded(ty, &b, SortOrder::Desc, &c, SortOrder::Desc).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare_encoded(ty, &[], SortOrder::Desc, &c, SortOrder::Desc).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_string_literal() {
        let encoded = encode(LogicalType::Varchar, &Datum::from("x")).unwrap();
        assert_eq!(
            to_string_literal(LogicalType::Varchar, &encoded, SortOrder::Asc).unwrap(),
            "'x'"
        );
    }

    fn ordered_pair<T: Ord + Copy>(a: T, b: T) -> (T, T) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    proptest! {
        #[test]
        fn prop_bigint_order_preserved(a in any::<i64>(), b in any::<i64>()) {
            let (lo, hi) = ordered_pair(a, b);
            let lo_asc = encode(LogicalType::BigInt, &Datum::BigInt(lo)).unwrap();
            let hi_asc = encode(LogicalType::BigInt, &Datum::BigInt(hi)).unwrap();
            prop_assert_eq!(compare(&lo_asc, &hi_asc), lo.cmp(&hi));

            let lo_desc = encode_with_order(LogicalType::BigInt, &Datum::BigInt(lo), SortOrder::Desc).unwrap();
            let hi_desc = encode_with_order(LogicalType::BigInt, &Datum::BigInt(hi), SortOrder::Desc).unwrap();
            prop_assert_eq!(compare(&lo_desc, &hi_desc), hi.cmp(&lo));
        }

        #[test]
        fn prop_double_order_preserved(a in -1e300f64..1e300, b in -1e300f64..1e300) {
            let ea = encode(LogicalType::Double, &Datum::Double(a)).unwrap();
            let eb = encode(LogicalType::Double, &Datum::Double(b)).unwrap();
            let expected = if a == b { Ordering::Equal } else { a.total_cmp(&b) };
            prop_assert_eq!(compare(&ea, &eb), expected);
        }

        #[test]
        fn prop_decimal_roundtrip_and_order(
            a in any::<i64>(), sa in 0u32..18, b in any::<i64>(), sb in 0u32..18,
        ) {
            let da = Decimal::new(a, sa);
            let db = Decimal::new(b, sb);
            let ea = encode(LogicalType::Decimal, &Datum::Decimal(da)).unwrap();
            let eb = encode(LogicalType::Decimal, &Datum::Decimal(db)).unwrap();
            prop_assert_eq!(decode(LogicalType::Decimal, &ea).unwrap(), Some(Datum::Decimal(da)));
            prop_assert_eq!(compare(&ea, &eb), da.cmp(&db));
        }

        #[test]
        fn prop_varbinary_desc_order_flips(
            a in proptest::collection::vec(any::<u8>(), 1..12),
            b in proptest::collection::vec(any::<u8>(), 1..12),
        ) {
            let ty = LogicalType::VarBinary;
            let ea = encode_with_order(ty, &Datum::Binary(a.clone()), SortOrder::Desc).unwrap();
            let eb = encode_with_order(ty, &Datum::Binary(b.clone()), SortOrder::Desc).unwrap();
            prop_assert_eq!(compare(&ea, &eb), b.cmp(&a));
            prop_assert_eq!(compare_encoded(ty, &ea, SortOrder::Desc, &eb, SortOrder::Desc).unwrap(), a.cmp(&b));
            prop_assert_eq!(decode_with_order(ty, &ea, SortOrder::Desc).unwrap(), Some(Datum::Binary(a)));
        }

        #[test]
        fn prop_varchar_desc_order_flips(a in any::<String>(), b in any::<String>()) {
            prop_assume!(!a.is_empty() && !b.is_empty());
            let ea = encode_with_order(LogicalType::Varchar, &Datum::from(a.as_str()), SortOrder::Desc).unwrap();
            let eb = encode_with_order(LogicalType::Varchar, &Datum::from(b.as_str()), SortOrder::Desc).unwrap();
            prop_assert_eq!(compare(&ea, &eb), b.cmp(&a));
            prop_assert_eq!(decode_with_order(LogicalType::Varchar, &ea, SortOrder::Desc).unwrap(), Some(Datum::String(a)));
        }

        #[test]
        fn prop_decimal_desc_order_flips(a in any::<i64>(), sa in 0u32..18, b in any::<i64>(), sb in 0u32..18) {
            let da = Decimal::new(a, sa);
            let db = Decimal::new(b, sb);
            let ea = encode_with_order(LogicalType::Decimal, &Datum::Decimal(da), SortOrder::Desc).unwrap();
            let eb = encode_with_order(LogicalType::Decimal, &Datum::Decimal(db), SortOrder::Desc).unwrap();
            prop_assert_eq!(compare(&ea, &eb), db.cmp(&da));
            prop_assert_eq!(decode_with_order(LogicalType::Decimal, &ea, SortOrder::Desc).unwrap(), Some(Datum::Decimal(da)));
        }
    }
}
