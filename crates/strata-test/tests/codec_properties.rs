//! Ordering properties of the binary type codec.

use std::cmp::Ordering;
use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use strata_common::StrataError;
use strata_types::decimal::normalize_to;
use strata_types::{codec, coerce_bytes, Datum, EncodedValue, LogicalType, SortOrder};

fn encode(ty: LogicalType, datum: &Datum, order: SortOrder) -> EncodedValue {
    codec::encode_with_order(ty, datum, order).unwrap()
}

proptest! {
    #[test]
    fn bigint_bytes_follow_value_order(a in any::<i64>(), b in any::<i64>()) {
        let ea = encode(LogicalType::BigInt, &Datum::BigInt(a), SortOrder::Asc);
        let eb = encode(LogicalType::BigInt, &Datum::BigInt(b), SortOrder::Asc);
        prop_assert_eq!(ea.as_bytes().cmp(eb.as_bytes()), a.cmp(&b));

        let da = encode(LogicalType::BigInt, &Datum::BigInt(a), SortOrder::Desc);
        let db = encode(LogicalType::BigInt, &Datum::BigInt(b), SortOrder::Desc);
        prop_assert_eq!(da.as_bytes().cmp(db.as_bytes()), b.cmp(&a));
    }

    #[test]
    fn double_bytes_follow_value_order(a in -1.0e12f64..1.0e12, b in -1.0e12f64..1.0e12) {
        let ea = encode(LogicalType::Double, &Datum::Double(a), SortOrder::Asc);
        let eb = encode(LogicalType::Double, &Datum::Double(b), SortOrder::Asc);
        prop_assert_eq!(ea.as_bytes().cmp(eb.as_bytes()), a.partial_cmp(&b).unwrap());
    }

    #[test]
    fn varchar_desc_reverses_order(a in "[\\x00a-c\\x{e9}\\x{1F600}]{1,8}", b in "[\\x00a-c\\x{e9}\\x{1F600}]{1,8}") {
        let da = encode(LogicalType::Varchar, &Datum::String(a.clone()), SortOrder::Desc);
        let db = encode(LogicalType::Varchar, &Datum::String(b.clone()), SortOrder::Desc);
        prop_assert_eq!(da.as_bytes().cmp(db.as_bytes()), b.cmp(&a));

        let back = codec::decode_with_order(LogicalType::Varchar, da.as_bytes(), SortOrder::Desc).unwrap();
        prop_assert_eq!(back, Some(Datum::String(a)));
    }

    #[test]
    fn varbinary_desc_reverses_order(
        a in proptest::collection::vec(prop_oneof![Just(0u8), Just(0xFFu8), any::<u8>()], 1..8),
        b in proptest::collection::vec(prop_oneof![Just(0u8), Just(0xFFu8), any::<u8>()], 1..8),
    ) {
        let ty = LogicalType::VarBinary;
        let asc = codec::compare_encoded(
            ty,
            encode(ty, &Datum::Binary(a.clone()), SortOrder::Asc).as_bytes(),
            SortOrder::Asc,
            encode(ty, &Datum::Binary(b.clone()), SortOrder::Asc).as_bytes(),
            SortOrder::Asc,
        ).unwrap();
        let da = encode(ty, &Datum::Binary(a.clone()), SortOrder::Desc);
        let db = encode(ty, &Datum::Binary(b.clone()), SortOrder::Desc);
        prop_assert_eq!(asc, a.cmp(&b));
        prop_assert_eq!(da.as_bytes().cmp(db.as_bytes()), asc.reverse());
        let mixed = codec::compare_encoded(ty, da.as_bytes(), SortOrder::Desc, db.as_bytes(), SortOrder::Desc).unwrap();
        prop_assert_eq!(mixed, asc);
    }

    #[test]
    fn decimal_bytes_follow_value_order(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000, scale in 0u32..6) {
        let da = Decimal::new(a, scale);
        let db = Decimal::new(b, scale);
        let ea = encode(LogicalType::Decimal, &Datum::Decimal(da), SortOrder::Asc);
        let eb = encode(LogicalType::Decimal, &Datum::Decimal(db), SortOrder::Asc);
        prop_assert_eq!(ea.as_bytes().cmp(eb.as_bytes()), da.cmp(&db));

        let desc_a = encode(LogicalType::Decimal, &Datum::Decimal(da), SortOrder::Desc);
        let desc_b = encode(LogicalType::Decimal, &Datum::Decimal(db), SortOrder::Desc);
        prop_assert_eq!(desc_a.as_bytes().cmp(desc_b.as_bytes()), db.cmp(&da));
    }
}

#[test]
fn desc_zero_byte_sorts_before_prefix() {
    let ty = LogicalType::VarBinary;
    let a = encode(ty, &Datum::Binary(b"a".to_vec()), SortOrder::Desc);
    let a_zero = encode(ty, &Datum::Binary(b"a\0".to_vec()), SortOrder::Desc);
    assert_eq!(a.as_bytes().cmp(a_zero.as_bytes()), Ordering::Greater);
    let ordering = codec::compare_encoded(ty, a.as_bytes(), SortOrder::Desc, a_zero.as_bytes(), SortOrder::Desc).unwrap();
    assert_eq!(ordering, Ordering::Less);
}

#[test]
fn null_sorts_first_in_both_orders() {
    let one = encode(LogicalType::Integer, &Datum::Integer(i32::MIN), SortOrder::Asc);
    for order in [SortOrder::Asc, SortOrder::Desc] {
        let ordering = codec::compare_encoded(LogicalType::Integer, &[], order, one.as_bytes(), SortOrder::Asc).unwrap();
        assert_eq!(ordering, Ordering::Less);
    }
}

#[test]
fn mixed_order_comparison_decodes() {
    let asc = encode(LogicalType::Integer, &Datum::Integer(7), SortOrder::Asc);
    let desc = encode(LogicalType::Integer, &Datum::Integer(3), SortOrder::Desc);
    let ordering = codec::compare_encoded(
        LogicalType::Integer,
        asc.as_bytes(),
        SortOrder::Asc,
        desc.as_bytes(),
        SortOrder::Desc,
    )
    .unwrap();
    assert_eq!(ordering, Ordering::Greater);
}

#[test]
fn decimal_width_and_scale() {
    let value = Decimal::from_str("12.340").unwrap();
    assert_eq!(normalize_to(value, 5, 2).unwrap(), Decimal::from_str("12.34").unwrap());

    let too_wide = normalize_to(Decimal::from_str("123.45").unwrap(), 3, 1);
    assert!(matches!(too_wide, Err(StrataError::PrecisionOverflow { .. })));
}

#[test]
fn coerce_between_orders_and_widths() {
    let small = encode(LogicalType::SmallInt, &Datum::SmallInt(-42), SortOrder::Asc);
    let wide = coerce_bytes(&small, LogicalType::SmallInt, SortOrder::Asc, LogicalType::BigInt, SortOrder::Desc).unwrap();
    let back = codec::decode_with_order(LogicalType::BigInt, wide.as_bytes(), SortOrder::Desc).unwrap();
    assert_eq!(back, Some(Datum::BigInt(-42)));

    let null = coerce_bytes(
        &EncodedValue::null(),
        LogicalType::Integer,
        SortOrder::Asc,
        LogicalType::Double,
        SortOrder::Asc,
    )
    .unwrap();
    assert!(null.is_null());
}

#[test]
fn literal_rendering() {
    let value = encode(LogicalType::Varchar, &Datum::String("it's".into()), SortOrder::Desc);
    let text = codec::to_string_literal(LogicalType::Varchar, value.as_bytes(), SortOrder::Desc).unwrap();
    assert!(text.contains("it"));
    assert_eq!(codec::to_string_literal(LogicalType::Integer, &[], SortOrder::Asc).unwrap(), "NULL");
}
