//! Integer and floating point encodings.
//!
//! Integers are big-endian with the sign bit flipped, so negative values
//! sort below positive ones. Floats use the sortable IEEE transform:
//! negative values have every bit flipped, non-negative values only the
//! sign bit.

use strata_common::{StrataError, StrataResult};

use crate::data_type::LogicalType;

const F32_SIGN: u32 = 0x8000_0000;
const F64_SIGN: u64 = 0x8000_0000_0000_0000;

pub(crate) fn encode_i8(v: i8) -> [u8; 1] {
    [(v as u8) ^ 0x80]
}

pub(crate) fn encode_i16(v: i16) -> [u8; 2] {
    ((v as u16) ^ 0x8000).to_be_bytes()
}

pub(crate) fn encode_i32(v: i32) -> [u8; 4] {
    ((v as u32) ^ 0x8000_0000).to_be_bytes()
}

pub(crate) fn encode_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ 0x8000_0000_0000_0000).to_be_bytes()
}

pub(crate) fn decode_i8(bytes: &[u8]) -> StrataResult<i8> {
    let raw: [u8; 1] = fixed(LogicalType::TinyInt, bytes)?;
    Ok((raw[0] ^ 0x80) as i8)
}

pub(crate) fn decode_i16(bytes: &[u8]) -> StrataResult<i16> {
    let raw = fixed(LogicalType::SmallInt, bytes)?;
    Ok((u16::from_be_bytes(raw) ^ 0x8000) as i16)
}

pub(crate) fn decode_i32(bytes: &[u8]) -> StrataResult<i32> {
    decode_i32_as(LogicalType::Integer, bytes)
}

pub(crate) fn decode_i32_as(ty: LogicalType, bytes: &[u8]) -> StrataResult<i32> {
    let raw = fixed(ty, bytes)?;
    Ok((u32::from_be_bytes(raw) ^ 0x8000_0000) as i32)
}

pub(crate) fn decode_i64(bytes: &[u8]) -> StrataResult<i64> {
    decode_i64_as(LogicalType::BigInt, bytes)
}

pub(crate) fn decode_i64_as(ty: LogicalType, bytes: &[u8]) -> StrataResult<i64> {
    let raw = fixed(ty, bytes)?;
    Ok((u64::from_be_bytes(raw) ^ 0x8000_0000_0000_0000) as i64)
}

pub(crate) fn encode_f32(v: f32) -> [u8; 4] {
    let v = canonical_f32(v);
    let bits = v.to_bits();
    let sortable = if bits & F32_SIGN != 0 {
        !bits
    } else {
        bits ^ F32_SIGN
    };
    sortable.to_be_bytes()
}

pub(crate) fn encode_f64(v: f64) -> [u8; 8] {
    let v = canonical_f64(v);
    let bits = v.to_bits();
    let sortable = if bits & F64_SIGN != 0 {
        !bits
    } else {
        bits ^ F64_SIGN
    };
    sortable.to_be_bytes()
}

pub(crate) fn decode_f32(bytes: &[u8]) -> StrataResult<f32> {
    let sortable = u32::from_be_bytes(fixed(LogicalType::Float, bytes)?);
    let bits = if sortable & F32_SIGN != 0 {
        sortable ^ F32_SIGN
    } else {
        !sortable
    };
    Ok(f32::from_bits(bits))
}

pub(crate) fn decode_f64(bytes: &[u8]) -> StrataResult<f64> {
    let sortable = u64::from_be_bytes(fixed(LogicalType::Double, bytes)?);
    let bits = if sortable & F64_SIGN != 0 {
        sortable ^ F64_SIGN
    } else {
        !sortable
    };
    Ok(f64::from_bits(bits))
}

/// -0.0 becomes 0.0 and every NaN the positive quiet NaN.
pub(crate) fn canonical_f32(v: f32) -> f32 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f32::NAN
    } else {
        v
    }
}

pub(crate) fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Reads exactly `N` bytes or fails with `IllegalData`.
pub(crate) fn fixed<const N: usize>(ty: LogicalType, bytes: &[u8]) -> StrataResult<[u8; N]> {
    bytes.try_into().map_err(|_| {
        StrataError::illegal_data(ty, format!("expected {N} bytes, found {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_order() {
        assert!(encode_i32(-1) < encode_i32(0));
        assert!(encode_i32(i32::MIN) < encode_i32(-1));
        assert!(encode_i64(41) < encode_i64(42));
        assert!(encode_i8(i8::MIN) < encode_i8(i8::MAX));
        assert_eq!(decode_i16(&encode_i16(-300)).unwrap(), -300);
    }

    #[test]
    fn test_float_order() {
        let values = [f64::NEG_INFINITY, -2.5, -1e-300, 0.0, 1e-300, 3.0, f64::INFINITY];
        for pair in values.windows(2) {
            assert!(encode_f64(pair[0]) < encode_f64(pair[1]), "{pair:?}");
        }
        assert_eq!(encode_f64(-0.0), encode_f64(0.0));
        assert!(encode_f32(-1.0) < encode_f32(1.0));
    }

    #[test]
    fn test_float_roundtrip() {
        for v in [-123.25f64, 0.0, 7.5, f64::MAX] {
            assert_eq!(decode_f64(&encode_f64(v)).unwrap(), v);
        }
        assert_eq!(decode_f32(&encode_f32(-0.75)).unwrap(), -0.75);
    }

    #[test]
    fn test_wrong_width_rejected() {
        assert!(decode_i32(&[1, 2, 3]).is_err());
        assert!(decode_f64(&[0; 4]).is_err());
    }
}
