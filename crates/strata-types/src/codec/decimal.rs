//! Order-preserving DECIMAL encoding.
//!
//! A non-zero value is written as `0.d1 d2 ... dk x 100^exp`, each `d` a
//! base-100 digit and `d1 != 0`:
//!
//! ```text
//! zero      0x80
//! positive  0xC0 + exp,  d1 + 1, ..., dk + 1
//! negative  0x3F - exp,  101 - d1, ..., 101 - dk, 102
//! ```
//!
//! Trailing zero digits are never written, so comparing the bytes compares
//! the values. Negative values carry a terminator that sorts above every
//! complemented digit, which makes a longer magnitude sort first.

use rust_decimal::Decimal;

use strata_common::{StrataError, StrataResult};

use crate::data_type::LogicalType;

const ZERO_BYTE: u8 = 0x80;
const POSITIVE_BASE: i32 = 0xC0;
const NEGATIVE_BASE: i32 = 0x3F;
const NEGATIVE_TERMINATOR: u8 = 102;

pub(crate) fn encode_decimal(value: &Decimal) -> Vec<u8> {
    let value = value.normalize();
    if value.is_zero() {
        return vec![ZERO_BYTE];
    }

    let mut digits: Vec<u8> = value
        .mantissa()
        .unsigned_abs()
        .to_string()
        .bytes()
        .map(|b| b - b'0')
        .collect();
    let integer_digits = digits.len() as i32 - value.scale() as i32;

    // Pad so the decimal point falls between two base-100 digits.
    let exp = if integer_digits > 0 {
        if integer_digits % 2 == 1 {
            digits.insert(0, 0);
        }
        (integer_digits + 1) / 2
    } else {
        let leading_zeros = -integer_digits;
        if leading_zeros % 2 == 1 {
            digits.insert(0, 0);
        }
        -(leading_zeros / 2)
    };
    if digits.len() % 2 == 1 {
        digits.push(0);
    }

    let mut pairs: Vec<u8> = digits.chunks(2).map(|c| c[0] * 10 + c[1]).collect();
    while pairs.last() == Some(&0) {
        pairs.pop();
    }

    let mut out = Vec::with_capacity(pairs.len() + 2);
    if value.is_sign_negative() {
        out.push((NEGATIVE_BASE - exp) as u8);
        out.extend(pairs.iter().map(|d| 101 - d));
        out.push(NEGATIVE_TERMINATOR);
    } else {
        out.push((POSITIVE_BASE + exp) as u8);
        out.extend(pairs.iter().map(|d| d + 1));
    }
    out
}

pub(crate) fn decode_decimal(bytes: &[u8]) -> StrataResult<Decimal> {
    let (&head, rest) = bytes
        .split_first()
        .ok_or_else(|| illegal("empty decimal"))?;
    if head == ZERO_BYTE {
        if !rest.is_empty() {
            return Err(illegal("trailing bytes after zero"));
        }
        return Ok(Decimal::ZERO);
    }

    let negative = head < ZERO_BYTE;
    let (exp, digit_bytes) = if negative {
        let (&last, body) = rest
            .split_last()
            .ok_or_else(|| illegal("missing digits"))?;
        if last != NEGATIVE_TERMINATOR {
            return Err(illegal("missing terminator"));
        }
        (NEGATIVE_BASE - head as i32, body)
    } else {
        (head as i32 - POSITIVE_BASE, rest)
    };
    if digit_bytes.is_empty() || digit_bytes.len() > 16 {
        return Err(illegal("digit count out of range"));
    }

    let mut mantissa: i128 = 0;
    for &b in digit_bytes {
        let digit = if negative {
            101i32 - b as i32
        } else {
            b as i32 - 1
        };
        if !(0..100).contains(&digit) {
            return Err(illegal("digit out of range"));
        }
        mantissa = mantissa * 100 + digit as i128;
    }

    let shift = 2 * (exp - digit_bytes.len() as i32);
    let (mantissa, scale) = if shift >= 0 {
        let factor = 10i128
            .checked_pow(shift as u32)
            .ok_or_else(|| illegal("exponent out of range"))?;
        let m = mantissa
            .checked_mul(factor)
            .ok_or_else(|| illegal("exponent out of range"))?;
        (m, 0u32)
    } else {
        (mantissa, (-shift) as u32)
    };
    let signed = if negative { -mantissa } else { mantissa };
    Decimal::try_from_i128_with_scale(signed, scale)
        .map(|d| d.normalize())
        .map_err(|e| illegal(&e.to_string()))
}

fn illegal(reason: &str) -> StrataError {
    StrataError::illegal_data(LogicalType::Decimal, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode_decimal(&Decimal::ZERO), vec![0x80]);
        assert_eq!(encode_decimal(&dec("1")), vec![0xC1, 2]);
        assert_eq!(encode_decimal(&dec("12.34")), vec![0xC1, 13, 35]);
        assert_eq!(encode_decimal(&dec("0.05")), vec![0xC0, 6]);
        assert_eq!(encode_decimal(&dec("-1")), vec![0x3E, 100, 102]);
    }

    #[test]
    fn test_trailing_zeros_ignored() {
        assert_eq!(encode_decimal(&dec("12.340")), encode_decimal(&dec("12.34")));
        assert_eq!(encode_decimal(&dec("100")), vec![0xC2, 2]);
    }

    #[test]
    fn test_ordering() {
        let values = [
            "-123456.789",
            "-100",
            "-12.3401",
            "-12.34",
            "-0.0005",
            "0",
            "0.0005",
            "0.05",
            "0.5",
            "1",
            "12.34",
            "12.3401",
            "99.99",
            "100",
            "79228162514264337593543950335",
        ];
        for pair in values.windows(2) {
            let a = encode_decimal(&dec(pair[0]));
            let b = encode_decimal(&dec(pair[1]));
            assert!(a < b, "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_roundtrip() {
        for s in [
            "0",
            "1",
            "-1",
            "123.45",
            "-0.000000000000000000000000001",
            "0.0000000000000000000000000005",
            "79228162514264337593543950335",
            "-79228162514264337593543950335",
        ] {
            let v = dec(s);
            assert_eq!(decode_decimal(&encode_decimal(&v)).unwrap(), v, "{s}");
        }
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(decode_decimal(&[]).is_err());
        assert!(decode_decimal(&[0x3E, 100]).is_err());
        assert!(decode_decimal(&[0xC1, 0]).is_err());
        assert!(decode_decimal(&[0x80, 1]).is_err());
    }
}
