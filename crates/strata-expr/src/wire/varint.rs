//! LEB128 variable-length integers.

use bytes::{Buf, BufMut};
use strata_common::{StrataError, StrataResult};

/// Longest encoding of a u64.
const MAX_VARINT_LEN: usize = 10;

/// Writes `value` as an unsigned LEB128 varint.
pub fn put_uvarint<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Reads an unsigned LEB128 varint.
pub fn get_uvarint<B: Buf>(buf: &mut B) -> StrataResult<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(StrataError::serialization("varint truncated"));
        }
        let byte = buf.get_u8();
        let shift = 7 * i as u32;
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(StrataError::serialization("varint overflows u64"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(StrataError::serialization("varint overflows u64"))
}

/// Writes `value` zigzag-encoded.
pub fn put_svarint<B: BufMut>(buf: &mut B, value: i64) {
    put_uvarint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

/// Reads a zigzag-encoded varint.
pub fn get_svarint<B: Buf>(buf: &mut B) -> StrataResult<i64> {
    let raw = get_uvarint(buf)?;
    Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
}

/// Reads a uvarint that must fit a `usize`.
pub fn get_len<B: Buf>(buf: &mut B) -> StrataResult<usize> {
    let raw = get_uvarint(buf)?;
    usize::try_from(raw).map_err(|_| StrataError::serialization(format!("length {raw} too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use proptest::prelude::*;

    #[test]
    fn test_known_encodings() {
        let mut buf = BytesMut::new();
        put_uvarint(&mut buf, 300);
        assert_eq!(&buf[..], &[0xAC, 0x02]);

        let mut buf = BytesMut::new();
        put_svarint(&mut buf, -1);
        assert_eq!(&buf[..], &[0x01]);
    }

    #[test]
    fn test_truncated() {
        let mut input: &[u8] = &[0x80, 0x80];
        assert!(get_uvarint(&mut input).is_err());
        let mut input: &[u8] = &[0xFF; 11];
        assert!(get_uvarint(&mut input).is_err());
    }

    proptest! {
        #[test]
        fn prop_svarint(v in any::<i64>()) {
            let mut buf = BytesMut::new();
            put_svarint(&mut buf, v);
            let mut input = &buf[..];
            prop_assert_eq!(get_svarint(&mut input).unwrap(), v);
            prop_assert!(input.is_empty());
        }

        #[test]
        fn prop_uvarint(v in any::<u64>()) {
            let mut buf = BytesMut::new();
            put_uvarint(&mut buf, v);
            prop_assert!(buf.len() <= MAX_VARINT_LEN);
            let mut input = &buf[..];
            prop_assert_eq!(get_uvarint(&mut input).unwrap(), v);
        }
    }
}
