//! LEB128 variable-length unsigned integers.
//!
//! Seven payload bits per byte, least significant group first; the high bit
//! of every byte but the last is set. Used for string/binary length prefixes,
//! object key lengths and the column `count`/`capacity` header.
//!
//! | Value range          | Bytes |
//! |----------------------|-------|
//! | 0 - 127              | 1     |
//! | 128 - 16383          | 2     |
//! | 16384 - 2097151      | 3     |
//! | ...                  | ...   |
//! | 2^63 - u64::MAX      | 10    |

use crate::error::{CarbonError, Result};

/// Upper bound on the encoded width of a `u64`.
pub const MAX_VARUINT_LEN: usize = 10;

/// Encoded width of `value` without encoding it.
#[inline]
pub fn varuint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Encode `value` into `buf`, returning the number of bytes written.
///
/// `buf` must hold at least [`varuint_len`]`(value)` bytes.
#[inline]
pub fn encode_varuint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | 0x80;
        i += 1;
    }
}

/// Encode into a fresh fixed buffer. Returns the buffer and the used length.
#[inline]
pub fn encode_varuint_array(value: u64) -> ([u8; MAX_VARUINT_LEN], usize) {
    let mut buf = [0u8; MAX_VARUINT_LEN];
    let n = encode_varuint(value, &mut buf);
    (buf, n)
}

/// Decode a varuint from the front of `buf`. Returns `(value, bytes_read)`.
pub fn decode_varuint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate().take(MAX_VARUINT_LEN) {
        let group = (byte & 0x7F) as u64;
        if i == MAX_VARUINT_LEN - 1 && group > 1 {
            return Err(CarbonError::Corrupted("varuint overflows u64".into()));
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if buf.len() < MAX_VARUINT_LEN {
        Err(CarbonError::ReadOutOfBounds(format!(
            "truncated varuint ({} bytes available)",
            buf.len()
        )))
    } else {
        Err(CarbonError::Corrupted("varuint longer than 10 bytes".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn varuint_len_boundaries() {
        assert_eq!(varuint_len(0), 1);
        assert_eq!(varuint_len(127), 1);
        assert_eq!(varuint_len(128), 2);
        assert_eq!(varuint_len(16383), 2);
        assert_eq!(varuint_len(16384), 3);
        assert_eq!(varuint_len(u64::MAX), 10);
    }

    #[test]
    fn encode_varuint_two_byte() {
        let (buf, n) = encode_varuint_array(300);
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[0xAC, 0x02]);
    }

    #[test]
    fn decode_varuint_ignores_trailing_bytes() {
        let (value, n) = decode_varuint(&[0x05, 0xFF, 0xFF]).unwrap();
        assert_eq!(value, 5);
        assert_eq!(n, 1);
    }

    #[test]
    fn decode_varuint_truncated() {
        let err = decode_varuint(&[0x80, 0x80]).unwrap_err();
        assert!(matches!(err, CarbonError::ReadOutOfBounds(_)));
        assert!(decode_varuint(&[]).is_err());
    }

    #[test]
    fn decode_varuint_overflow() {
        let buf = [0xFF; 10];
        assert!(matches!(decode_varuint(&buf), Err(CarbonError::Corrupted(_))));
    }

    proptest! {
        #[test]
        fn prop_varuint_roundtrip(value in any::<u64>()) {
            let (buf, n) = encode_varuint_array(value);
            prop_assert_eq!(n, varuint_len(value));
            prop_assert_eq!(decode_varuint(&buf[..n]).unwrap(), (value, n));
        }
    }
}
