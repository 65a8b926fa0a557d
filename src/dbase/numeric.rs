//! Sign-bit-flagged integer and double codec.
//!
//! Long (`I`), autoincrement (`+`) and double (`O`) fields store a
//! big-endian magnitude and carry the sign in bit 7 of the first byte. The
//! convention is inverted relative to two's complement: the bit is **set**
//! for non-negative values and **clear** for negative values.
//!
//! ```text
//!   +5  =>  80 00 00 05
//!   -5  =>  00 00 00 05
//! ```

use crate::dbase::constants::{ENCODED_SIGN_BIT, SIZE_ENCODED_DOUBLE, SIZE_ENCODED_INT};
use crate::DbfError;

fn check_width(data: &[u8], expected: usize) -> Result<(), DbfError> {
    if data.len() != expected {
        return Err(DbfError::InvalidNumericWidth {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Split off the sign bit: returns (non_negative, magnitude bytes).
fn strip_sign<const N: usize>(data: &[u8]) -> (bool, [u8; N]) {
    let mut buf = [0u8; N];
    buf.copy_from_slice(data);
    let non_negative = buf[0] & ENCODED_SIGN_BIT != 0;
    buf[0] &= !ENCODED_SIGN_BIT;
    (non_negative, buf)
}

/// Decode a 4-byte sign-bit-flagged integer.
///
/// # Examples
///
/// ```
/// use dbf::dbase::numeric::decode_i32;
///
/// assert_eq!(decode_i32(&[0x80, 0x00, 0x00, 0x05]).unwrap(), 5);
/// assert_eq!(decode_i32(&[0x00, 0x00, 0x00, 0x05]).unwrap(), -5);
/// assert!(decode_i32(&[0x80, 0x00]).is_err());
/// ```
pub fn decode_i32(data: &[u8]) -> Result<i32, DbfError> {
    check_width(data, SIZE_ENCODED_INT)?;
    let (non_negative, magnitude) = strip_sign::<SIZE_ENCODED_INT>(data);
    let value = i32::from_be_bytes(magnitude);
    Ok(if non_negative { value } else { -value })
}

/// Decode an 8-byte sign-bit-flagged double.
pub fn decode_f64(data: &[u8]) -> Result<f64, DbfError> {
    check_width(data, SIZE_ENCODED_DOUBLE)?;
    let (non_negative, magnitude) = strip_sign::<SIZE_ENCODED_DOUBLE>(data);
    let value = f64::from_be_bytes(magnitude);
    Ok(if non_negative { value } else { -value })
}

/// Encode an integer in the sign-bit-flagged layout.
///
/// `i32::MIN` has no magnitude representation and encodes as zero with the
/// sign bit clear.
pub fn encode_i32(value: i32) -> [u8; SIZE_ENCODED_INT] {
    let magnitude = value.checked_abs().unwrap_or(0);
    let mut buf = magnitude.to_be_bytes();
    if value >= 0 {
        buf[0] |= ENCODED_SIGN_BIT;
    }
    buf
}

/// Encode a double in the sign-bit-flagged layout.
pub fn encode_f64(value: f64) -> [u8; SIZE_ENCODED_DOUBLE] {
    let mut buf = value.abs().to_be_bytes();
    if value.is_sign_positive() {
        buf[0] |= ENCODED_SIGN_BIT;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_bit_inversion() {
        assert_eq!(decode_i32(&[0x80, 0, 0, 5]).unwrap(), 5);
        assert_eq!(decode_i32(&[0x00, 0, 0, 5]).unwrap(), -5);
        assert_eq!(encode_i32(5), [0x80, 0, 0, 5]);
        assert_eq!(encode_i32(-5), [0x00, 0, 0, 5]);
    }

    #[test]
    fn test_zero_encodings() {
        assert_eq!(decode_i32(&[0x80, 0, 0, 0]).unwrap(), 0);
        assert_eq!(decode_i32(&[0, 0, 0, 0]).unwrap(), 0);
        assert_eq!(encode_i32(0), [0x80, 0, 0, 0]);
    }

    #[test]
    fn test_int_round_trip_across_range() {
        let samples = [
            1,
            -1,
            127,
            -128,
            255,
            256,
            65_535,
            -65_536,
            1_000_000,
            -1_000_000,
            i32::MAX,
            -i32::MAX,
            i32::MIN + 1,
        ];
        for &v in &samples {
            assert_eq!(decode_i32(&encode_i32(v)).unwrap(), v, "value {}", v);
        }
        let mut v: i64 = i32::MIN as i64 + 1;
        while v <= i32::MAX as i64 {
            let x = v as i32;
            assert_eq!(decode_i32(&encode_i32(x)).unwrap(), x);
            v += 104_729 * 97;
        }
    }

    #[test]
    fn test_double_sign_inversion() {
        let pos = encode_f64(2.5);
        assert_eq!(pos[0] & 0x80, 0x80);
        assert_eq!(decode_f64(&pos).unwrap(), 2.5);

        let neg = encode_f64(-2.5);
        assert_eq!(neg[0] & 0x80, 0);
        assert_eq!(decode_f64(&neg).unwrap(), -2.5);

        // Same magnitude, sign bit flipped
        let mut flipped = pos;
        flipped[0] &= 0x7F;
        assert_eq!(flipped, neg);
    }

    #[test]
    fn test_double_round_trip() {
        for &v in &[0.0, 1.0, -1.0, 3.14159, -271.828, 1e300, -1e-300, f64::MAX] {
            assert_eq!(decode_f64(&encode_f64(v)).unwrap(), v);
        }
        assert_eq!(decode_f64(&encode_f64(f64::INFINITY)).unwrap(), f64::INFINITY);
        assert_eq!(
            decode_f64(&encode_f64(f64::NEG_INFINITY)).unwrap(),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_invalid_widths() {
        assert!(matches!(
            decode_i32(&[0x80, 0, 0]),
            Err(DbfError::InvalidNumericWidth {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            decode_i32(&[0x80, 0, 0, 0, 0]),
            Err(DbfError::InvalidNumericWidth { .. })
        ));
        assert!(matches!(
            decode_f64(&[0u8; 4]),
            Err(DbfError::InvalidNumericWidth {
                expected: 8,
                actual: 4
            })
        ));
    }
}
