//! XOR value block codec.
//!
//! Stream layout per value after the first:
//!
//! | case                           | bits                                               |
//! |--------------------------------|----------------------------------------------------|
//! | identical to previous          | `0`                                                |
//! | changed bits inside the window | `10` + meaningful bits (old window width)          |
//! | new window                     | `11` + 6-bit leading + 6-bit middle + middle bits  |
//!
//! A middle of 64 is written as `0` in its 6-bit field; a new window always
//! carries at least one meaningful bit, so the value is unambiguous.

use tracing::trace;

use crate::bitbuffer::{BitRead, BitWrite};
use crate::delta::{bitmask, XorDelta};
use crate::error::{BufferFull, DecodeError};

/// Width of the leading-zero field of a new window.
pub const LEADING_FIELD_BITS: u8 = 6;
/// Width of the meaningful-length field of a new window.
pub const MIDDLE_FIELD_BITS: u8 = 6;

/// The bit window of the previously emitted XOR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueWindow {
    /// Zero bits above the window.
    pub leading: u8,
    /// Zero bits below the window.
    pub trailing: u8,
}

impl ValueWindow {
    /// The whole 64-bit span. Every non-zero XOR fits inside it.
    pub const FULL: ValueWindow = ValueWindow {
        leading: 0,
        trailing: 0,
    };

    /// Creates a window from its leading and trailing zero counts.
    pub fn new(leading: u8, trailing: u8) -> Self {
        Self { leading, trailing }
    }

    /// Number of meaningful bits carried when this window is reused.
    #[inline]
    pub fn width(&self) -> u8 {
        64u8.saturating_sub(self.leading.saturating_add(self.trailing))
    }

    #[inline]
    fn contains(&self, delta: &XorDelta) -> bool {
        delta.leading >= self.leading && delta.trailing >= self.trailing
    }
}

/// Writes the first value of a series as its raw 64-bit pattern.
pub fn encode_first_value<W: BitWrite + ?Sized>(out: &mut W, value: f64) -> Result<u32, BufferFull> {
    out.write_bits(value.to_bits(), 64)?;
    Ok(64)
}

/// Reads the raw 64-bit first value of a series.
pub fn decode_first_value<R: BitRead + ?Sized>(input: &mut R) -> Result<f64, DecodeError> {
    let bits = input.read_bits(64).ok_or(DecodeError::UnexpectedEnd)?;
    Ok(f64::from_bits(bits))
}

/// Encodes `value` against `prev_value` and the previous window.
///
/// `window` is `None` until a window has been established; the first changed
/// value of a series then always opens a new one. Returns the number of bits
/// written and the window to use for the next value.
pub fn encode_value<W: BitWrite + ?Sized>(
    out: &mut W,
    value: f64,
    prev_value: f64,
    window: Option<ValueWindow>,
) -> Result<(u32, Option<ValueWindow>), BufferFull> {
    let delta = XorDelta::from_bits(prev_value.to_bits(), value.to_bits());
    if delta.is_zero() {
        out.write_bit(false)?;
        return Ok((1, window));
    }
    out.write_bit(true)?;

    if let Some(w) = window.filter(|w| w.contains(&delta)) {
        out.write_bit(false)?;
        let width = w.width();
        out.write_bits((delta.xor >> w.trailing) & bitmask(width), width)?;
        return Ok((2 + width as u32, window));
    }

    out.write_bit(true)?;
    out.write_bits(delta.leading as u64, LEADING_FIELD_BITS)?;
    // 64 wraps to 0 in the 6-bit field.
    out.write_bits(delta.middle as u64, MIDDLE_FIELD_BITS)?;
    out.write_bits(delta.meaningful, delta.middle)?;

    let next = ValueWindow::new(delta.leading, delta.trailing);
    trace!(leading = next.leading, trailing = next.trailing, "new value window");
    Ok((
        2 + (LEADING_FIELD_BITS + MIDDLE_FIELD_BITS) as u32 + delta.middle as u32,
        Some(next),
    ))
}

/// Decodes one value written by [`encode_value`] with the same `prev_value`
/// and `window`.
pub fn decode_value<R: BitRead + ?Sized>(
    input: &mut R,
    prev_value: f64,
    window: Option<ValueWindow>,
) -> Result<(f64, Option<ValueWindow>), DecodeError> {
    let prev_bits = prev_value.to_bits();
    if !input.read_bit().ok_or(DecodeError::UnexpectedEnd)? {
        return Ok((prev_value, window));
    }

    let new_window = input.read_bit().ok_or(DecodeError::UnexpectedEnd)?;
    if !new_window {
        let w = window.ok_or(DecodeError::MissingWindow)?;
        let width = w.width();
        if width == 0 {
            return Err(DecodeError::InvalidWindow {
                leading: w.leading,
                middle: 0,
            });
        }
        let meaningful = input.read_bits(width).ok_or(DecodeError::UnexpectedEnd)?;
        let bits = prev_bits ^ (meaningful << w.trailing);
        return Ok((f64::from_bits(bits), window));
    }

    let leading = input
        .read_bits(LEADING_FIELD_BITS)
        .ok_or(DecodeError::UnexpectedEnd)? as u8;
    let middle = match input
        .read_bits(MIDDLE_FIELD_BITS)
        .ok_or(DecodeError::UnexpectedEnd)? as u8
    {
        0 => 64,
        m => m,
    };
    if leading + middle > 64 {
        return Err(DecodeError::InvalidWindow { leading, middle });
    }
    let trailing = 64 - leading - middle;
    let meaningful = input.read_bits(middle).ok_or(DecodeError::UnexpectedEnd)?;
    let bits = prev_bits ^ (meaningful << trailing);
    Ok((f64::from_bits(bits), Some(ValueWindow::new(leading, trailing))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbuffer::{BitBuffer, BitReader};

    fn roundtrip(value: f64, prev: f64, window: Option<ValueWindow>) -> (u32, f64) {
        let mut buf = BitBuffer::new();
        let (bits, enc_window) = encode_value(&mut buf, value, prev, window).unwrap();
        assert_eq!(bits as usize, buf.len_bits());

        let mut reader = BitReader::new(&buf);
        let (decoded, dec_window) = decode_value(&mut reader, prev, window).unwrap();
        assert!(reader.is_exhausted());
        assert_eq!(enc_window, dec_window);
        (bits, decoded)
    }

    #[test]
    fn test_first_value_is_raw() {
        let mut buf = BitBuffer::new();
        assert_eq!(encode_first_value(&mut buf, -12.75).unwrap(), 64);
        let mut reader = BitReader::new(&buf);
        assert_eq!(reader.read_bits(64), Some((-12.75f64).to_bits()));
    }

    #[test]
    fn test_identical_value_is_one_bit() {
        let w = Some(ValueWindow::new(17, 46));
        let mut buf = BitBuffer::new();
        let (bits, next) = encode_value(&mut buf, 42.0, 42.0, w).unwrap();
        assert_eq!(bits, 1);
        assert_eq!(next, w);
        assert_eq!(buf.as_bytes(), &[0]);
    }

    #[test]
    fn test_first_change_opens_window() {
        let mut buf = BitBuffer::new();
        let (bits, next) = encode_value(&mut buf, 101.0, 100.0, None).unwrap();
        // 11 + leading(6) + middle(6) + 1 meaningful bit
        assert_eq!(bits, 15);
        assert_eq!(next, Some(ValueWindow::new(17, 46)));

        let mut reader = BitReader::new(&buf);
        assert_eq!(reader.read_bits(2), Some(0b11));
        assert_eq!(reader.read_bits(6), Some(17));
        assert_eq!(reader.read_bits(6), Some(1));
        assert_eq!(reader.read_bits(1), Some(1));
    }

    #[test]
    fn test_reuse_is_shorter_than_new_window() {
        // Window established by 100.0 -> 106.0; stepping back fits inside it.
        let window = Some(ValueWindow::new(14, 47));
        let (reused, decoded) = roundtrip(100.0, 106.0, window);
        assert_eq!(decoded, 100.0);
        // 10 + old window width of 3 bits
        assert_eq!(reused, 5);

        let (fresh, _) = roundtrip(100.0, 106.0, None);
        assert_eq!(fresh, 17);
        assert!(reused < fresh);
    }

    #[test]
    fn test_reuse_keeps_old_window() {
        // 100 -> 101 changes a single bit inside a wider window.
        let window = Some(ValueWindow::new(14, 46));
        let mut buf = BitBuffer::new();
        let (bits, next) = encode_value(&mut buf, 101.0, 100.0, window).unwrap();
        assert_eq!(bits, 2 + 4);
        assert_eq!(next, window);
    }

    #[test]
    fn test_full_window_reuse() {
        let (bits, decoded) = roundtrip(-7.5, 3.25, Some(ValueWindow::FULL));
        assert_eq!(bits, 66);
        assert_eq!(decoded, -7.5);
    }

    #[test]
    fn test_middle_of_64_roundtrips() {
        let prev = f64::from_bits(0);
        let value = f64::from_bits(0x8000_0000_0000_0001);
        let (bits, decoded) = roundtrip(value, prev, None);
        assert_eq!(bits, 2 + 12 + 64);
        assert_eq!(decoded.to_bits(), value.to_bits());
    }

    #[test]
    fn test_leading_above_31_roundtrips() {
        // Only low mantissa bits differ: leading zeros well above 31.
        let prev = 1.0f64;
        let value = f64::from_bits(prev.to_bits() ^ 0b1011);
        let (_, decoded) = roundtrip(value, prev, None);
        assert_eq!(decoded.to_bits(), value.to_bits());

        let mut buf = BitBuffer::new();
        let (_, next) = encode_value(&mut buf, value, prev, None).unwrap();
        assert_eq!(next, Some(ValueWindow::new(60, 0)));
    }

    #[test]
    fn test_special_values() {
        let specials = [
            0.0,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::from_bits(0x7FF0_0000_0000_0001),
        ];
        for &prev in &specials {
            for &value in &specials {
                for window in [None, Some(ValueWindow::FULL), Some(ValueWindow::new(1, 40))] {
                    let (_, decoded) = roundtrip(value, prev, window);
                    assert_eq!(decoded.to_bits(), value.to_bits());
                }
            }
        }
    }

    #[test]
    fn test_reuse_without_window_is_rejected() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b10, 2).unwrap();
        buf.write_bits(0, 8).unwrap();
        let mut reader = BitReader::new(&buf);
        assert_eq!(
            decode_value(&mut reader, 1.0, None),
            Err(DecodeError::MissingWindow)
        );
    }

    #[test]
    fn test_oversized_window_header_is_rejected() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b11, 2).unwrap();
        buf.write_bits(40, 6).unwrap();
        buf.write_bits(30, 6).unwrap();
        buf.write_bits(0, 30).unwrap();
        let mut reader = BitReader::new(&buf);
        assert_eq!(
            decode_value(&mut reader, 1.0, None),
            Err(DecodeError::InvalidWindow {
                leading: 40,
                middle: 30
            })
        );
    }

    #[test]
    fn test_truncated_payload() {
        let mut buf = BitBuffer::new();
        encode_value(&mut buf, 106.0, 100.0, None).unwrap();
        let mut reader = BitReader::from_raw(buf.as_bytes(), buf.len_bits() - 1);
        assert_eq!(
            decode_value(&mut reader, 100.0, None),
            Err(DecodeError::UnexpectedEnd)
        );
    }
}
