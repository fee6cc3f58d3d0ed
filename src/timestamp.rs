//! Delta-of-delta timestamp codec.
//!
//! The first timestamp of a series is written raw in 32 bits, the second as a
//! raw 32-bit unsigned delta. From the third on, the delta-of-delta goes into
//! the first bucket that can hold it:
//!
//! | dd                 | prefix | payload           | total   |
//! |--------------------|--------|-------------------|---------|
//! | 0                  | `0`    | -                 | 1 bit   |
//! | [-63, 64]          | `10`   | 7-bit dd + 63     | 9 bits  |
//! | [-255, 256]        | `110`  | 9-bit dd + 255    | 12 bits |
//! | [-2047, 2048]      | `1110` | 12-bit dd + 2047  | 16 bits |
//! | [-(2^31-1), 2^31]  | `1111` | 32-bit dd + 2^31-1| 36 bits |

use crate::bitbuffer::{BitRead, BitWrite};
use crate::error::{DecodeError, EncodeError};

/// Width of the raw first timestamp and of the raw first delta.
pub const RAW_FIELD_BITS: u8 = 32;

/// One row of the delta-of-delta bucket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DodBucket {
    /// Control bits that select the bucket.
    pub prefix: u64,
    /// Width of `prefix`.
    pub prefix_bits: u8,
    /// Width of the offset-encoded dd that follows the prefix.
    pub payload_bits: u8,
    /// Added to dd before writing; the largest negative dd maps to 0.
    pub offset: i64,
    /// Smallest dd the bucket holds.
    pub min: i64,
    /// Largest dd the bucket holds.
    pub max: i64,
}

impl DodBucket {
    /// Returns `true` if `dd` lies in `[min, max]`.
    #[inline]
    pub fn contains(&self, dd: i64) -> bool {
        dd >= self.min && dd <= self.max
    }

    /// Prefix plus payload width.
    #[inline]
    pub fn total_bits(&self) -> u8 {
        self.prefix_bits + self.payload_bits
    }

    /// Returns the most restrictive bucket that holds `dd`.
    pub fn for_dod(dd: i64) -> Option<&'static DodBucket> {
        DOD_BUCKETS.iter().find(|b| b.contains(dd))
    }
}

/// Buckets ordered from most to least restrictive. Ranges are asymmetric:
/// one more positive value fits than negative.
pub static DOD_BUCKETS: [DodBucket; 5] = [
    DodBucket { prefix: 0b0, prefix_bits: 1, payload_bits: 0, offset: 0, min: 0, max: 0 },
    DodBucket { prefix: 0b10, prefix_bits: 2, payload_bits: 7, offset: 63, min: -63, max: 64 },
    DodBucket { prefix: 0b110, prefix_bits: 3, payload_bits: 9, offset: 255, min: -255, max: 256 },
    DodBucket { prefix: 0b1110, prefix_bits: 4, payload_bits: 12, offset: 2047, min: -2047, max: 2048 },
    DodBucket {
        prefix: 0b1111,
        prefix_bits: 4,
        payload_bits: 32,
        offset: (1 << 31) - 1,
        min: -((1 << 31) - 1),
        max: 1 << 31,
    },
];

/// A timestamp's bit image before it is written: `width` low bits of `bits`,
/// prefix and payload combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampEncoding {
    /// Prefix and payload, right-aligned.
    pub bits: u64,
    /// Number of bits to write.
    pub width: u8,
}

impl TimestampEncoding {
    /// Computes the encoding of `ts` given the two previous timestamps of the
    /// series. Nothing is written, so out-of-range input leaves any stream intact.
    pub fn compute(ts: i64, prev1: Option<i64>, prev2: Option<i64>) -> Result<Self, EncodeError> {
        let (prev1, prev2) = match (prev1, prev2) {
            (None, _) => {
                let raw = u32::try_from(ts).map_err(|_| EncodeError::TimestampOutOfRange(ts))?;
                return Ok(Self { bits: raw as u64, width: RAW_FIELD_BITS });
            }
            (Some(prev1), None) => {
                let delta = ts.wrapping_sub(prev1);
                let raw = ts
                    .checked_sub(prev1)
                    .and_then(|d| u32::try_from(d).ok())
                    .ok_or(EncodeError::DeltaOutOfRange(delta))?;
                return Ok(Self { bits: raw as u64, width: RAW_FIELD_BITS });
            }
            (Some(prev1), Some(prev2)) => (prev1, prev2),
        };

        let out_of_range = EncodeError::DeltaOfDeltaOutOfRange { ts, prev1, prev2 };
        let dd = delta_of_delta(ts, prev1, prev2).ok_or_else(|| out_of_range.clone())?;
        let bucket = DodBucket::for_dod(dd).ok_or(out_of_range)?;
        let payload = (dd + bucket.offset) as u64;
        Ok(Self {
            bits: (bucket.prefix << bucket.payload_bits) | payload,
            width: bucket.total_bits(),
        })
    }
}

fn delta_of_delta(ts: i64, prev1: i64, prev2: i64) -> Option<i64> {
    let dt = ts.checked_sub(prev1)?;
    let prev_dt = prev1.checked_sub(prev2)?;
    dt.checked_sub(prev_dt)
}

/// Encodes `ts` into `out`. Returns the number of bits written.
pub fn encode_timestamp<W: BitWrite + ?Sized>(
    out: &mut W,
    ts: i64,
    prev1: Option<i64>,
    prev2: Option<i64>,
) -> Result<u32, EncodeError> {
    let enc = TimestampEncoding::compute(ts, prev1, prev2)?;
    out.write_bits(enc.bits, enc.width)?;
    Ok(enc.width as u32)
}

/// Decodes one timestamp written by [`encode_timestamp`] with the same
/// `prev1` / `prev2`.
pub fn decode_timestamp<R: BitRead + ?Sized>(
    input: &mut R,
    prev1: Option<i64>,
    prev2: Option<i64>,
) -> Result<i64, DecodeError> {
    let (prev1, prev2) = match (prev1, prev2) {
        (None, _) => return read_raw(input),
        (Some(prev1), None) => return Ok(prev1.wrapping_add(read_raw(input)?)),
        (Some(prev1), Some(prev2)) => (prev1, prev2),
    };

    let mut bucket = &DOD_BUCKETS[DOD_BUCKETS.len() - 1];
    for candidate in &DOD_BUCKETS[..DOD_BUCKETS.len() - 1] {
        if !input.read_bit().ok_or(DecodeError::UnexpectedEnd)? {
            bucket = candidate;
            break;
        }
    }
    let payload = input
        .read_bits(bucket.payload_bits)
        .ok_or(DecodeError::UnexpectedEnd)?;
    let dd = payload as i64 - bucket.offset;

    let prev_dt = prev1.wrapping_sub(prev2);
    Ok(prev1.wrapping_add(prev_dt).wrapping_add(dd))
}

fn read_raw<R: BitRead + ?Sized>(input: &mut R) -> Result<i64, DecodeError> {
    input
        .read_bits(RAW_FIELD_BITS)
        .map(|v| v as i64)
        .ok_or(DecodeError::UnexpectedEnd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitbuffer::{BitBuffer, BitReader};

    const T0: i64 = 1_700_000_000_000;

    fn encoded_width(dd: i64) -> u8 {
        let prev2 = 1_000_000;
        let prev1 = prev2 + 60;
        TimestampEncoding::compute(prev1 + 60 + dd, Some(prev1), Some(prev2))
            .unwrap()
            .width
    }

    fn roundtrip(ts: i64, prev1: Option<i64>, prev2: Option<i64>) -> i64 {
        let mut buf = BitBuffer::new();
        let bits = encode_timestamp(&mut buf, ts, prev1, prev2).unwrap();
        assert_eq!(bits as usize, buf.len_bits());
        let mut reader = BitReader::new(&buf);
        let decoded = decode_timestamp(&mut reader, prev1, prev2).unwrap();
        assert!(reader.is_exhausted());
        decoded
    }

    #[test]
    fn test_constant_interval_is_single_zero_bit() {
        let enc = TimestampEncoding::compute(T0, Some(T0 - 60), Some(T0 - 120)).unwrap();
        assert_eq!(enc, TimestampEncoding { bits: 0, width: 1 });
    }

    #[test]
    fn test_constant_interval_roundtrip() {
        let ts = [T0 - 10_000, T0 - 5_000, T0];
        assert_eq!(roundtrip(ts[2], Some(ts[1]), Some(ts[0])), T0);
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(encoded_width(0), 1);
        assert_eq!(encoded_width(1), 9);
        assert_eq!(encoded_width(64), 9);
        assert_eq!(encoded_width(65), 12);
        assert_eq!(encoded_width(-63), 9);
        assert_eq!(encoded_width(-64), 12);
        assert_eq!(encoded_width(256), 12);
        assert_eq!(encoded_width(257), 16);
        assert_eq!(encoded_width(-255), 12);
        assert_eq!(encoded_width(-256), 16);
        assert_eq!(encoded_width(2048), 16);
        assert_eq!(encoded_width(2049), 36);
        assert_eq!(encoded_width(-2047), 16);
        assert_eq!(encoded_width(-2048), 36);
    }

    #[test]
    fn test_bucket_payload_layout() {
        let prev2 = 0;
        let prev1 = 100;
        // dd = -63 -> prefix 10, payload 0
        let enc = TimestampEncoding::compute(137, Some(prev1), Some(prev2)).unwrap();
        assert_eq!(enc, TimestampEncoding { bits: 0b10 << 7, width: 9 });
        // dd = 2048 -> prefix 1110, payload 4095
        let enc = TimestampEncoding::compute(2248, Some(prev1), Some(prev2)).unwrap();
        assert_eq!(enc, TimestampEncoding { bits: (0b1110 << 12) | 4095, width: 16 });
    }

    #[test]
    fn test_every_bucket_roundtrips() {
        let prev2 = 1_000_000;
        let prev1 = 1_000_060;
        for dd in [
            0,
            1,
            -1,
            64,
            -63,
            65,
            -64,
            256,
            -255,
            2048,
            -2047,
            2049,
            -2048,
            1 << 31,
            -((1 << 31) - 1),
        ] {
            let ts = prev1 + 60 + dd;
            assert_eq!(roundtrip(ts, Some(prev1), Some(prev2)), ts, "dd={dd}");
        }
    }

    #[test]
    fn test_first_and_second_are_raw() {
        let enc = TimestampEncoding::compute(1_609_459_200, None, None).unwrap();
        assert_eq!(enc, TimestampEncoding { bits: 1_609_459_200, width: 32 });
        assert_eq!(roundtrip(1_609_459_200, None, None), 1_609_459_200);

        let enc = TimestampEncoding::compute(1_609_459_260, Some(1_609_459_200), None).unwrap();
        assert_eq!(enc, TimestampEncoding { bits: 60, width: 32 });
        assert_eq!(
            roundtrip(1_609_459_260, Some(1_609_459_200), None),
            1_609_459_260
        );
    }

    #[test]
    fn test_raw_field_limits() {
        assert_eq!(roundtrip(u32::MAX as i64, None, None), u32::MAX as i64);
        assert_eq!(
            TimestampEncoding::compute(u32::MAX as i64 + 1, None, None),
            Err(EncodeError::TimestampOutOfRange(u32::MAX as i64 + 1))
        );
        assert_eq!(
            TimestampEncoding::compute(-1, None, None),
            Err(EncodeError::TimestampOutOfRange(-1))
        );
        assert_eq!(
            TimestampEncoding::compute(90, Some(100), None),
            Err(EncodeError::DeltaOutOfRange(-10))
        );
    }

    #[test]
    fn test_dod_overflow_is_rejected_before_writing() {
        let mut buf = BitBuffer::new();
        let err = encode_timestamp(&mut buf, (1 << 32) + 200, Some(200), Some(100)).unwrap_err();
        assert!(matches!(err, EncodeError::DeltaOfDeltaOutOfRange { .. }));
        assert!(buf.is_empty());

        let err = TimestampEncoding::compute(i64::MAX, Some(i64::MIN), Some(0)).unwrap_err();
        assert!(matches!(err, EncodeError::DeltaOfDeltaOutOfRange { .. }));
    }

    #[test]
    fn test_non_monotonic_still_roundtrips() {
        assert_eq!(roundtrip(150, Some(200), Some(100)), 150);
        assert_eq!(roundtrip(50, Some(200), Some(100)), 50);
    }

    #[test]
    fn test_truncated_stream() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b110, 3).unwrap();
        buf.write_bits(0, 4).unwrap();
        let mut reader = BitReader::new(&buf);
        assert_eq!(
            decode_timestamp(&mut reader, Some(100), Some(40)),
            Err(DecodeError::UnexpectedEnd)
        );

        let empty = BitBuffer::new();
        let mut reader = BitReader::new(&empty);
        assert_eq!(
            decode_timestamp(&mut reader, None, None),
            Err(DecodeError::UnexpectedEnd)
        );
    }
}
