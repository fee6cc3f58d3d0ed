#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitbuffer::BitBuffer;
use crate::config::EncoderConfig;
use crate::error::EncodeError;
use crate::state::SeriesState;
use crate::timestamp::encode_timestamp;
use crate::value::{encode_first_value, encode_value, ValueWindow};

/// Size of one uncompressed sample: an i64 timestamp and an f64 value.
pub const RAW_SAMPLE_BYTES: usize = 16;

/// A single time-series sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Integer timestamp, in whatever unit the caller chose.
    pub timestamp: i64,
    /// Sample value, preserved bit for bit.
    pub value: f64,
}

impl Sample {
    /// Creates a new `Sample`.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl From<(i64, f64)> for Sample {
    fn from((timestamp, value): (i64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

/// Compresses one series into a single bit stream.
///
/// Each sample costs a delta-of-delta timestamp followed by an XOR value
/// block; the first sample is stored as a raw 32-bit timestamp and a raw
/// 64-bit value.
///
/// # Example
/// ```
/// use tsxor::{Sample, SeriesEncoder};
///
/// let mut encoder = SeriesEncoder::new();
/// encoder.encode(Sample::new(1609459200, 12.0)).unwrap();
/// encoder.encode(Sample::new(1609459260, 12.5)).unwrap();
/// encoder.encode(Sample::new(1609459320, 13.0)).unwrap();
///
/// let compressed = encoder.into_compressed();
/// assert_eq!(compressed.count, 3);
/// ```
#[derive(Debug, Clone)]
pub struct SeriesEncoder {
    buf: BitBuffer,
    state: SeriesState,
    count: u64,
}

impl SeriesEncoder {
    /// Creates a new encoder with no size limit.
    pub fn new() -> Self {
        Self::with_config(&EncoderConfig::default())
    }

    /// Creates an encoder whose output will not grow beyond `max_bytes`
    /// bytes. Once the limit is reached, `encode()` returns
    /// `Err(EncodeError::BufferFull)`.
    pub fn with_limit(max_bytes: usize) -> Self {
        Self::with_config(&EncoderConfig::default().max_bytes(max_bytes))
    }

    /// Creates an encoder with the buffer settings of `config`.
    pub fn with_config(config: &EncoderConfig) -> Self {
        let mut buf = BitBuffer::with_capacity(config.initial_capacity);
        buf.set_limit(config.max_bytes);
        Self {
            buf,
            state: SeriesState::new(),
            count: 0,
        }
    }

    /// Appends a sample and returns the number of bits it took.
    ///
    /// Samples are expected in increasing timestamp order; other orders still
    /// round-trip as long as the deltas fit their fields, only less compactly.
    ///
    /// A rejected sample leaves no bits behind: range errors are caught before
    /// writing, and on `BufferFull` the partial sample is truncated away, so
    /// the stream always ends on a sample boundary.
    pub fn encode(&mut self, sample: Sample) -> Result<u32, EncodeError> {
        let mark = self.buf.len_bits();
        match self.write_sample(sample) {
            Ok((bits, window)) => {
                self.state.roll(sample.timestamp, sample.value, window);
                self.count += 1;
                Ok(bits)
            }
            Err(e) => {
                self.buf.truncate(mark);
                debug!(timestamp = sample.timestamp, count = self.count, error = %e, "sample rejected");
                Err(e)
            }
        }
    }

    fn write_sample(&mut self, sample: Sample) -> Result<(u32, Option<ValueWindow>), EncodeError> {
        let ts_bits = encode_timestamp(
            &mut self.buf,
            sample.timestamp,
            self.state.prev_ts1,
            self.state.prev_ts2,
        )?;
        let (value_bits, window) = match self.state.prev_value {
            None => (encode_first_value(&mut self.buf, sample.value)?, None),
            Some(prev) => encode_value(&mut self.buf, sample.value, prev, self.state.window)?,
        };
        Ok((ts_bits + value_bits, window))
    }

    /// Encodes every sample of `samples` in order, stopping at the first error.
    pub fn encode_all<I>(&mut self, samples: I) -> Result<(), EncodeError>
    where
        I: IntoIterator<Item = Sample>,
    {
        for sample in samples {
            self.encode(sample)?;
        }
        Ok(())
    }

    /// Returns a reference to the underlying `BitBuffer`.
    pub fn buffer(&self) -> &BitBuffer {
        &self.buf
    }

    /// Returns the running series state.
    pub fn state(&self) -> &SeriesState {
        &self.state
    }

    /// Returns the number of samples encoded so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Consumes the encoder and returns the underlying `BitBuffer`.
    pub fn into_buffer(self) -> BitBuffer {
        self.buf
    }

    /// Consumes the encoder and returns the compressed series.
    pub fn into_compressed(self) -> CompressedSeries {
        let total_bits = self.buf.len_bits();
        debug!(count = self.count, total_bits, "series encoded");
        CompressedSeries {
            total_bits,
            bytes: self.buf.into_bytes(),
            count: self.count,
        }
    }
}

impl Default for SeriesEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// One compressed series. `count` and `total_bits` are the framing a
/// container needs to store alongside `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressedSeries {
    pub bytes: Vec<u8>,
    /// Number of valid bits in `bytes`.
    pub total_bits: usize,
    /// Number of samples in this series.
    pub count: u64,
}

impl CompressedSeries {
    /// Compresses a whole series in one call.
    pub fn encode(samples: &[Sample]) -> Result<Self, EncodeError> {
        let mut encoder = SeriesEncoder::with_config(&EncoderConfig::for_samples(samples.len()));
        encoder.encode_all(samples.iter().copied())?;
        Ok(encoder.into_compressed())
    }

    /// Returns `true` if the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Average compressed size of a sample, in bits.
    pub fn bits_per_sample(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_bits as f64 / self.count as f64
    }

    /// Uncompressed size over compressed size.
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes.is_empty() {
            return 0.0;
        }
        (self.count as usize * RAW_SAMPLE_BYTES) as f64 / self.bytes.len() as f64
    }
}
