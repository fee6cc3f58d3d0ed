use tracing::debug;

use crate::bitbuffer::BitReader;
use crate::encoder::{CompressedSeries, Sample};
use crate::error::DecodeError;
use crate::state::SeriesState;
use crate::timestamp::decode_timestamp;
use crate::value::{decode_first_value, decode_value};

/// Reconstructs samples from a stream written by [`SeriesEncoder`].
///
/// # Example
/// ```
/// use tsxor::{Sample, SeriesDecoder, SeriesEncoder};
///
/// let mut encoder = SeriesEncoder::new();
/// encoder.encode(Sample::new(1609459200, 12.0)).unwrap();
/// encoder.encode(Sample::new(1609459260, 12.5)).unwrap();
///
/// let compressed = encoder.into_compressed();
/// let samples = SeriesDecoder::decode(&compressed).unwrap();
/// assert_eq!(samples.len(), 2);
/// assert_eq!(samples[0].value, 12.0);
/// ```
///
/// [`SeriesEncoder`]: crate::SeriesEncoder
pub struct SeriesDecoder;

impl SeriesDecoder {
    /// Decodes exactly `series.count` samples.
    pub fn decode(series: &CompressedSeries) -> Result<Vec<Sample>, DecodeError> {
        // Every sample takes at least one bit.
        let mut out = Vec::with_capacity((series.count as usize).min(series.total_bits));
        for sample in Self::iter(series) {
            out.push(sample?);
        }
        Ok(out)
    }

    /// Decodes samples until the stream is exhausted. The stream must end on
    /// a sample boundary; a trailing partial sample is an error.
    pub fn decode_raw(bytes: &[u8], total_bits: usize) -> Result<Vec<Sample>, DecodeError> {
        Self::iter_raw(bytes, total_bits).collect()
    }

    /// Lazily decodes `series.count` samples.
    pub fn iter(series: &CompressedSeries) -> SeriesIter<'_> {
        SeriesIter::new(
            BitReader::from_raw(&series.bytes, series.total_bits),
            Some(series.count),
        )
    }

    /// Lazily decodes samples until the stream is exhausted.
    pub fn iter_raw(bytes: &[u8], total_bits: usize) -> SeriesIter<'_> {
        SeriesIter::new(BitReader::from_raw(bytes, total_bits), None)
    }
}

/// A lazy iterator that yields `Sample`s from a compressed stream.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct SeriesIter<'a> {
    reader: BitReader<'a>,
    state: SeriesState,
    /// Samples left to read; `None` reads until the stream runs out.
    remaining: Option<u64>,
    done: bool,
}

impl<'a> SeriesIter<'a> {
    fn new(reader: BitReader<'a>, remaining: Option<u64>) -> Self {
        Self {
            reader,
            state: SeriesState::new(),
            remaining,
            done: false,
        }
    }

    fn decode_next(&mut self) -> Result<Sample, DecodeError> {
        let timestamp = decode_timestamp(&mut self.reader, self.state.prev_ts1, self.state.prev_ts2)?;
        let (value, window) = match self.state.prev_value {
            None => (decode_first_value(&mut self.reader)?, None),
            Some(prev) => decode_value(&mut self.reader, prev, self.state.window)?,
        };
        self.state.roll(timestamp, value, window);
        Ok(Sample::new(timestamp, value))
    }
}

impl Iterator for SeriesIter<'_> {
    type Item = Result<Sample, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let finished = match self.remaining {
            Some(n) => n == 0,
            None => self.reader.is_exhausted(),
        };
        if finished {
            self.done = true;
            return None;
        }

        match self.decode_next() {
            Ok(sample) => {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                Some(Ok(sample))
            }
            Err(e) => {
                debug!(position = self.reader.position(), error = %e, "series decode failed");
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match (self.done, self.remaining) {
            (true, _) => (0, Some(0)),
            (false, Some(n)) => (0, Some(n as usize)),
            (false, None) => (0, None),
        }
    }
}
