//! # tsxor
//!
//! Lossless compression for ordered `(timestamp, f64)` samples, built on the
//! two observations behind Facebook's Gorilla TSDB (VLDB 2015):
//!
//! - **Timestamps** tend to arrive at regular intervals. The *delta-of-delta*
//!   is usually zero and costs a single bit; small jitter lands in 9, 12 or
//!   16-bit buckets.
//!
//! - **Values** of adjacent samples are frequently close or identical. Only
//!   the XOR against the previous value is stored, and the leading/trailing
//!   zero window of the last XOR block is reused when the new one fits in it.
//!
//! Every value decodes to its exact 64-bit pattern (`-0.0`, infinities and NaN
//! payloads included) and every timestamp to its exact integer.
//!
//! ## Example
//!
//! ```rust
//! use tsxor::{Sample, SeriesDecoder, SeriesEncoder};
//!
//! let mut encoder = SeriesEncoder::new();
//! encoder.encode(Sample::new(1609459200, 12.0)).unwrap();
//! encoder.encode(Sample::new(1609459260, 12.5)).unwrap();
//! encoder.encode(Sample::new(1609459320, 13.0)).unwrap();
//!
//! let compressed = encoder.into_compressed();
//! println!("{} samples in {} bytes", compressed.count, compressed.bytes.len());
//!
//! let samples = SeriesDecoder::decode(&compressed).unwrap();
//! assert_eq!(samples[0], Sample::new(1609459200, 12.0));
//! ```
//!
//! ## Limits
//!
//! The first timestamp and the first delta are stored in 32-bit unsigned
//! fields, and the widest delta-of-delta bucket holds 32 bits. Inputs outside
//! those ranges are rejected with [`EncodeError`] before anything is written;
//! pick a coarser time unit or rebase timestamps if you hit them.
//!
//! ## Lower-level codecs
//!
//! [`delta`], [`value`] and [`timestamp`] expose the per-sample codecs over
//! the [`BitWrite`] / [`BitRead`] traits for callers that manage their own
//! bit stream and [`SeriesState`].

pub mod batch;
pub mod bitbuffer;
pub mod config;
pub mod decoder;
pub mod delta;
pub mod encoder;
pub mod error;
pub mod state;
pub mod timestamp;
pub mod value;

// Re-export primary types at the crate root.
pub use batch::{decode_batch, encode_batch};
pub use bitbuffer::{BitBuffer, BitRead, BitReader, BitWrite};
pub use config::EncoderConfig;
pub use decoder::{SeriesDecoder, SeriesIter};
pub use delta::{analyze, XorDelta};
pub use encoder::{CompressedSeries, Sample, SeriesEncoder};
pub use error::{BufferFull, DecodeError, EncodeError};
pub use state::SeriesState;
pub use timestamp::{decode_timestamp, encode_timestamp, TimestampEncoding};
pub use value::{decode_value, encode_value, ValueWindow};
