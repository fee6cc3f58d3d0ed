use thiserror::Error;

/// Error returned when a write would exceed the buffer's byte limit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("write would exceed bit buffer byte limit")]
pub struct BufferFull;

/// Errors raised while encoding a sample.
///
/// Range errors are detected before any bit of the sample is written, so the
/// stream stays consistent and the caller may keep using the encoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The output stream hit its byte limit.
    #[error(transparent)]
    BufferFull(#[from] BufferFull),

    /// The first timestamp is negative or above `u32::MAX`.
    #[error("first timestamp {0} does not fit the 32-bit header field")]
    TimestampOutOfRange(i64),

    /// The second timestamp is before the first or more than `u32::MAX` after it.
    #[error("first delta {0} does not fit the 32-bit unsigned delta field")]
    DeltaOutOfRange(i64),

    /// The delta-of-delta falls outside the widest bucket.
    #[error("delta-of-delta does not fit the 32-bit bucket (ts={ts}, prev1={prev1}, prev2={prev2})")]
    DeltaOfDeltaOutOfRange { ts: i64, prev1: i64, prev2: i64 },
}

/// Errors raised while decoding a compressed stream. All of them are fatal for
/// the series being decoded: once misaligned the stream cannot resynchronize.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended in the middle of a sample.
    #[error("unexpected end of compressed stream")]
    UnexpectedEnd,

    /// A value header describes a window that does not fit in 64 bits.
    #[error("invalid value window: leading={leading}, middle={middle}")]
    InvalidWindow { leading: u8, middle: u8 },

    /// A value reuses the previous window but none was established yet.
    #[error("window reuse requested before any window was established")]
    MissingWindow,
}
