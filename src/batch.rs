//! Many series, one independent stream each.
//!
//! Series never share state, so with the `parallel` feature they are spread
//! over rayon's thread pool, each worker owning its own buffer.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::decoder::SeriesDecoder;
use crate::encoder::{CompressedSeries, Sample};
use crate::error::{DecodeError, EncodeError};

/// Compresses each series into its own [`CompressedSeries`], preserving order.
/// An empty series yields an empty block.
pub fn encode_batch<S>(series: &[S]) -> Result<Vec<CompressedSeries>, EncodeError>
where
    S: AsRef<[Sample]> + Sync,
{
    #[cfg(feature = "parallel")]
    let blocks = series
        .par_iter()
        .map(|s| CompressedSeries::encode(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let blocks = series
        .iter()
        .map(|s| CompressedSeries::encode(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        series = blocks.len(),
        total_bits = blocks.iter().map(|b| b.total_bits).sum::<usize>(),
        "batch encoded"
    );
    Ok(blocks)
}

/// Decodes every block of a batch, preserving order.
pub fn decode_batch(blocks: &[CompressedSeries]) -> Result<Vec<Vec<Sample>>, DecodeError> {
    #[cfg(feature = "parallel")]
    {
        blocks.par_iter().map(SeriesDecoder::decode).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        blocks.iter().map(SeriesDecoder::decode).collect()
    }
}
