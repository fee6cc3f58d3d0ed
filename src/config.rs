#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Buffer settings for a [`SeriesEncoder`](crate::SeriesEncoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncoderConfig {
    /// Bytes pre-allocated for the output stream.
    pub initial_capacity: usize,
    /// Hard cap on the output size in bytes (`None` = unlimited).
    pub max_bytes: Option<usize>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 128,
            max_bytes: None,
        }
    }
}

impl EncoderConfig {
    /// Creates the default configuration: 128 bytes pre-allocated, no limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of bytes pre-allocated for the output stream.
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Caps the output stream at `bytes` bytes.
    pub fn max_bytes(mut self, bytes: usize) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    /// Capacity hint for a series of `samples` points: raw first sample plus
    /// roughly two bytes per following sample.
    pub fn for_samples(samples: usize) -> Self {
        Self::default().initial_capacity(12 + samples.saturating_sub(1) * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let cfg = EncoderConfig::new().initial_capacity(64).max_bytes(1024);
        assert_eq!(cfg.initial_capacity, 64);
        assert_eq!(cfg.max_bytes, Some(1024));
        assert_eq!(EncoderConfig::default().max_bytes, None);
    }

    #[test]
    fn test_for_samples() {
        assert_eq!(EncoderConfig::for_samples(0).initial_capacity, 12);
        assert_eq!(EncoderConfig::for_samples(101).initial_capacity, 212);
    }
}
