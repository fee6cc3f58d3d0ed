use crate::value::ValueWindow;

/// Running state of one series, shared in shape by the encoder and decoder.
///
/// Both sides roll it forward identically after every sample, which is what
/// keeps the stream decodable without any per-sample framing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesState {
    /// Most recent timestamp.
    pub prev_ts1: Option<i64>,
    /// Timestamp before `prev_ts1`.
    pub prev_ts2: Option<i64>,
    /// Previous value, `None` before the first sample.
    pub prev_value: Option<f64>,
    /// Window of the last emitted XOR block, `None` until one is established.
    pub window: Option<ValueWindow>,
}

impl SeriesState {
    /// Creates the state of a series with no samples yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample that has just been encoded or decoded.
    #[inline]
    pub fn roll(&mut self, timestamp: i64, value: f64, window: Option<ValueWindow>) {
        self.prev_ts2 = self.prev_ts1;
        self.prev_ts1 = Some(timestamp);
        self.prev_value = Some(value);
        self.window = window;
    }
}
