/// Samples decoded from a single wire frame.
pub type SampleBatch = Vec<i32>;

/// Magnitude scaling applied to spectrum output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectrumScale {
    /// Magnitudes normalized to [0, 1] by the peak bin.
    #[default]
    Linear,
    /// Magnitudes in decibels, clipped to [-80, 0] and shifted so the
    /// peak sits at 0 dB.
    Db,
}

/// Statistics over the sample snapshot a series was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// One display-ready analysis output: parallel x/y values plus the summary
/// statistics of the snapshot it was computed from.
///
/// `x` and `y` always have equal length. A series is recomputed whole each
/// analysis cycle; nothing mutates one in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub stats: SummaryStats,
}

impl Series {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of points in the series.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
