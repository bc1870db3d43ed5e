/// Frequency in Hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hertz(pub u32);

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

impl Hertz {
    pub const fn khz(khz: u32) -> Self {
        Self(khz * 1_000)
    }

    pub const fn as_hz(self) -> u32 {
        self.0
    }
}

/// Amplitude in Decibels (dB).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Decibels(pub f32);

impl std::fmt::Display for Decibels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} dB", self.0)
    }
}

impl Decibels {
    /// Convert linear amplitude to decibels.
    /// For voltage/amplitude: dB = 20 * log10(linear)
    pub fn from_linear(linear: f32) -> Self {
        Self(20.0 * linear.log10())
    }

    pub const fn as_db(self) -> f32 {
        self.0
    }
}
