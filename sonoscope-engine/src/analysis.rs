use rustfft::{FftPlanner, num_complex::Complex};
use sonoscope_messages::{Decibels, Hertz, Series, SpectrumScale, SummaryStats};

/// Fixed device sample rate.
pub const SAMPLE_RATE: Hertz = Hertz::khz(16);
/// Samples taken from the tail of the snapshot for one FFT.
pub const SPECTRUM_WINDOW: usize = 2048;
/// Samples per waterfall intensity window.
pub const RMS_WINDOW: usize = 64;
/// Below this many samples the spectrum is not worth computing.
pub const MIN_SPECTRUM_SAMPLES: usize = 64;

/// Highest frequency retained in spectrum output (half the sample rate).
const MAX_FREQUENCY: Hertz = Hertz::khz(8);
const DB_FLOOR: f32 = -80.0;
const MAGNITUDE_FLOOR: f32 = 1e-8;

fn summary(snapshot: &[i32]) -> SummaryStats {
    if snapshot.is_empty() {
        return SummaryStats::default();
    }
    let mut min = snapshot[0] as f32;
    let mut max = min;
    let mut sum = 0.0f64;
    for &sample in snapshot {
        let value = sample as f32;
        min = min.min(value);
        max = max.max(value);
        sum += f64::from(value);
    }
    SummaryStats {
        count: snapshot.len(),
        min,
        max,
        mean: (sum / snapshot.len() as f64) as f32,
    }
}

/// Time-domain view: sample index against amplitude, subsampled so the
/// output never exceeds `max_points`. Subsampling takes every stride-th
/// sample rather than averaging, preserving temporal order.
pub fn waveform(snapshot: &[i32], max_points: usize) -> Series {
    if snapshot.is_empty() || max_points == 0 {
        return Series::empty();
    }

    let stride = if snapshot.len() > max_points {
        snapshot.len().div_ceil(max_points)
    } else {
        1
    };

    let (x, y) = snapshot
        .iter()
        .enumerate()
        .step_by(stride)
        .map(|(index, &sample)| (index as f32, sample as f32))
        .unzip();

    Series {
        x,
        y,
        stats: summary(snapshot),
    }
}

/// Frequency-domain view of the most recent [`SPECTRUM_WINDOW`] samples:
/// Hann-windowed FFT magnitudes over [0, 8000] Hz, scaled per `scale`.
/// Snapshots shorter than [`MIN_SPECTRUM_SAMPLES`] yield an empty series.
pub fn spectrum(snapshot: &[i32], scale: SpectrumScale) -> Series {
    if snapshot.len() < MIN_SPECTRUM_SAMPLES {
        return Series::empty();
    }

    let n = snapshot.len().min(SPECTRUM_WINDOW);
    let tail = &snapshot[snapshot.len() - n..];

    // Symmetric Hann window to reduce spectral leakage.
    let mut bins: Vec<Complex<f32>> = tail
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32;
            let window = 0.5 - 0.5 * phase.cos();
            Complex {
                re: sample as f32 * window,
                im: 0.0,
            }
        })
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut bins);

    // Keep only the bins with non-negative frequency labels. For even n the
    // Nyquist bin is labeled negative and excluded, so every kept frequency
    // is strictly below half the sample rate.
    let kept = n.div_ceil(2);
    let bin_width = SAMPLE_RATE.as_hz() as f32 / n as f32;
    let x: Vec<f32> = (0..kept).map(|k| k as f32 * bin_width).collect();
    let mut y: Vec<f32> = bins[..kept].iter().map(|c| c.norm()).collect();
    debug_assert!(x.iter().all(|&f| f < MAX_FREQUENCY.as_hz() as f32));

    match scale {
        SpectrumScale::Linear => {
            let peak = y.iter().copied().fold(0.0f32, f32::max);
            // An all-zero window stays all-zero instead of dividing by zero.
            if peak > 0.0 {
                for value in &mut y {
                    *value /= peak;
                }
            }
        }
        SpectrumScale::Db => {
            for value in &mut y {
                let floored = value.max(MAGNITUDE_FLOOR);
                *value = Decibels::from_linear(floored).as_db().clamp(DB_FLOOR, 0.0);
            }
            // Shift the peak to 0 dB unless everything sits at the floor.
            let peak = y.iter().copied().fold(DB_FLOOR, f32::max);
            if peak > DB_FLOOR {
                for value in &mut y {
                    *value -= peak;
                }
            }
        }
    }

    Series {
        x,
        y,
        stats: summary(snapshot),
    }
}

/// Intensity view: the RMS of each consecutive [`RMS_WINDOW`]-sample window,
/// indexed by window number. A trailing partial window is dropped. Snapshots
/// shorter than one window fall back to per-sample absolute value so short
/// buffers still produce a trace.
pub fn waterfall(snapshot: &[i32]) -> Series {
    if snapshot.is_empty() {
        return Series::empty();
    }

    let (x, y) = if snapshot.len() >= RMS_WINDOW {
        snapshot
            .chunks_exact(RMS_WINDOW)
            .enumerate()
            .map(|(index, window)| {
                let mean_square = window
                    .iter()
                    .map(|&sample| {
                        let value = sample as f32;
                        value * value
                    })
                    .sum::<f32>()
                    / RMS_WINDOW as f32;
                (index as f32, mean_square.sqrt())
            })
            .unzip()
    } else {
        snapshot
            .iter()
            .enumerate()
            .map(|(index, &sample)| (index as f32, (sample as f32).abs()))
            .unzip()
    };

    Series {
        x,
        y,
        stats: summary(snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sine at `freq` Hz sampled at the device rate, amplitude 1000.
    fn sine(freq: f32, len: usize) -> Vec<i32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE.as_hz() as f32;
                (1000.0 * (2.0 * std::f32::consts::PI * freq * t).sin()) as i32
            })
            .collect()
    }

    #[test]
    fn test_empty_snapshot_yields_empty_series() {
        assert!(waveform(&[], 100).is_empty());
        assert!(spectrum(&[], SpectrumScale::Linear).is_empty());
        assert!(waterfall(&[]).is_empty());
    }

    #[test]
    fn test_waveform_passthrough_when_small() {
        let series = waveform(&[5, -3, 8], 10);
        assert_eq!(series.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(series.y, vec![5.0, -3.0, 8.0]);
    }

    #[test]
    fn test_waveform_never_exceeds_max_points() {
        for len in [999, 1000, 1001, 1999, 2000, 4321] {
            let snapshot: Vec<i32> = (0..len).collect();
            let series = waveform(&snapshot, 1000);
            assert!(
                series.len() <= 1000,
                "len {len} produced {} points",
                series.len()
            );
        }
    }

    #[test]
    fn test_waveform_x_axis_strictly_increasing() {
        let snapshot: Vec<i32> = (0..1999).collect();
        let series = waveform(&snapshot, 1000);
        assert!(series.x.windows(2).all(|pair| pair[0] < pair[1]));
        // Subsampled y values are original samples at the x indices.
        for (&x, &y) in series.x.iter().zip(&series.y) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_waveform_zero_max_points_is_empty() {
        assert!(waveform(&[1, 2, 3], 0).is_empty());
    }

    #[test]
    fn test_spectrum_below_threshold_is_empty() {
        let snapshot = vec![100; MIN_SPECTRUM_SAMPLES - 1];
        assert!(spectrum(&snapshot, SpectrumScale::Linear).is_empty());
    }

    #[test]
    fn test_spectrum_frequencies_within_audio_band() {
        for len in [64, 100, 2048, 3000] {
            let series = spectrum(&sine(440.0, len), SpectrumScale::Linear);
            assert!(!series.is_empty());
            assert!(
                series.x.iter().all(|&f| (0.0..8000.0).contains(&f)),
                "len {len} produced an out-of-band frequency"
            );
        }
    }

    #[test]
    fn test_spectrum_peak_near_sine_frequency() {
        let series = spectrum(&sine(440.0, SPECTRUM_WINDOW), SpectrumScale::Linear);
        let (peak_freq, _) = series
            .x
            .iter()
            .zip(&series.y)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        // Bin width is 16000/2048 = 7.8 Hz.
        assert!(
            (peak_freq - 440.0).abs() < 20.0,
            "peak at {peak_freq} Hz, expected near 440 Hz"
        );
    }

    #[test]
    fn test_spectrum_linear_normalized_to_unit_peak() {
        let series = spectrum(&sine(440.0, SPECTRUM_WINDOW), SpectrumScale::Linear);
        let peak = series.y.iter().copied().fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(series.y.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_spectrum_db_peak_at_zero() {
        let series = spectrum(&sine(440.0, SPECTRUM_WINDOW), SpectrumScale::Db);
        let peak = series.y.iter().copied().fold(f32::MIN, f32::max);
        assert!((peak - 0.0).abs() < 1e-6);
        assert!(series.y.iter().all(|&v| (-80.0..=0.0).contains(&v)));
    }

    #[test]
    fn test_spectrum_of_silence_has_no_nan_or_inf() {
        let zeros = vec![0; SPECTRUM_WINDOW];

        let linear = spectrum(&zeros, SpectrumScale::Linear);
        assert!(linear.y.iter().all(|v| v.is_finite()));
        assert!(linear.y.iter().all(|&v| v == 0.0));

        let db = spectrum(&zeros, SpectrumScale::Db);
        assert!(db.y.iter().all(|v| v.is_finite()));
        // Silence sits at the floor, unshifted.
        assert!(db.y.iter().all(|&v| v == -80.0));
    }

    #[test]
    fn test_waterfall_partitions_complete_windows() {
        // Exact multiple keeps the final window.
        assert_eq!(waterfall(&vec![1; RMS_WINDOW * 2]).len(), 2);
        // Trailing remainder is dropped, not padded.
        assert_eq!(waterfall(&vec![1; RMS_WINDOW * 2 + 63]).len(), 2);
        assert_eq!(waterfall(&vec![1; RMS_WINDOW]).len(), 1);
    }

    #[test]
    fn test_waterfall_rms_of_constant_signal() {
        let series = waterfall(&vec![-100; RMS_WINDOW]);
        assert_eq!(series.len(), 1);
        assert!((series.y[0] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_waterfall_short_buffer_uses_absolute_value() {
        let series = waterfall(&[-5, 3, -1]);
        assert_eq!(series.y, vec![5.0, 3.0, 1.0]);
        assert_eq!(series.x, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_waterfall_never_negative() {
        let snapshot: Vec<i32> = (0..500).map(|i| if i % 2 == 0 { -1000 } else { 999 }).collect();
        let series = waterfall(&snapshot);
        assert!(series.y.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_summary_stats_cover_whole_snapshot() {
        let series = waveform(&[2, -4, 6], 2);
        assert_eq!(series.stats.count, 3);
        assert_eq!(series.stats.min, -4.0);
        assert_eq!(series.stats.max, 6.0);
        assert!((series.stats.mean - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_zero_snapshot_yields_zero_traces() {
        let zeros = vec![0; 256];
        assert!(waveform(&zeros, 100).y.iter().all(|&v| v == 0.0));
        assert!(waterfall(&zeros).y.iter().all(|&v| v == 0.0));
    }
}
