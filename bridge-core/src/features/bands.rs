//! First-order low-pass band splitter.
//!
//! Splits a mono signal into low/mid/high bands by differencing two tracking
//! low-pass filters, per §4.2: `low = lpLow`, `mid = lpMid − lpLow`,
//! `high = sample − lpMid`.

/// A single-pole low-pass filter tracking its previous output.
#[derive(Debug, Clone, Copy, Default)]
struct TrackingLowPass {
    alpha: f32,
    state: f32,
}

impl TrackingLowPass {
    fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let alpha = 1.0 - (-2.0 * std::f32::consts::PI * cutoff_hz / sample_rate).exp();
        Self { alpha, state: 0.0 }
    }

    fn process(&mut self, sample: f32) -> f32 {
        self.state += self.alpha * (sample - self.state);
        self.state
    }
}

/// Splits a signal into three bands and tracks per-band RMS accumulation
/// across a frame, normalizing so `low + mid + high ≈ 1`.
pub struct BandSplitter {
    low_pass_low: TrackingLowPass,
    low_pass_mid: TrackingLowPass,
}

/// Per-frame band energies, already normalized to sum to ~1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandEnergies {
    /// Low-band normalized energy.
    pub low: f32,
    /// Mid-band normalized energy.
    pub mid: f32,
    /// High-band normalized energy.
    pub high: f32,
}

impl BandSplitter {
    /// Creates a band splitter for the given cutoffs and sample rate.
    pub fn new(band_low_hz: f32, band_mid_hz: f32, sample_rate: u32) -> Self {
        Self {
            low_pass_low: TrackingLowPass::new(band_low_hz, sample_rate as f32),
            low_pass_mid: TrackingLowPass::new(band_mid_hz, sample_rate as f32),
        }
    }

    /// Processes one frame of mono samples, returning normalized band RMS.
    pub fn process(&mut self, mono: &[f32]) -> BandEnergies {
        let mut sum_low = 0.0f64;
        let mut sum_mid = 0.0f64;
        let mut sum_high = 0.0f64;

        for &sample in mono {
            let lp_low = self.low_pass_low.process(sample);
            let lp_mid = self.low_pass_mid.process(sample);
            let low = lp_low;
            let mid = lp_mid - lp_low;
            let high = sample - lp_mid;

            sum_low += (low * low) as f64;
            sum_mid += (mid * mid) as f64;
            sum_high += (high * high) as f64;
        }

        let n = mono.len().max(1) as f64;
        let rms_low = (sum_low / n).sqrt() as f32;
        let rms_mid = (sum_mid / n).sqrt() as f32;
        let rms_high = (sum_high / n).sqrt() as f32;

        let total = (rms_low + rms_mid + rms_high).max(f32::EPSILON);
        BandEnergies {
            low: rms_low / total,
            mid: rms_mid / total,
            high: rms_high / total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_energies_sum_to_approximately_one() {
        let mut splitter = BandSplitter::new(150.0, 2_500.0, 48_000);
        let samples: Vec<f32> = (0..512)
            .map(|i| (i as f32 * 0.15).sin() * 0.5)
            .collect();
        let energies = splitter.process(&samples);
        let total = energies.low + energies.mid + energies.high;
        assert!((total - 1.0).abs() < 1e-3, "total was {total}");
    }

    #[test]
    fn silence_produces_zero_energies_without_panicking() {
        let mut splitter = BandSplitter::new(150.0, 2_500.0, 48_000);
        let energies = splitter.process(&vec![0.0; 256]);
        assert_eq!(energies.low, 0.0);
        assert_eq!(energies.mid, 0.0);
        assert_eq!(energies.high, 0.0);
    }
}
