//! Feature extractor (C2): turns raw audio frames into feature snapshots.

use crate::audio::AudioFrame;
use crate::config::AudioConfig;

use super::bands::BandSplitter;
use super::envelope::{soft_limit, EnvelopeBank};
use super::snapshot::FeatureSnapshot;

/// Minimum RMS floor used by the absolute-quiet gate.
const MIN_NOISE_FLOOR: f32 = 0.0045;
/// Multiplier applied to the configured noise floor for the quiet gate.
const QUIET_GATE_FLOOR_MULT: f32 = 8.0;
/// Multiplier applied to the quiet gate for the peak comparison.
const QUIET_GATE_PEAK_MULT: f32 = 3.0;

/// Single-threaded cooperative feature extractor.
///
/// Consumes one [`AudioFrame`] per call and produces one [`FeatureSnapshot`].
/// Bounded work per frame; no allocations in the steady state besides the
/// mono-downmix buffer, which is reused across calls.
pub struct FeatureExtractor {
    config: AudioConfig,
    bands: BandSplitter,
    envelopes: EnvelopeBank,
    prev_bands: (f32, f32, f32),
    loudness_ema: f32,
    adaptive_floor: f32,
    adaptive_ceil: f32,
    auto_gain: f32,
    mono_scratch: Vec<f32>,
    prev_zero_crossing_sign: bool,
}

impl FeatureExtractor {
    /// Creates an extractor for the given audio configuration.
    #[must_use]
    pub fn new(config: AudioConfig) -> Self {
        let bands = BandSplitter::new(config.band_low_hz, config.band_mid_hz, config.sample_rate);
        Self {
            config,
            bands,
            envelopes: EnvelopeBank::new(),
            prev_bands: (0.0, 0.0, 0.0),
            loudness_ema: 0.0,
            adaptive_floor: 0.0,
            adaptive_ceil: MIN_NOISE_FLOOR * 5.0,
            auto_gain: 1.0,
            mono_scratch: Vec::new(),
            prev_zero_crossing_sign: false,
        }
    }

    /// Processes one frame and returns its feature snapshot.
    pub fn process(&mut self, frame: &AudioFrame) -> FeatureSnapshot {
        self.downmix(frame);
        let mono = std::mem::take(&mut self.mono_scratch);

        let rms = rms_of(&mono);
        let peak = mono.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        let zcr = self.zero_crossing_rate(&mono);

        let gate = (self.config.noise_floor * QUIET_GATE_FLOOR_MULT).max(MIN_NOISE_FLOOR);
        let is_quiet = rms < gate && peak < QUIET_GATE_PEAK_MULT * gate;

        let bands = if is_quiet {
            Default::default()
        } else {
            self.bands.process(&mono)
        };

        let flux = if is_quiet {
            0.0
        } else {
            let (pl, pm, ph) = self.prev_bands;
            ((bands.low - pl).max(0.0) + (bands.mid - pm).max(0.0) + (bands.high - ph).max(0.0))
                .clamp(0.0, 1.0)
        };
        self.prev_bands = (bands.low, bands.mid, bands.high);

        self.update_adaptive_floor_ceil(rms, peak, is_quiet);

        let normalized = ((rms - 1.12 * self.adaptive_floor) / (self.adaptive_ceil + f32::EPSILON))
            .clamp(0.0, 1.0);

        let transient = if is_quiet {
            self.envelopes.decay_all(0.85);
            0.0
        } else {
            self.envelopes.tick(normalized)
        };

        self.update_auto_gain(rms);

        let fast = self.envelopes.fast.value();
        let mid = self.envelopes.mid.value();
        let slow = self.envelopes.slow.value();
        let peak_hold = fast.max(peak);

        let combined =
            peak_hold * 2.25 + transient * 1.55 + mid * 1.35 + slow * 1.1 + transient.min(1.0) * 0.35;
        let gained = combined * self.config.output_gain * self.auto_gain;
        let level = soft_limit(gained, 0.82, 0.28).clamp(0.0, 1.0);

        self.mono_scratch = mono;
        self.mono_scratch.clear();

        FeatureSnapshot {
            level,
            peak,
            rms,
            band_low: bands.low,
            band_mid: bands.mid,
            band_high: bands.high,
            transient,
            spectral_flux: flux,
            zcr,
            auto_gain: self.auto_gain,
            adaptive_floor: self.adaptive_floor,
            adaptive_ceil: self.adaptive_ceil,
            bpm_estimate: None,
            beat_confidence: None,
        }
    }

    fn downmix(&mut self, frame: &AudioFrame) {
        self.mono_scratch.clear();
        let channels = frame.channels.max(1) as usize;
        self.mono_scratch
            .extend(frame.samples.chunks_exact(channels).map(|chunk| {
                chunk.iter().sum::<f32>() / channels as f32
            }));
    }

    fn zero_crossing_rate(&mut self, mono: &[f32]) -> f32 {
        if mono.is_empty() {
            return 0.0;
        }
        let mut crossings = 0u32;
        for &sample in mono {
            let sign = sample >= 0.0;
            if sign != self.prev_zero_crossing_sign {
                crossings += 1;
            }
            self.prev_zero_crossing_sign = sign;
        }
        crossings as f32 / mono.len() as f32
    }

    fn update_adaptive_floor_ceil(&mut self, rms: f32, peak: f32, is_quiet: bool) {
        self.loudness_ema += (rms - self.loudness_ema) * 0.08;

        let alpha = if rms < self.adaptive_floor { 0.12 } else { 0.02 };
        self.adaptive_floor += (rms - self.adaptive_floor) * alpha;

        let target_ceil = (rms * 2.6).max(peak * 0.9).max(self.config.noise_floor * 5.0);
        let ceil_alpha = if target_ceil > self.adaptive_ceil {
            0.2
        } else {
            0.01
        };
        self.adaptive_ceil += (target_ceil - self.adaptive_ceil) * ceil_alpha;

        if is_quiet {
            self.adaptive_floor *= 0.999;
        }
    }

    fn update_auto_gain(&mut self, _rms: f32) {
        if !self.config.auto_gain_enabled {
            self.auto_gain = 1.0;
            return;
        }
        let target = self.config.target_rms / self.loudness_ema.max(f32::EPSILON);
        let target = target.clamp(self.config.min_gain, self.config.max_gain);
        let slew = if target > self.auto_gain { 0.02 } else { 0.05 };
        self.auto_gain += (target - self.auto_gain) * slew;
    }
}

fn rms_of(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<f32>, channels: u8) -> AudioFrame {
        AudioFrame {
            samples,
            channels,
            sample_rate: 48_000,
        }
    }

    #[test]
    fn silence_produces_zero_level_and_gated_bands() {
        let mut extractor = FeatureExtractor::new(AudioConfig::default());
        let snapshot = extractor.process(&frame(vec![0.0; 1024], 2));
        assert_eq!(snapshot.rms, 0.0);
        assert_eq!(snapshot.band_low, 0.0);
        assert_eq!(snapshot.spectral_flux, 0.0);
    }

    #[test]
    fn loud_tone_eventually_produces_nonzero_level() {
        let mut extractor = FeatureExtractor::new(AudioConfig::default());
        let samples: Vec<f32> = (0..2048)
            .map(|i| (i as f32 * 0.3).sin() * 0.9)
            .collect();
        let mut last_level = 0.0;
        for chunk in samples.chunks(256) {
            let snapshot = extractor.process(&frame(chunk.to_vec(), 1));
            last_level = snapshot.level;
        }
        assert!(last_level > 0.0, "expected nonzero level after sustained loud input");
        assert!(last_level <= 1.0);
    }

    #[test]
    fn downmix_averages_stereo_channels() {
        let mut extractor = FeatureExtractor::new(AudioConfig::default());
        // L=1.0, R=-1.0 should downmix to 0 on every frame -> silence.
        let samples: Vec<f32> = std::iter::repeat([1.0, -1.0]).take(512).flatten().collect();
        let snapshot = extractor.process(&frame(samples, 2));
        assert_eq!(snapshot.rms, 0.0);
    }
}
