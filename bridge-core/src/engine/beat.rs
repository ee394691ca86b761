//! Lightweight beat/drop estimator driven by spectral flux and transient energy.

/// Minimum milliseconds between accepted beats (≈272 BPM ceiling).
const MIN_BEAT_INTERVAL_MS: u64 = 220;

/// Outcome of one detector tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeatOutcome {
    /// Whether a beat was detected this tick.
    pub beat: bool,
    /// Whether a "drop" (sustained high-energy transient) was detected.
    pub drop: bool,
    /// Estimated tempo, once at least two beats have been observed.
    pub bpm_estimate: Option<f32>,
}

/// Tracks a running estimate of flux variance to set an adaptive beat
/// threshold, plus a slow energy EMA to detect sustained drops.
pub struct BeatDetector {
    flux_ema: f32,
    flux_var_ema: f32,
    last_beat_at_ms: Option<u64>,
    last_interval_ms: Option<u64>,
    drop_energy_ema: f32,
    force_drop_pending: bool,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatDetector {
    /// Creates a detector with no history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flux_ema: 0.0,
            flux_var_ema: 0.0,
            last_beat_at_ms: None,
            last_interval_ms: None,
            drop_energy_ema: 0.0,
            force_drop_pending: false,
        }
    }

    /// Advances the detector by one feature tick.
    pub fn tick(&mut self, flux: f32, transient: f32, now_ms: u64) -> BeatOutcome {
        let deviation = flux - self.flux_ema;
        self.flux_ema += deviation * 0.2;
        self.flux_var_ema += (deviation * deviation - self.flux_var_ema) * 0.1;
        self.drop_energy_ema += (transient - self.drop_energy_ema) * 0.08;

        let threshold = self.flux_ema + 1.5 * self.flux_var_ema.sqrt();
        let elapsed_ok = self
            .last_beat_at_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= MIN_BEAT_INTERVAL_MS);
        let mut beat = flux > threshold.max(0.05) && elapsed_ok;

        let mut bpm_estimate = None;
        if beat {
            if let Some(last) = self.last_beat_at_ms {
                let interval = now_ms.saturating_sub(last);
                if interval > 0 {
                    self.last_interval_ms = Some(interval);
                    bpm_estimate = Some(60_000.0 / interval as f32);
                }
            }
            self.last_beat_at_ms = Some(now_ms);
        }

        let drop = self.drop_energy_ema > 0.72 && transient > 0.82;

        if self.force_drop_pending {
            self.force_drop_pending = false;
            beat = true;
            return BeatOutcome { beat, drop: true, bpm_estimate };
        }

        BeatOutcome { beat, drop, bpm_estimate }
    }

    /// Requests a single forced high-intensity outcome on the next tick,
    /// regardless of the rate gate — the engine's `forceDrop` API.
    pub fn force_drop(&mut self) {
        self.force_drop_pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sustained_flux_spike_registers_a_beat() {
        let mut detector = BeatDetector::new();
        for ms in (0..2000).step_by(50) {
            detector.tick(0.05, 0.1, ms);
        }
        let outcome = detector.tick(0.9, 0.1, 2050);
        assert!(outcome.beat);
    }

    #[test]
    fn beats_are_rate_limited_within_the_minimum_interval() {
        let mut detector = BeatDetector::new();
        for ms in (0..2000).step_by(50) {
            detector.tick(0.05, 0.1, ms);
        }
        let first = detector.tick(0.9, 0.1, 2050);
        assert!(first.beat);
        let second = detector.tick(0.9, 0.1, 2060);
        assert!(!second.beat, "beat within MIN_BEAT_INTERVAL_MS should be suppressed");
    }

    #[test]
    fn force_drop_overrides_the_next_tick_regardless_of_flux() {
        let mut detector = BeatDetector::new();
        detector.force_drop();
        let outcome = detector.tick(0.0, 0.0, 0);
        assert!(outcome.beat);
        assert!(outcome.drop);
    }

    #[test]
    fn sustained_high_transient_energy_is_flagged_as_a_drop() {
        let mut detector = BeatDetector::new();
        let mut last = BeatOutcome::default();
        for ms in (0..3000).step_by(20) {
            last = detector.tick(0.1, 0.95, ms);
        }
        assert!(last.drop);
    }
}
