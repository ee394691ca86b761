//! Exponential envelope followers and the output soft-limiter.

/// An asymmetric exponential follower with separate attack/release coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeFollower {
    attack: f32,
    release: f32,
    value: f32,
}

impl EnvelopeFollower {
    /// Creates a follower with the given attack/release coefficients (`[0, 1]`).
    #[must_use]
    pub fn new(attack: f32, release: f32) -> Self {
        Self {
            attack,
            release,
            value: 0.0,
        }
    }

    /// Advances the follower toward `input`, using attack when rising and
    /// release when falling.
    pub fn tick(&mut self, input: f32) -> f32 {
        let coeff = if input > self.value {
            self.attack
        } else {
            self.release
        };
        self.value += coeff * (input - self.value);
        self.value
    }

    /// Current value without advancing.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Geometric decay toward zero, used by the absolute-quiet gate.
    pub fn decay(&mut self, factor: f32) {
        self.value *= factor;
    }
}

/// The three envelopes named in §4.2: fast/mid/slow, plus a transient-tracking
/// low-pass used to smooth the transient derivative.
pub struct EnvelopeBank {
    /// Fast follower (~0.68 attack / 0.24 release).
    pub fast: EnvelopeFollower,
    /// Mid follower (~0.24 attack / 0.11 release).
    pub mid: EnvelopeFollower,
    /// Slow follower (~0.055 attack / 0.038 release).
    pub slow: EnvelopeFollower,
    transient_smooth: EnvelopeFollower,
    prev_fast: f32,
}

impl Default for EnvelopeBank {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeBank {
    /// Creates a bank with the default attack/release coefficients from §4.2.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fast: EnvelopeFollower::new(0.68, 0.24),
            mid: EnvelopeFollower::new(0.24, 0.11),
            slow: EnvelopeFollower::new(0.055, 0.038),
            transient_smooth: EnvelopeFollower::new(0.5, 0.3),
            prev_fast: 0.0,
        }
    }

    /// Advances all three envelopes and returns the smoothed transient value.
    pub fn tick(&mut self, normalized: f32) -> f32 {
        let fast = self.fast.tick(normalized);
        self.mid.tick(normalized);
        self.slow.tick(normalized);

        let derivative = (fast - self.prev_fast).max(0.0) * 2.3;
        self.prev_fast = fast;
        self.transient_smooth.tick(derivative)
    }

    /// Collapses all envelopes geometrically (absolute-quiet gate).
    pub fn decay_all(&mut self, factor: f32) {
        self.fast.decay(factor);
        self.mid.decay(factor);
        self.slow.decay(factor);
        self.transient_smooth.decay(factor);
        self.prev_fast *= factor;
    }
}

/// `softLimit(x, threshold, knee) = threshold + (1 − threshold)(1 − e^{-(x−threshold)/knee})`
/// for `x > threshold`; identity below threshold.
#[must_use]
pub fn soft_limit(x: f32, threshold: f32, knee: f32) -> f32 {
    if x <= threshold {
        x
    } else {
        threshold + (1.0 - threshold) * (1.0 - (-(x - threshold) / knee).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_rises_faster_than_it_falls() {
        let mut env = EnvelopeFollower::new(0.68, 0.1);
        let after_attack = env.tick(1.0);
        let after_one_more = env.tick(1.0);
        assert!(after_attack > 0.5);
        assert!(after_one_more > after_attack);

        env.tick(0.0);
        let after_release = env.tick(0.0);
        assert!(after_release > 0.0, "release should be gradual, not instant");
    }

    #[test]
    fn soft_limit_is_identity_below_threshold() {
        assert_eq!(soft_limit(0.3, 0.8, 0.3), 0.3);
    }

    #[test]
    fn soft_limit_compresses_above_threshold_and_stays_bounded() {
        let result = soft_limit(5.0, 0.8, 0.3);
        assert!(result > 0.8);
        assert!(result < 1.0);
    }

    #[test]
    fn decay_all_shrinks_every_envelope_toward_zero() {
        let mut bank = EnvelopeBank::new();
        bank.tick(1.0);
        bank.tick(1.0);
        let before = bank.fast.value();
        bank.decay_all(0.5);
        assert!(bank.fast.value() < before);
    }
}
