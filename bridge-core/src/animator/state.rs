//! Per-fixture standalone animator state (§4.8).

/// How the animator derives its output color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorMode {
    /// A fixed RGB value, no motion.
    Rgb,
    /// A motion scene (`sweep`/`bounce`/`pulse`/`spark`).
    Scene,
    /// Follows the reactive engine's output (opt-out of independent timing).
    Auto,
}

/// Motion scene for a standalone (non-reactive) fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorScene {
    /// Linear hue/sat/cct sweep across the configured range.
    Sweep,
    /// Phase reflects at 0 and 1, direction flips.
    Bounce,
    /// Brightness pulses with a sine envelope; hue advances slowly.
    Pulse,
    /// Probabilistic jumps to a random in-range sample.
    Spark,
}

/// How hue/brightness values are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Hue/saturation/value.
    Hsv,
    /// Correlated color temperature in Kelvin.
    Cct,
}

/// Whether the animator's speed is fixed or driven by audio energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    /// A fixed Hz regardless of audio activity.
    Fixed,
    /// Interpolates between `speed_hz_min` and `speed_hz_max` by energy.
    Audio,
}

/// An inclusive `[min, max]` range the animator samples within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl Range {
    /// Builds a range, swapping bounds if given in the wrong order.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Linearly interpolates within the range at `t ∈ [0, 1]`.
    #[must_use]
    pub fn at(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t.clamp(0.0, 1.0)
    }
}

/// Per-fixture ranges the motion scenes sample within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorRanges {
    /// Hue range, 0-65535.
    pub hue: Range,
    /// Saturation range, 0-254.
    pub sat: Range,
    /// Brightness range, 0-254.
    pub bri: Range,
    /// CCT range in Kelvin.
    pub cct: Range,
}

impl Default for AnimatorRanges {
    fn default() -> Self {
        Self {
            hue: Range::new(0.0, 65535.0),
            sat: Range::new(120.0, 254.0),
            bri: Range::new(40.0, 254.0),
            cct: Range::new(2700.0, 6500.0),
        }
    }
}

/// A standalone fixture's full animator state.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorState {
    /// Whether the fixture should currently be lit.
    pub on: bool,
    /// Output derivation mode.
    pub mode: AnimatorMode,
    /// Active motion scene, when `mode == Scene`.
    pub scene: AnimatorScene,
    /// Current brightness, 0-254.
    pub bri: f32,
    /// Current hue, 0-65535.
    pub hue: f32,
    /// Current saturation, 0-254.
    pub sat: f32,
    /// Whether hue/sat or CCT is authoritative.
    pub color_mode: ColorMode,
    /// Current CCT in Kelvin, when `color_mode == Cct`.
    pub cct_kelvin: f32,
    /// Ranges the motion scenes sample within.
    pub ranges: AnimatorRanges,
    /// Whether speed is fixed or audio-driven.
    pub speed_mode: SpeedMode,
    /// Minimum scene-advance rate in Hz.
    pub speed_hz_min: f32,
    /// Maximum scene-advance rate in Hz.
    pub speed_hz_max: f32,
    /// Current motion phase, 0-1.
    pub motion_phase: f32,
    /// Current bounce direction, +1.0 or -1.0.
    pub motion_direction: f32,
    /// When true, the animator is paused but retains its current state.
    pub is_static: bool,
    /// Whether a final push is delivered to the fixture on engine stop.
    pub update_on_rave_stop: bool,
    /// Transition time reported to the transport, in milliseconds.
    pub transition_ms: u32,
}

impl Default for AnimatorState {
    fn default() -> Self {
        Self {
            on: true,
            mode: AnimatorMode::Scene,
            scene: AnimatorScene::Sweep,
            bri: 180.0,
            hue: 0.0,
            sat: 200.0,
            color_mode: ColorMode::Hsv,
            cct_kelvin: 4000.0,
            ranges: AnimatorRanges::default(),
            speed_mode: SpeedMode::Fixed,
            speed_hz_min: 0.1,
            speed_hz_max: 0.6,
            motion_phase: 0.0,
            motion_direction: 1.0,
            is_static: false,
            update_on_rave_stop: false,
            transition_ms: 200,
        }
    }
}

impl AnimatorState {
    /// The scene-advance rate in Hz for the given audio energy (`0` if
    /// `speed_mode == Fixed`, which always uses `speed_hz_min`).
    #[must_use]
    pub fn speed_hz(&self, energy: f32) -> f32 {
        match self.speed_mode {
            SpeedMode::Fixed => self.speed_hz_min,
            SpeedMode::Audio => {
                self.speed_hz_min + (self.speed_hz_max - self.speed_hz_min) * energy.clamp(0.0, 1.0)
            }
        }
    }

    /// Per-tick phase step: `clamp(hz · intervalMs / 1000, 0.01, 0.8)`.
    #[must_use]
    pub fn tick_step(&self, interval_ms: u64, energy: f32) -> f32 {
        (self.speed_hz(energy) * interval_ms as f32 / 1000.0).clamp(0.01, 0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_speed_ignores_energy() {
        let state = AnimatorState::default();
        assert_eq!(state.speed_hz(0.0), state.speed_hz(1.0));
    }

    #[test]
    fn audio_speed_interpolates_between_min_and_max() {
        let mut state = AnimatorState::default();
        state.speed_mode = SpeedMode::Audio;
        assert_eq!(state.speed_hz(0.0), state.speed_hz_min);
        assert_eq!(state.speed_hz(1.0), state.speed_hz_max);
    }

    #[test]
    fn tick_step_is_clamped_to_the_documented_bounds() {
        let mut state = AnimatorState::default();
        state.speed_hz_min = 100.0;
        state.speed_hz_max = 100.0;
        assert_eq!(state.tick_step(1000, 0.0), 0.8);

        state.speed_hz_min = 0.0;
        state.speed_hz_max = 0.0;
        assert_eq!(state.tick_step(1000, 0.0), 0.01);
    }
}
