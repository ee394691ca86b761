//! UDP-family scheduler state: raw `(r, g, b, dim)` pulse bytes.

use super::state::{DeltaState, SchedulerOptions};

/// A UDP fixture's committed pulse, as fired fire-and-forget over the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UdpPulseState {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Dimmer channel.
    pub dim: u8,
}

const DELTA_RGB: f32 = 4.0;
const DELTA_DIM: f32 = 1.0;

impl DeltaState for UdpPulseState {
    fn within_limits(&self, other: &Self, scale: f32) -> bool {
        let rgb_limit = DELTA_RGB * scale;
        let dim_limit = DELTA_DIM * scale;

        let dr = (i16::from(self.r) - i16::from(other.r)).unsigned_abs() as f32;
        let dg = (i16::from(self.g) - i16::from(other.g)).unsigned_abs() as f32;
        let db = (i16::from(self.b) - i16::from(other.b)).unsigned_abs() as f32;
        let dd = (i16::from(self.dim) - i16::from(other.dim)).unsigned_abs() as f32;

        dr <= rgb_limit && dg <= rgb_limit && db <= rgb_limit && dd <= dim_limit
    }

    fn default_options() -> SchedulerOptions {
        SchedulerOptions {
            min_interval_ms: 90,
            max_silence_ms: 700,
            force_delta: false,
            delta_scale: 1.0,
            trigger_boost: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_rgb_changes_are_within_limits() {
        let a = UdpPulseState { r: 100, g: 100, b: 100, dim: 200 };
        let b = UdpPulseState { r: 102, g: 99, b: 101, dim: 200 };
        assert!(a.within_limits(&b, 1.0));
    }

    #[test]
    fn large_dim_jump_exceeds_limits() {
        let a = UdpPulseState { r: 100, g: 100, b: 100, dim: 200 };
        let b = UdpPulseState { r: 100, g: 100, b: 100, dim: 50 };
        assert!(!a.within_limits(&b, 1.0));
    }
}
