//! External control surface (§6): the methods the status/API layer calls to
//! steer the reactive engine.

use crate::events::EngineEvent;
use crate::error::ConfigError;

use super::reactive::{AudioReactivityPreset, AutoProfile, Behavior, ReactiveEngine, Tier};

impl ReactiveEngine {
    /// `setBehavior`.
    pub fn set_behavior(&self, behavior: Behavior) {
        self.with_controls(|c| c.behavior = behavior);
    }

    /// `setScene`. `None` returns the engine to auto motion-policy selection.
    pub fn set_scene(&self, scene: Option<String>) {
        let now = self.clock().now_millis();
        self.with_controls(|c| c.scene = scene.clone());
        self.emitter().emit_engine(EngineEvent::SceneChanged { scene, timestamp: now });
    }

    /// `setAutoProfile`.
    pub fn set_auto_profile(&self, profile: AutoProfile) {
        self.with_controls(|c| c.auto_profile = profile);
    }

    /// `setAudioReactivityPreset`.
    pub fn set_audio_reactivity_preset(&self, preset: AudioReactivityPreset) {
        self.with_controls(|c| c.audio_reactivity_preset = preset);
    }

    /// `setOverclock`. DEV tiers require `unsafe_ack = true`; returns
    /// `ConfigError::Invalid` otherwise, leaving the current tier in place.
    pub fn set_overclock(&self, tier: Tier, unsafe_ack: bool) -> Result<(), ConfigError> {
        if tier.requires_unsafe_ack() && !unsafe_ack {
            return Err(ConfigError::Invalid {
                field: "overclock.tier".to_string(),
                reason: "DEV overclock tiers require an explicit unsafe acknowledgement".to_string(),
            });
        }
        let now = self.clock().now_millis();
        self.with_controls(|c| c.tier = tier);
        self.emitter().emit_engine(EngineEvent::TierChanged {
            tier: tier.name(),
            source: "manual".to_string(),
            timestamp: now,
        });
        Ok(())
    }

    /// `setGenre`. Unknown genre names are accepted as-is; palette lookup
    /// falls back to "edm" at sample time rather than rejecting here.
    pub fn set_genre(&self, genre: String) {
        self.with_controls(|c| c.genre = genre);
    }

    /// `setGenreDecadeMode`.
    pub fn set_genre_decade_mode(&self, mode: String) {
        self.with_controls(|c| c.genre_decade_mode = mode);
    }

    /// `setFlowIntensity`, clamped to `[0, 1]`.
    pub fn set_flow_intensity(&self, intensity: f32) {
        self.with_controls(|c| c.flow_intensity = intensity.clamp(0.0, 1.0));
    }

    /// `setMetaAutoEnabled`. Enabling `meta_auto` takes priority over any
    /// concurrently-enabled `overclock_auto` (§9 design decision); it does
    /// not disable `overclock_auto`, it only outranks it while active.
    pub fn set_meta_auto_enabled(&self, enabled: bool) {
        let (tier, source) = self.with_controls(|c| {
            c.meta_auto_enabled = enabled;
            (c.tier, if enabled { "meta_auto" } else { "manual" })
        });
        let now = self.clock().now_millis();
        self.emitter().emit_engine(EngineEvent::TierChanged {
            tier: tier.name(),
            source: source.to_string(),
            timestamp: now,
        });
    }

    /// `setOverclockAutoEnabled`.
    pub fn set_overclock_auto_enabled(&self, enabled: bool) {
        self.with_controls(|c| c.overclock_auto_enabled = enabled);
    }

    /// `forceDrop`: requests a one-shot forced beat+drop outcome on the next tick.
    pub fn force_drop(&self) {
        self.beat_detector().lock().force_drop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_tier_without_unsafe_ack_is_rejected() {
        let engine = ReactiveEngine::new();
        let result = engine.set_overclock(Tier::dev(0).unwrap(), false);
        assert!(result.is_err());
    }

    #[test]
    fn dev_tier_with_unsafe_ack_is_accepted() {
        let engine = ReactiveEngine::new();
        let result = engine.set_overclock(Tier::dev(0).unwrap(), true);
        assert!(result.is_ok());
    }

    #[test]
    fn set_flow_intensity_clamps_out_of_range_input() {
        let engine = ReactiveEngine::new();
        engine.set_flow_intensity(4.0);
        engine.with_controls(|c| assert_eq!(c.flow_intensity, 1.0));
    }
}
