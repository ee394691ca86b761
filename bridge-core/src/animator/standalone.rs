//! Standalone per-fixture animator manager (C8): runs independently of the
//! reactive engine, sending directly over the existing transports rather
//! than through the rate/delta-gated scheduler (C4).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DispatchError;
use crate::events::{AnimatorEvent, EventEmitter, NoopEventEmitter};
use crate::runtime::{Clock, SystemClock};

use super::scenes::advance;
use super::state::{AnimatorMode, AnimatorState};

/// One tick's worth of output for a fixture, ready for the UDP/hub transport.
#[derive(Debug, Clone, PartialEq)]
pub struct StandaloneFrame {
    /// The fixture this frame targets.
    pub fixture_id: String,
    /// Whether the fixture should be lit.
    pub on: bool,
    /// Derived brightness, 0-254.
    pub bri: f32,
    /// Derived hue, 0-65535.
    pub hue: f32,
    /// Derived saturation, 0-254.
    pub sat: f32,
    /// Transition time reported to the transport, in milliseconds.
    pub transition_ms: u32,
}

impl StandaloneFrame {
    fn from_state(fixture_id: &str, state: &AnimatorState) -> Self {
        Self {
            fixture_id: fixture_id.to_string(),
            on: state.on,
            bri: state.bri,
            hue: state.hue,
            sat: state.sat,
            transition_ms: state.transition_ms,
        }
    }
}

/// Sparse per-field override for `applyState(id, patch)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimatorPatch {
    /// Overrides `on`.
    pub on: Option<bool>,
    /// Overrides `mode`.
    pub mode: Option<AnimatorMode>,
    /// Overrides `scene`.
    pub scene: Option<super::state::AnimatorScene>,
    /// Overrides `bri` directly (bypassing motion for this tick).
    pub bri: Option<f32>,
    /// Overrides `hue` directly.
    pub hue: Option<f32>,
    /// Overrides `sat` directly.
    pub sat: Option<f32>,
    /// Overrides `is_static`.
    pub is_static: Option<bool>,
    /// Overrides `update_on_rave_stop`.
    pub update_on_rave_stop: Option<bool>,
}

impl AnimatorPatch {
    fn apply_to(self, state: &mut AnimatorState) {
        if let Some(on) = self.on {
            state.on = on;
        }
        if let Some(mode) = self.mode {
            state.mode = mode;
        }
        if let Some(scene) = self.scene {
            state.scene = scene;
        }
        if let Some(bri) = self.bri {
            state.bri = bri;
        }
        if let Some(hue) = self.hue {
            state.hue = hue;
        }
        if let Some(sat) = self.sat {
            state.sat = sat;
        }
        if let Some(is_static) = self.is_static {
            state.is_static = is_static;
        }
        if let Some(update_on_rave_stop) = self.update_on_rave_stop {
            state.update_on_rave_stop = update_on_rave_stop;
        }
    }
}

/// Owns per-fixture animator state for every custom-enabled fixture.
pub struct StandaloneAnimator {
    states: Mutex<HashMap<String, AnimatorState>>,
    emitter: Arc<dyn EventEmitter>,
    clock: Arc<dyn Clock>,
}

impl StandaloneAnimator {
    /// Builds an empty manager with no fixtures registered yet.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock_and_emitter(Arc::new(SystemClock), Arc::new(NoopEventEmitter))
    }

    /// Builds a manager with explicit clock/emitter dependencies.
    #[must_use]
    pub fn with_clock_and_emitter(clock: Arc<dyn Clock>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            emitter,
            clock,
        }
    }

    /// Registers or replaces a fixture's animator state.
    pub fn upsert(&self, fixture_id: impl Into<String>, state: AnimatorState) {
        self.states.lock().insert(fixture_id.into(), state);
    }

    /// Removes a fixture's animator state, if present.
    pub fn remove(&self, fixture_id: &str) {
        self.states.lock().remove(fixture_id);
    }

    /// Lists every managed fixture id and its current state.
    #[must_use]
    pub fn list(&self) -> Vec<(String, AnimatorState)> {
        self.states
            .lock()
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect()
    }

    /// `applyState(id, patch)`.
    pub fn apply_state(&self, fixture_id: &str, patch: AnimatorPatch) -> Result<(), DispatchError> {
        let mut states = self.states.lock();
        let state = states
            .get_mut(fixture_id)
            .ok_or_else(|| DispatchError::NoTargets(fixture_id.to_string()))?;
        patch.apply_to(state);
        Ok(())
    }

    /// `batch`: applies the same patch to every listed fixture id, skipping
    /// (rather than failing on) any id that isn't registered.
    pub fn batch(&self, fixture_ids: &[String], patch: AnimatorPatch) {
        let mut states = self.states.lock();
        for id in fixture_ids {
            if let Some(state) = states.get_mut(id) {
                patch.clone().apply_to(state);
            }
        }
    }

    /// Advances every non-static, `Scene`-mode fixture by one tick and
    /// returns a frame for every `on` fixture, regardless of mode.
    pub fn tick(&self, interval_ms: u64, energy: f32) -> Vec<StandaloneFrame> {
        let mut states = self.states.lock();
        let now = self.clock.now_millis();
        let mut frames = Vec::with_capacity(states.len());
        for (id, state) in states.iter_mut() {
            if !state.is_static && state.mode == AnimatorMode::Scene {
                let step = state.tick_step(interval_ms, energy);
                advance(state, step, energy);
                self.emitter.emit_animator(AnimatorEvent::SceneAdvanced {
                    fixture_id: id.clone(),
                    timestamp: now,
                });
            }
            if state.on {
                frames.push(StandaloneFrame::from_state(id, state));
            }
        }
        frames
    }

    /// Final push delivered on engine stop, for fixtures with
    /// `update_on_rave_stop` set.
    #[must_use]
    pub fn on_stop(&self) -> Vec<StandaloneFrame> {
        self.states
            .lock()
            .iter()
            .filter(|(_, s)| s.update_on_rave_stop)
            .map(|(id, s)| StandaloneFrame::from_state(id, s))
            .collect()
    }
}

impl Default for StandaloneAnimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_skips_static_fixtures_but_still_emits_their_frame() {
        let manager = StandaloneAnimator::new();
        let mut state = AnimatorState::default();
        state.is_static = true;
        let phase_before = state.motion_phase;
        manager.upsert("f1", state);

        let frames = manager.tick(100, 0.5);
        assert_eq!(frames.len(), 1);
        let (_, state) = &manager.list()[0];
        assert_eq!(state.motion_phase, phase_before);
    }

    #[test]
    fn apply_state_on_an_unknown_fixture_returns_no_targets() {
        let manager = StandaloneAnimator::new();
        let result = manager.apply_state("missing", AnimatorPatch::default());
        assert!(result.is_err());
    }

    #[test]
    fn on_stop_only_includes_fixtures_opted_into_final_push() {
        let manager = StandaloneAnimator::new();
        manager.upsert("f1", AnimatorState::default());
        let mut wants_push = AnimatorState::default();
        wants_push.update_on_rave_stop = true;
        manager.upsert("f2", wants_push);

        let frames = manager.on_stop();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].fixture_id, "f2");
    }
}
