//! Standalone motion-scene policies (§4.8).

use std::f32::consts::PI;

use crate::utils::pseudo_random;

use super::state::{AnimatorScene, AnimatorState};

/// Advances `state`'s motion phase and derived color by one tick, given the
/// step computed from [`AnimatorState::tick_step`] and the current audio
/// energy (`0` when the animator isn't audio-linked).
pub fn advance(state: &mut AnimatorState, step: f32, energy: f32) {
    match state.scene {
        AnimatorScene::Sweep => sweep(state, step),
        AnimatorScene::Bounce => bounce(state, step),
        AnimatorScene::Pulse => pulse(state, step),
        AnimatorScene::Spark => spark(state, step, energy),
    }
}

fn sweep(state: &mut AnimatorState, step: f32) {
    state.motion_phase = (state.motion_phase + step) % 1.0;
    apply_phase_color(state);
}

fn bounce(state: &mut AnimatorState, step: f32) {
    state.motion_phase += step * state.motion_direction;
    if state.motion_phase >= 1.0 {
        state.motion_phase = 1.0;
        state.motion_direction = -1.0;
    } else if state.motion_phase <= 0.0 {
        state.motion_phase = 0.0;
        state.motion_direction = 1.0;
    }
    apply_phase_color(state);
}

fn pulse(state: &mut AnimatorState, step: f32) {
    state.motion_phase = (state.motion_phase + step * 0.45) % 1.0;
    let floor = state.ranges.bri.min;
    let ceil = state.ranges.bri.max;
    state.bri = floor + (ceil - floor) * (0.5 + 0.5 * (2.0 * PI * state.motion_phase).sin());
    state.hue = state.ranges.hue.at(state.motion_phase);
}

fn spark(state: &mut AnimatorState, step: f32, energy: f32) {
    let jump_chance = ((0.18 + 0.65 * energy) * step * 2.4).clamp(0.0, 1.0);
    if jump_chance > pseudo_random(state.motion_phase) {
        state.motion_phase = pseudo_random(state.motion_phase + step);
        apply_phase_color(state);
    }
}

fn apply_phase_color(state: &mut AnimatorState) {
    state.hue = state.ranges.hue.at(state.motion_phase);
    state.sat = state.ranges.sat.at(state.motion_phase);
    state.bri = state.ranges.bri.at(state.motion_phase);
    state.cct_kelvin = state.ranges.cct.at(state.motion_phase);
}
