//! Reactive Engine (C3): feature snapshots + external controls → `Intent` stream.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::events::{EngineEvent, EventEmitter, NoopEventEmitter};
use crate::features::FeatureSnapshot;
use crate::runtime::{Clock, SystemClock};

use super::beat::BeatDetector;
use super::intent::{HubIntentState, Intent, UdpIntentColor};
use super::palette::{palette_for_genre, Palette};
use super::scene::{policy_for_scene, MotionPolicy};

/// A monotone-ordered overclock tier: 8 standard rates plus 5 DEV rates that
/// require an explicit `unsafe` acknowledgement in the control path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    /// Standard tier, index 0-7 → `{2,4,6,8,10,12,14,16}` Hz.
    Standard(u8),
    /// DEV tier, index 0-4 → `{20,30,40,50,60}` Hz. Requires `unsafe=true`.
    Dev(u8),
}

const STANDARD_HZ: [f32; 8] = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0];
const DEV_HZ: [f32; 5] = [20.0, 30.0, 40.0, 50.0, 60.0];

impl Tier {
    /// Standard tier 0 (2 Hz) — the engine's boot default.
    pub const DEFAULT: Tier = Tier::Standard(0);

    /// Builds a standard tier from a 0-7 level, or `None` if out of range.
    #[must_use]
    pub fn standard(level: u8) -> Option<Self> {
        (usize::from(level) < STANDARD_HZ.len()).then_some(Self::Standard(level))
    }

    /// Builds a DEV tier from a 0-4 level, or `None` if out of range.
    #[must_use]
    pub fn dev(level: u8) -> Option<Self> {
        (usize::from(level) < DEV_HZ.len()).then_some(Self::Dev(level))
    }

    /// The target tick rate in Hz.
    #[must_use]
    pub fn hz(self) -> f32 {
        match self {
            Self::Standard(i) => STANDARD_HZ[usize::from(i)],
            Self::Dev(i) => DEV_HZ[usize::from(i)],
        }
    }

    /// The tick interval this tier implies, in milliseconds.
    #[must_use]
    pub fn interval_ms(self) -> u64 {
        (1000.0 / self.hz()).round() as u64
    }

    /// DEV tiers require an `unsafe=true` acknowledgement from the caller.
    #[must_use]
    pub fn requires_unsafe_ack(self) -> bool {
        matches!(self, Self::Dev(_))
    }

    /// Stable name surfaced in telemetry (`"tier-3"`, `"dev-20hz"`).
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Standard(i) => format!("tier-{i}"),
            Self::Dev(i) => format!("dev-{}hz", DEV_HZ[usize::from(i)] as u32),
        }
    }
}

/// How the engine turns feature deltas into light-state deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Direct 1:1 interpretation of features.
    Interpret,
    /// Clamps output to a narrower, calmer range.
    Clamp,
    /// `Interpret` with dampers applied under high-flux regimes.
    Auto,
}

/// Shifts envelope weighting and transition lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoProfile {
    /// Fast, punchy transitions.
    Reactive,
    /// Middle-ground default.
    Balanced,
    /// Slow, cinematic transitions.
    Cinematic,
}

/// Shifts gate thresholds and transient weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioReactivityPreset {
    /// Middle-ground default.
    Balanced,
    /// Larger transient weight, lower gate.
    Aggressive,
    /// Smaller transient weight, higher gate — fewer false triggers.
    Precision,
}

/// Mutable control-surface state, guarded by one lock (§5 "explicitly-owned
/// state objects", not a hidden singleton).
pub(super) struct Controls {
    pub behavior: Behavior,
    pub scene: Option<String>,
    pub auto_profile: AutoProfile,
    pub audio_reactivity_preset: AudioReactivityPreset,
    pub tier: Tier,
    pub genre: String,
    pub genre_decade_mode: String,
    pub flow_intensity: f32,
    pub meta_auto_enabled: bool,
    pub overclock_auto_enabled: bool,
    pub motion_phase: f32,
    pub motion_direction: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            behavior: Behavior::Auto,
            scene: None,
            auto_profile: AutoProfile::Balanced,
            audio_reactivity_preset: AudioReactivityPreset::Balanced,
            tier: Tier::DEFAULT,
            genre: "edm".to_string(),
            genre_decade_mode: "auto".to_string(),
            flow_intensity: 0.5,
            meta_auto_enabled: false,
            overclock_auto_enabled: false,
            motion_phase: 0.0,
            motion_direction: 1.0,
        }
    }
}

/// Which control is currently deciding the overclock tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverclockPriority {
    /// The operator's explicit `setOverclock` call is in effect.
    Manual,
    /// `overclock_auto`'s heuristic is in effect.
    OverclockAuto,
    /// `meta_auto`'s heuristic is in effect (wins when both are on, per
    /// the recorded design decision).
    MetaAuto,
}

/// Telemetry surfaced alongside each tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTelemetry {
    /// The tier actually in effect this tick.
    pub effective_tier: String,
    /// Which control is deciding the tier.
    pub overclock_priority: OverclockPriority,
    /// The active scene id, or `None` for auto.
    pub scene: Option<String>,
    /// The active genre.
    pub genre: String,
}

/// The reactive engine: converts feature snapshots into an `Intent` stream.
pub struct ReactiveEngine {
    controls: Mutex<Controls>,
    beat: Mutex<BeatDetector>,
    emitter: Arc<dyn EventEmitter>,
    clock: Arc<dyn Clock>,
}

impl ReactiveEngine {
    /// Builds an engine with default controls, the system clock, and a no-op emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock_and_emitter(Arc::new(SystemClock), Arc::new(NoopEventEmitter))
    }

    /// Builds an engine with explicit clock/emitter dependencies.
    #[must_use]
    pub fn with_clock_and_emitter(clock: Arc<dyn Clock>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            controls: Mutex::new(Controls::default()),
            beat: Mutex::new(BeatDetector::new()),
            emitter,
            clock,
        }
    }

    /// The tick interval implied by the effective tier (honoring the
    /// `meta_auto`/`overclock_auto` priority decision), in milliseconds.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u64 {
        let controls = self.controls.lock();
        self.effective_tier(&controls).interval_ms()
    }

    fn effective_tier(&self, controls: &Controls) -> Tier {
        if controls.meta_auto_enabled {
            self.meta_auto_tier(controls)
        } else if controls.overclock_auto_enabled {
            self.overclock_auto_tier(controls)
        } else {
            controls.tier
        }
    }

    fn overclock_priority(&self, controls: &Controls) -> OverclockPriority {
        if controls.meta_auto_enabled {
            OverclockPriority::MetaAuto
        } else if controls.overclock_auto_enabled {
            OverclockPriority::OverclockAuto
        } else {
            OverclockPriority::Manual
        }
    }

    /// `meta_auto`'s tier heuristic: tracks `flow_intensity`, since it folds
    /// in genre/scene/audio-reactivity context the plain overclock heuristic
    /// doesn't see.
    fn meta_auto_tier(&self, controls: &Controls) -> Tier {
        let level = (controls.flow_intensity * 7.0).round().clamp(0.0, 7.0) as u8;
        Tier::standard(level).unwrap_or(Tier::DEFAULT)
    }

    /// `overclock_auto`'s tier heuristic: a coarser 3-bucket mapping driven
    /// only by `auto_profile`.
    fn overclock_auto_tier(&self, controls: &Controls) -> Tier {
        match controls.auto_profile {
            AutoProfile::Cinematic => Tier::Standard(1),
            AutoProfile::Balanced => Tier::Standard(3),
            AutoProfile::Reactive => Tier::Standard(5),
        }
    }

    /// Current telemetry snapshot.
    #[must_use]
    pub fn telemetry(&self) -> EngineTelemetry {
        let controls = self.controls.lock();
        EngineTelemetry {
            effective_tier: self.effective_tier(&controls).name(),
            overclock_priority: self.overclock_priority(&controls),
            scene: controls.scene.clone(),
            genre: controls.genre.clone(),
        }
    }

    /// Processes one feature snapshot, advancing motion state and the beat
    /// detector, and returns the intents to emit this tick.
    pub fn tick(&self, snapshot: &FeatureSnapshot) -> Vec<Intent> {
        let mut controls = self.controls.lock();
        let now = self.clock.now_millis();

        let beat_outcome = self.beat.lock().tick(snapshot.spectral_flux, snapshot.transient, now);
        if beat_outcome.beat {
            self.emitter.emit_engine(EngineEvent::BeatDetected {
                bpm: beat_outcome.bpm_estimate,
                timestamp: now,
            });
        }
        if beat_outcome.drop {
            self.emitter.emit_engine(EngineEvent::DropDetected { timestamp: now });
        }

        let palette = palette_for_genre(&controls.genre);
        let policy = policy_for_scene(controls.scene.as_deref());
        let level = shape_level(snapshot.level, controls.behavior, controls.audio_reactivity_preset);

        let step = (controls.flow_intensity * self.tick_interval_ms_locked(&controls) as f32 / 1000.0)
            .clamp(0.01, 0.8);
        advance_phase(&mut controls, policy, level, step);

        let phase = controls.motion_phase;
        let (r, g, b) = palette.sample(phase);
        let (hue, sat, bri) = rgb_to_hsv_intent(r, g, b, level);

        let mut intents = vec![Intent::HubState {
            state: HubIntentState {
                hue,
                sat,
                bri,
                xy: None,
                ct: None,
                on: true,
                transition_time: auto_profile_transition_time(controls.auto_profile),
            },
            zone: None,
            rate_ms: self.tick_interval_ms_locked(&controls),
            force_delta: beat_outcome.drop,
            delta_scale: reactivity_delta_scale(controls.audio_reactivity_preset),
        }];

        intents.push(Intent::UdpPulse {
            color: UdpIntentColor {
                r,
                g,
                b,
                dimming: ((level * 90.0) as u8).max(10).min(100),
            },
            zone: None,
            rate_ms: self.tick_interval_ms_locked(&controls),
            force_delta: beat_outcome.drop,
            delta_scale: reactivity_delta_scale(controls.audio_reactivity_preset),
            beat: beat_outcome.beat,
            drop: beat_outcome.drop,
            band: dominant_band(snapshot),
        });

        intents
    }

    fn tick_interval_ms_locked(&self, controls: &Controls) -> u64 {
        self.effective_tier(controls).interval_ms()
    }

    pub(super) fn with_controls<R>(&self, f: impl FnOnce(&mut Controls) -> R) -> R {
        let mut controls = self.controls.lock();
        f(&mut controls)
    }

    pub(super) fn beat_detector(&self) -> &Mutex<BeatDetector> {
        &self.beat
    }

    pub(super) fn emitter(&self) -> &Arc<dyn EventEmitter> {
        &self.emitter
    }

    pub(super) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl Default for ReactiveEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn shape_level(level: f32, behavior: Behavior, preset: AudioReactivityPreset) -> f32 {
    let shaped = match behavior {
        Behavior::Interpret => level,
        Behavior::Clamp => level.clamp(0.0, 0.7),
        Behavior::Auto => {
            if level > 0.9 {
                0.7 + (level - 0.9) * 0.3
            } else {
                level
            }
        }
    };
    match preset {
        AudioReactivityPreset::Aggressive => (shaped * 1.2).min(1.0),
        AudioReactivityPreset::Precision => shaped * 0.85,
        AudioReactivityPreset::Balanced => shaped,
    }
}

fn reactivity_delta_scale(preset: AudioReactivityPreset) -> f32 {
    match preset {
        AudioReactivityPreset::Aggressive => 0.75,
        AudioReactivityPreset::Precision => 1.3,
        AudioReactivityPreset::Balanced => 1.0,
    }
}

fn auto_profile_transition_time(profile: AutoProfile) -> u16 {
    match profile {
        AutoProfile::Reactive => 1,
        AutoProfile::Balanced => 2,
        AutoProfile::Cinematic => 6,
    }
}

fn advance_phase(controls: &mut Controls, policy: MotionPolicy, level: f32, step: f32) {
    match policy {
        MotionPolicy::Sweep => {
            controls.motion_phase = (controls.motion_phase + step) % 1.0;
        }
        MotionPolicy::Bounce => {
            controls.motion_phase += step * controls.motion_direction;
            if controls.motion_phase >= 1.0 {
                controls.motion_phase = 1.0;
                controls.motion_direction = -1.0;
            } else if controls.motion_phase <= 0.0 {
                controls.motion_phase = 0.0;
                controls.motion_direction = 1.0;
            }
        }
        MotionPolicy::Pulse => {
            controls.motion_phase = (controls.motion_phase + step * 0.45) % 1.0;
        }
        MotionPolicy::Spark => {
            let jump_chance = (0.18 + 0.65 * level) * step * 2.4;
            if jump_chance.clamp(0.0, 1.0) > crate::utils::pseudo_random(controls.motion_phase) {
                controls.motion_phase = crate::utils::pseudo_random(controls.motion_phase + step);
            }
        }
    }
}

fn rgb_to_hsv_intent(r: u8, g: u8, b: u8, level: f32) -> (u16, u8, u8) {
    let (h, s, _v) = rgb_to_hsv(r, g, b);
    let hue = (h / 360.0 * 65535.0).round().clamp(0.0, 65535.0) as u16;
    let sat = (s * 254.0).round().clamp(0.0, 254.0) as u8;
    let bri = (level * 254.0).round().clamp(0.0, 254.0) as u8;
    (hue, sat, bri)
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };
    let sat = if max == 0.0 { 0.0 } else { delta / max };
    (hue, sat, max)
}

fn dominant_band(snapshot: &FeatureSnapshot) -> Option<&'static str> {
    if snapshot.band_low >= snapshot.band_mid && snapshot.band_low >= snapshot.band_high {
        Some("low")
    } else if snapshot.band_mid >= snapshot.band_high {
        Some("mid")
    } else {
        Some("high")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tier_hz_matches_the_documented_ladder() {
        assert_eq!(Tier::standard(0).unwrap().hz(), 2.0);
        assert_eq!(Tier::standard(7).unwrap().hz(), 16.0);
        assert!(Tier::standard(8).is_none());
    }

    #[test]
    fn dev_tiers_require_unsafe_ack() {
        let tier = Tier::dev(0).unwrap();
        assert!(tier.requires_unsafe_ack());
        assert!(!Tier::standard(0).unwrap().requires_unsafe_ack());
    }

    #[test]
    fn meta_auto_takes_priority_over_overclock_auto() {
        let engine = ReactiveEngine::new();
        engine.with_controls(|c| {
            c.meta_auto_enabled = true;
            c.overclock_auto_enabled = true;
        });
        assert_eq!(engine.telemetry().overclock_priority, OverclockPriority::MetaAuto);
    }

    #[test]
    fn tick_emits_one_hub_and_one_udp_intent() {
        let engine = ReactiveEngine::new();
        let snapshot = FeatureSnapshot {
            level: 0.5,
            peak: 0.5,
            rms: 0.3,
            band_low: 0.5,
            band_mid: 0.3,
            band_high: 0.2,
            transient: 0.1,
            spectral_flux: 0.1,
            zcr: 0.1,
            auto_gain: 1.0,
            adaptive_floor: 0.01,
            adaptive_ceil: 0.3,
            bpm_estimate: None,
            beat_confidence: None,
        };
        let intents = engine.tick(&snapshot);
        assert_eq!(intents.len(), 2);
        assert!(matches!(intents[0], Intent::HubState { .. }));
        assert!(matches!(intents[1], Intent::UdpPulse { .. }));
    }
}
