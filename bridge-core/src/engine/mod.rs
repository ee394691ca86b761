//! Reactive Engine (C3): feature snapshots + external controls → intents.

mod beat;
mod controls;
mod intent;
mod palette;
mod reactive;
mod scene;

pub use beat::{BeatDetector, BeatOutcome};
pub use intent::{HubIntentState, Intent, UdpIntentColor};
pub use palette::{palette_for_genre, Family, Palette};
pub use reactive::{
    AudioReactivityPreset, AutoProfile, Behavior, EngineTelemetry, OverclockPriority, ReactiveEngine,
    Tier,
};
pub use scene::{policy_for_scene, MotionPolicy};
