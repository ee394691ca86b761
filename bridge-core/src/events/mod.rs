//! Event system for real-time status observation.
//!
//! This module provides:
//! - [`EventEmitter`] trait for domain services to emit events
//! - Event types for each pipeline stage (audio, engine, transport, scheduler, dispatch)
//!
//! The actual transport implementation (the thin status surface's broadcast
//! channel) is handled separately via [`BroadcastEventBridge`].

mod emitter;
pub mod bridge;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

/// Events broadcast to observers (logs, the status surface, tests).
///
/// This enum categorizes all real-time events that can be emitted by the
/// pipeline. Each category has its own inner event type with specific variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Events from the audio source (capture, watchdog, isolation).
    Audio(AudioEvent),

    /// Events from the reactive engine (tier changes, beat/drop, scene changes).
    Engine(EngineEvent),

    /// Events from the hub transport (mode changes, recovery).
    Transport(TransportEvent),

    /// Events from per-zone schedulers.
    Scheduler(SchedulerEvent),

    /// Events from the standalone animator.
    Animator(AnimatorEvent),
}

/// Events from the audio capture pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AudioEvent {
    /// The capture backend changed (native device vs muxer subprocess).
    BackendChanged {
        /// Name of the newly active backend.
        backend: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The watchdog tripped because no frames arrived within the configured window.
    WatchdogTripped {
        /// Milliseconds since the last frame was observed.
        #[serde(rename = "silentMs")]
        silent_ms: u64,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Per-application isolation changed which app is considered "active".
    IsolationTargetChanged {
        /// The app token now considered active (`primary`, `fallback`, or none).
        target: Option<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the reactive engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// The overclock tier changed (manual or auto).
    TierChanged {
        /// New tier name.
        tier: String,
        /// Which control caused the change (`manual`, `overclock_auto`, `meta_auto`).
        source: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A beat was detected.
    BeatDetected {
        /// Estimated tempo in BPM, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        bpm: Option<f32>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A "drop" was detected (sustained high-energy transient).
    DropDetected {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// The active scene changed.
    SceneChanged {
        /// The new scene id, or `None` for no scene (reactive passthrough).
        scene: Option<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the hub transport state machine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportEvent {
    /// The active hub transport mode changed.
    ModeChanged {
        /// New active mode (`rest` or `stream`).
        mode: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A recovery attempt (handshake retry) was scheduled.
    RecoveryScheduled {
        /// Milliseconds until the next attempt.
        #[serde(rename = "delayMs")]
        delay_ms: u64,
        /// Attempt number in the current backoff sequence.
        attempt: u32,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A recovery attempt succeeded and stream mode is active again.
    RecoverySucceeded {
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from per-zone schedulers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchedulerEvent {
    /// A scheduled state was coalesced (replaced before dispatch) due to backpressure.
    Coalesced {
        /// The zone whose pending state was replaced.
        zone: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A forced heartbeat frame was sent regardless of the rate/delta guard.
    HeartbeatForced {
        /// The zone the heartbeat was sent for.
        zone: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the standalone animator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnimatorEvent {
    /// A standalone scene advanced to its next keyframe or jumped randomly.
    SceneAdvanced {
        /// The fixture id being animated.
        #[serde(rename = "fixtureId")]
        fixture_id: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

impl From<AudioEvent> for BroadcastEvent {
    fn from(event: AudioEvent) -> Self {
        BroadcastEvent::Audio(event)
    }
}

impl From<EngineEvent> for BroadcastEvent {
    fn from(event: EngineEvent) -> Self {
        BroadcastEvent::Engine(event)
    }
}

impl From<TransportEvent> for BroadcastEvent {
    fn from(event: TransportEvent) -> Self {
        BroadcastEvent::Transport(event)
    }
}

impl From<SchedulerEvent> for BroadcastEvent {
    fn from(event: SchedulerEvent) -> Self {
        BroadcastEvent::Scheduler(event)
    }
}

impl From<AnimatorEvent> for BroadcastEvent {
    fn from(event: AnimatorEvent) -> Self {
        BroadcastEvent::Animator(event)
    }
}
