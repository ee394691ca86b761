//! Bridge Core - shared library for the audio-reactive lighting bridge.
//!
//! This crate provides the core functionality for a lighting bridge that
//! captures audio, extracts perceptual features, and drives hub (REST or
//! low-latency streaming) and UDP fixtures in real time. It is designed to
//! be used by both a headless server binary and an embedding host.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`audio`]: Capture backends, device selection, watchdog (C1)
//! - [`features`]: Perceptual feature extraction (C2)
//! - [`engine`]: Reactive engine - palettes, scenes, beat detection, tiers (C3)
//! - [`scheduler`]: Per-fixture delta-gated send scheduling (C4)
//! - [`transport`]: Hub (REST/STREAM) and UDP wire transports (C5, C6)
//! - [`registry`]: Fixture catalog and intent routing (C7)
//! - [`animator`]: Standalone per-fixture animation, independent of audio (C8)
//! - [`dispatch`]: Wires intents through routing, scheduling, and transport
//! - [`midi`]: MIDI binding decode and resolution (§10.4)
//! - [`lifecycle`]: Start/stop single-owner lock and shutdown signaling (C9)
//! - [`bootstrap`]: Composition root wiring every service together
//! - [`status`]: Thin `/healthz` and `/status` surface (§10.3)
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! The crate defines several traits to decouple core logic from platform-
//! specific or runtime-specific concerns:
//!
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks
//! - [`Clock`](runtime::Clock): Time, swappable for deterministic tests
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//!
//! Each trait has a production implementation plus a test double.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod animator;
pub mod audio;
pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod features;
pub mod lifecycle;
pub mod midi;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod status;
pub mod transport;
pub mod utils;

// Re-export commonly used types at the crate root
pub use bootstrap::{bootstrap_services, BootstrapConfig, BootstrappedServices};
pub use config::{AudioConfig, Brand, FixtureRecord, FixturesConfig, IntentKind, MidiBindingsConfig};
pub use dispatch::Dispatcher;
pub use engine::{Intent, ReactiveEngine};
pub use error::{BridgeError, BridgeResult, ErrorCode};
pub use events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
pub use lifecycle::{Lifecycle, Lock, NoopLifecycle, ServerLifecycle};
pub use registry::FixtureRegistry;
pub use runtime::{Clock, SystemClock, TaskSpawner, TokioSpawner};
pub use utils::now_millis;
