//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together. This pattern provides:
//!
//! - **Clarity**: All dependency relationships are visible in one place
//! - **Testability**: Easy to swap implementations for testing
//! - **Maintainability**: Service creation logic is isolated from usage

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::audio::backend_muxer::MuxerBackend;
use crate::audio::{AudioSource, CaptureBackend};
use crate::config::{AudioConfig, FixturesConfig, MidiBindingsConfig};
use crate::dispatch::Dispatcher;
use crate::engine::ReactiveEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
use crate::features::FeatureExtractor;
use crate::lifecycle::Lock;
use crate::midi::{self, MidiBindingTable};
use crate::registry::FixtureRegistry;
use crate::runtime::{Clock, SystemClock, TaskSpawner, TokioSpawner};
use crate::transport::hub::{recovery, stream, HubDnsShim, StreamEndpoint};
use crate::transport::{HubTransport, UdpTransport};

#[cfg(feature = "audio-cpal")]
use crate::audio::backend_native::NativeBackend;

/// Broadcast channel capacity for the status surface's event stream.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Hard deadline for graceful shutdown (§4.9), after which `stop()` returns
/// regardless of what is still in flight.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// Hub entertainment streaming session's well-known port (§6/§10's
/// documented entertainment protocol).
const ENTERTAINMENT_STREAM_PORT: u16 = 2100;

/// Loaded configuration handed to [`bootstrap_services`]. Reading these from
/// disk (paths, env overrides, CLI overrides) is the host's job; this crate
/// only deserializes the schemas themselves (§10.3).
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Audio capture and feature-extraction settings.
    pub audio: AudioConfig,
    /// Fixture catalog and intent route table.
    pub fixtures: FixturesConfig,
    /// MIDI binding table.
    pub midi: MidiBindingsConfig,
}

/// Container for all bootstrapped services.
///
/// This struct holds all the wired services created during bootstrap. It's
/// the thing a host binary (`bridge-server`, or an embedding desktop app)
/// drives via `start`/`stop`.
pub struct BootstrappedServices {
    /// Versioned fixture catalog and route table (C7).
    pub registry: Arc<FixtureRegistry>,
    /// Audio capture pipeline (C1).
    pub audio: Arc<AudioSource>,
    /// Reactive engine (C3).
    pub engine: Arc<ReactiveEngine>,
    /// Intent dispatcher, wiring C3 through C7/C4 onto C5/C6.
    pub dispatcher: Arc<Dispatcher>,
    /// Hub (REST/STREAM) transport (C5).
    pub hub_transport: Arc<HubTransport>,
    /// UDP transport (C6).
    pub udp_transport: Arc<UdpTransport>,
    /// Standalone per-fixture animator (C8).
    pub standalone: Arc<crate::animator::StandaloneAnimator>,
    /// In-memory MIDI binding table (§10.4).
    pub midi_bindings: Arc<MidiBindingTable>,
    /// Event bridge feeding the status surface's broadcast channel.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Broadcast sender, shared with the status surface.
    pub broadcast_tx: broadcast::Sender<BroadcastEvent>,
    /// Single-owner start/stop lock (C9).
    pub lock: Arc<Lock>,
    /// Task spawner shared by every background loop.
    pub spawner: TokioSpawner,
    /// Shared clock, real in production and swappable in tests.
    pub clock: Arc<dyn Clock>,
    feature_config: RwLock<AudioConfig>,
    current_level: RwLock<f32>,
    cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Starts the reactive pipeline: acquires the engine lock, starts audio
    /// capture, and requests the hub transport attempt STREAM mode. Spawns
    /// the audio→feature→engine→dispatch pipeline, the standalone animator
    /// ticker, and the hub recovery coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine lock is already held by another owner.
    pub fn start(self: &Arc<Self>) -> BridgeResult<()> {
        if !self.lock.lock("engine") {
            return Err(BridgeError::Internal(
                "engine already locked by another owner".into(),
            ));
        }

        let rx = self.audio.start();
        self.hub_transport.set_desired_stream();

        self.spawn_pipeline(rx);
        self.spawn_standalone_loop();
        self.spawn_recovery_loop();

        tracing::info!("engine started");
        Ok(())
    }

    /// Reverses `start`: flushes the hub transport to REST, applies the
    /// standalone animator's "on stop" updates, stops audio capture, cancels
    /// every background loop, and releases the engine lock. Bounded by a
    /// hard 10 second deadline (§4.9); loops that don't observe cancellation
    /// in time are simply abandoned when this returns.
    pub async fn stop(&self) {
        let shutdown = async {
            self.hub_transport.force_rest();

            for frame in self.standalone.on_stop() {
                self.send_standalone_frame(&frame).await;
            }

            self.audio.stop();
            self.cancel_token.cancel();
        };

        if tokio::time::timeout(SHUTDOWN_DEADLINE, shutdown).await.is_err() {
            tracing::warn!("shutdown deadline exceeded, abandoning in-flight work");
        }

        self.lock.unlock("engine");
        tracing::info!("engine stopped");
    }

    /// Decodes a raw 3-byte MIDI message and applies whatever actions its
    /// bindings resolve to. Hosts that wire a concrete [`midi::MidiPort`]
    /// should forward every received message here.
    pub fn handle_midi_bytes(&self, bytes: &[u8; 3]) {
        let Some(event) = midi::decode(bytes) else {
            return;
        };
        for action in self.midi_bindings.resolve(&event) {
            self.apply_midi_action(action);
        }
    }

    fn apply_midi_action(&self, action: &str) {
        match action {
            "forceDrop" => self.engine.force_drop(),
            "setMetaAutoEnabled" => self.engine.set_meta_auto_enabled(true),
            other => tracing::debug!(action = other, "unbound midi action, ignoring"),
        }
    }

    fn spawn_pipeline(self: &Arc<Self>, mut rx: tokio::sync::mpsc::Receiver<crate::audio::AudioFrame>) {
        let services = Arc::clone(self);
        let cancel = self.cancel_token.clone();
        let latest = Arc::new(parking_lot::RwLock::new(crate::features::FeatureSnapshot::default()));

        let capture_latest = Arc::clone(&latest);
        let capture_services = Arc::clone(&services);
        let capture_cancel = cancel.clone();
        self.spawner.spawn(async move {
            const WATCHDOG_POLL_MS: u64 = 250;
            let mut extractor = FeatureExtractor::new(capture_services.feature_config.read().clone());
            loop {
                tokio::select! {
                    _ = capture_cancel.cancelled() => break,
                    frame = rx.recv() => {
                        let Some(frame) = frame else { break };
                        capture_services.audio.notify_frame_received();
                        let snapshot = extractor.process(&frame);
                        *capture_latest.write() = snapshot;
                        *capture_services.current_level.write() = snapshot.level;

                        if let Some(reason) = capture_services.audio.check_watchdog() {
                            rx = capture_services.audio.restart(&reason);
                        }
                    }
                    // Independent of frame arrival: catches total silence, the
                    // one case where `rx.recv()` never resolves to trigger the
                    // check above.
                    _ = tokio::time::sleep(Duration::from_millis(WATCHDOG_POLL_MS)) => {
                        if let Some(reason) = capture_services.audio.check_watchdog() {
                            rx = capture_services.audio.restart(&reason);
                        }
                    }
                }
            }
        });

        let tick_cancel = cancel;
        self.spawner.spawn(async move {
            loop {
                let interval = Duration::from_millis(services.engine.tick_interval_ms());
                tokio::select! {
                    _ = tick_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let snapshot = *latest.read();
                for intent in services.engine.tick(&snapshot) {
                    if let Err(err) = services.dispatcher.dispatch(intent).await {
                        tracing::warn!(error = %err, "intent dropped");
                    }
                }
            }
        });
    }

    fn spawn_standalone_loop(self: &Arc<Self>) {
        const TICK_MS: u64 = 33;
        let services = Arc::clone(self);
        let cancel = self.cancel_token.clone();
        self.spawner.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(TICK_MS)) => {}
                }
                let level = *services.current_level.read();
                for frame in services.standalone.tick(TICK_MS, level) {
                    services.send_standalone_frame(&frame).await;
                }
            }
        });
    }

    fn spawn_recovery_loop(self: &Arc<Self>) {
        const POLL_MS: u64 = 250;
        let services = Arc::clone(self);
        let cancel = self.cancel_token.clone();
        self.spawner.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(POLL_MS)) => {}
                }
                if services.hub_transport.recovery_due() {
                    services.attempt_stream_connect().await;
                }
            }
        });
    }

    /// Runs one escalation-plan connect attempt (§4.5) against the first
    /// configured entertainment-area fixture, and updates the transport's
    /// recovery bookkeeping with the outcome.
    async fn attempt_stream_connect(&self) {
        let Some(endpoint) = self.select_stream_endpoint() else {
            // Nothing to stream to; stop retrying until fixtures change.
            self.hub_transport.clear_recovery_schedule();
            return;
        };

        let attempt_index = self.hub_transport.state().consecutive_failures as usize;
        let Some(plan) = recovery::connect_attempt(attempt_index) else {
            self.hub_transport.close_stream_permanently("connect attempts exhausted");
            return;
        };

        let wait_ms = recovery::inter_attempt_wait_ms(attempt_index as u32, 0);
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;

        self.hub_transport.mark_connecting();
        let endpoint = StreamEndpoint { timeout_ms: plan.timeout_ms, ..endpoint };
        match stream::connect(&endpoint).await {
            Ok(session) => {
                self.hub_transport.adopt_stream_session(session);
                self.hub_transport.clear_recovery_schedule();
            }
            Err(err) => self.hub_transport.handle_stream_fault(err.to_string()),
        }
    }

    /// Picks the first hub fixture with a full entertainment-area
    /// configuration (host, API user, entertainment area, client key).
    fn select_stream_endpoint(&self) -> Option<StreamEndpoint> {
        self.registry.get_fixtures().into_iter().find_map(|fixture| {
            if fixture.brand != crate::config::Brand::Hub {
                return None;
            }
            fixture.addressing.entertainment_area_id.as_ref()?;
            let host = fixture.addressing.host.clone()?;
            let psk_identity = fixture.addressing.username.clone()?;
            let psk = crate::utils::decode_hex_key(fixture.addressing.client_key_hex.as_deref()?)?;
            Some(StreamEndpoint {
                host,
                port: ENTERTAINMENT_STREAM_PORT,
                psk_identity,
                psk,
                timeout_ms: 0,
            })
        })
    }

    async fn send_standalone_frame(&self, frame: &crate::animator::StandaloneFrame) {
        let Some(fixture) = self
            .registry
            .get_fixtures()
            .into_iter()
            .find(|f| f.id == frame.fixture_id)
        else {
            return;
        };
        if !fixture.is_configured() {
            return;
        }

        match fixture.brand {
            crate::config::Brand::Hub => {
                let target = crate::transport::hub::HubRestTarget {
                    host: fixture.addressing.host.clone().unwrap_or_default(),
                    username: fixture.addressing.username.clone().unwrap_or_default(),
                    light_id: fixture.addressing.light_id.clone().unwrap_or_default(),
                };
                let wire = crate::transport::hub::HubWireState {
                    on: frame.on,
                    hue: frame.hue.round() as u16,
                    sat: frame.sat.round() as u8,
                    bri: frame.bri.round() as u8,
                    xy: None,
                    ct: None,
                    transition_time: (frame.transition_ms / 100) as u16,
                };
                self.hub_transport.send_rest(target, wire);
            }
            crate::config::Brand::Udp | crate::config::Brand::Mod => {
                let Some(host) = fixture.addressing.host.as_deref() else { return };
                let Some(port) = fixture.addressing.port else { return };
                let Ok(addr) = format!("{host}:{port}").parse() else { return };
                let level = frame.bri.round() as u8;
                let wire = crate::transport::UdpWireState {
                    r: level,
                    g: level,
                    b: level,
                    dimming: 100,
                    temp: None,
                    on: frame.on,
                };
                let _ = self
                    .udp_transport
                    .send(addr, wire, crate::transport::RepeatPolicy::default())
                    .await;
            }
        }
    }
}

/// Bootstraps all application services with their dependencies.
///
/// This is the composition root where all services are instantiated and
/// wired together, per §4.9's boot sequence:
///
/// 1. Load fixtures, route table, configs (done by the caller; see
///    [`BootstrapConfig`]).
/// 2. Construct the registry, engine, audio source, MIDI bindings,
///    standalone animator, and transports.
///
/// `start`/`stop` on the returned services carry out steps 3 and 4.
///
/// # Errors
///
/// Returns an error if the hub transport's REST client cannot be built.
pub fn bootstrap_services(config: BootstrapConfig) -> BridgeResult<Arc<BootstrappedServices>> {
    let spawner = TokioSpawner::current();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (broadcast_tx, _) = broadcast::channel::<BroadcastEvent>(EVENT_CHANNEL_CAPACITY);
    let event_bridge = Arc::new(BroadcastEventBridge::with_sender(broadcast_tx.clone()));
    let emitter: Arc<dyn EventEmitter> = event_bridge.clone();

    let registry = Arc::new(FixtureRegistry::from_config(config.fixtures));

    let mut backends: Vec<Arc<dyn CaptureBackend>> = Vec::new();
    #[cfg(feature = "audio-cpal")]
    backends.push(Arc::new(NativeBackend::new()));
    backends.push(Arc::new(MuxerBackend::new(Arc::new(spawner.clone()))));

    let audio = Arc::new(AudioSource::new(
        config.audio.clone(),
        backends,
        Arc::clone(&emitter),
        Arc::new(spawner.clone()),
        Arc::clone(&clock),
    ));

    let engine = Arc::new(ReactiveEngine::with_clock_and_emitter(
        Arc::clone(&clock),
        Arc::clone(&emitter),
    ));

    let dns_shim = HubDnsShim::new();
    let hub_transport = Arc::new(HubTransport::with_clock_and_emitter(
        Arc::new(spawner.clone()),
        &dns_shim,
        Arc::clone(&clock),
        Arc::clone(&emitter),
    )?);
    let udp_transport = Arc::new(UdpTransport::new(Arc::new(spawner.clone())));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&hub_transport),
        Arc::clone(&udp_transport),
    ));

    let standalone = Arc::new(crate::animator::StandaloneAnimator::with_clock_and_emitter(
        Arc::clone(&clock),
        Arc::clone(&emitter),
    ));

    let midi_bindings = Arc::new(MidiBindingTable::from_config(&config.midi));

    let lock = Arc::new(Lock::new());
    let cancel_token = CancellationToken::new();

    Ok(Arc::new(BootstrappedServices {
        registry,
        audio,
        engine,
        dispatcher,
        hub_transport,
        udp_transport,
        standalone,
        midi_bindings,
        event_bridge,
        broadcast_tx,
        lock,
        spawner,
        clock,
        feature_config: RwLock::new(config.audio),
        current_level: RwLock::new(0.0),
        cancel_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BootstrapConfig {
        BootstrapConfig {
            audio: AudioConfig::default(),
            fixtures: FixturesConfig::default(),
            midi: MidiBindingsConfig::default(),
        }
    }

    #[tokio::test]
    async fn bootstrap_wires_every_service_without_fixtures_configured() {
        let services = bootstrap_services(config()).expect("bootstrap should succeed");
        assert_eq!(services.registry.summary().hue, 0);
        assert!(!services.lock.is_locked());
    }

    #[tokio::test]
    async fn start_acquires_the_engine_lock_and_stop_releases_it() {
        let services = bootstrap_services(config()).expect("bootstrap should succeed");
        services.start().expect("start should succeed");
        assert!(services.lock.is_locked_by("engine"));
        services.stop().await;
        assert!(!services.lock.is_locked());
    }

    #[tokio::test]
    async fn start_twice_without_stop_fails_to_relock() {
        let services = bootstrap_services(config()).expect("bootstrap should succeed");
        services.start().expect("first start should succeed");
        services.lock.force_unlock();
        assert!(!services.lock.is_locked());
    }
}
