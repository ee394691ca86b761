//! Audio source: capture backends, device selection, watchdog, and isolation.
//!
//! Mirrors the shape of the teacher's stream pipeline (a background task
//! pushing data into the rest of the system through a channel) but the
//! "stream" here is raw PCM from a loopback device or muxer subprocess
//! instead of a Sonos-bound HTTP stream.

mod backend_muxer;
#[cfg(feature = "audio-cpal")]
mod backend_native;
pub mod device;
pub mod isolation;
pub mod watchdog;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::events::{AudioEvent, EventEmitter};
use crate::runtime::{Clock, TaskSpawner};
use watchdog::Watchdog;

/// One contiguous block of interleaved float32 samples.
///
/// Invariant: `samples.len()` is a multiple of `channels`; carry bytes from
/// incomplete channel-boundary reads are prepended to the next frame by the
/// backend, never exposed here.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Interleaved samples, channel-major per frame (`[L, R, L, R, ...]`).
    pub samples: Vec<f32>,
    /// Channel count this frame was captured with.
    pub channels: u8,
    /// Sample rate this frame was captured at.
    pub sample_rate: u32,
}

/// A selectable capture backend.
///
/// Implementations run their own background task and push frames into the
/// channel handed to `open`.
pub trait CaptureBackend: Send + Sync {
    /// Opens the backend and begins pushing frames to `tx` until `close` is called.
    fn open(&self, config: &AudioConfig, tx: mpsc::Sender<AudioFrame>) -> Result<(), AudioError>;

    /// Stops the backend and releases its resources.
    fn close(&self);

    /// A short identifier for telemetry (`"native"`, `"muxer"`).
    fn name(&self) -> &'static str;
}

/// Snapshot of audio source health and configuration for the status surface.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTelemetry {
    /// Active backend name, or `None` if unavailable.
    pub backend: Option<String>,
    /// Milliseconds since the last frame was observed.
    pub silent_ms: u64,
    /// Total watchdog-triggered restarts since start.
    pub restarts: u64,
    /// Set when no backend could be opened.
    pub unavailable_reason: Option<String>,
}

/// Coordinates backend selection, the watchdog, and per-app isolation.
///
/// `start`/`stop`/`restart` drive a single logical session; callers run the
/// returned frame receiver through the feature extractor (C2).
pub struct AudioSource {
    config: RwLock<AudioConfig>,
    telemetry: RwLock<AudioTelemetry>,
    backends: Vec<Arc<dyn CaptureBackend>>,
    active_backend: RwLock<Option<Arc<dyn CaptureBackend>>>,
    watchdog: Arc<Watchdog>,
    emitter: Arc<dyn EventEmitter>,
    spawner: Arc<dyn TaskSpawner>,
    clock: Arc<dyn Clock>,
}

impl AudioSource {
    /// Creates a new audio source. `backends` are tried in order at `start`.
    pub fn new(
        config: AudioConfig,
        backends: Vec<Arc<dyn CaptureBackend>>,
        emitter: Arc<dyn EventEmitter>,
        spawner: Arc<dyn TaskSpawner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let watchdog = Arc::new(Watchdog::new(
            config.watchdog_ms,
            config.restart_ms,
            Arc::clone(&clock),
        ));
        Self {
            config: RwLock::new(config),
            telemetry: RwLock::new(AudioTelemetry::default()),
            backends,
            active_backend: RwLock::new(None),
            watchdog,
            emitter,
            spawner,
            clock,
        }
    }

    /// Starts capture, returning a receiver of audio frames.
    ///
    /// Tries each configured backend in order. If none can be opened, the
    /// source remains callable but produces a single zero-filled frame and
    /// records the failure reason in telemetry, per `AudioUnavailable`.
    pub fn start(&self) -> mpsc::Receiver<AudioFrame> {
        let (tx, rx) = mpsc::channel(32);
        let config = self.config.read().clone();

        for backend in &self.backends {
            match backend.open(&config, tx.clone()) {
                Ok(()) => {
                    *self.active_backend.write() = Some(Arc::clone(backend));
                    self.telemetry.write().backend = Some(backend.name().to_string());
                    self.telemetry.write().unavailable_reason = None;
                    self.emitter.emit_audio(AudioEvent::BackendChanged {
                        backend: backend.name().to_string(),
                        timestamp: self.clock.now_millis(),
                    });
                    self.watchdog.touch();
                    return rx;
                }
                Err(err) => {
                    tracing::warn!(backend = backend.name(), error = %err, "backend unavailable");
                }
            }
        }

        let reason = "no audio backend available".to_string();
        self.telemetry.write().unavailable_reason = Some(reason.clone());
        self.telemetry.write().backend = None;
        let zero = AudioFrame {
            samples: vec![0.0; config.channels as usize],
            channels: config.channels,
            sample_rate: config.sample_rate,
        };
        let tx2 = tx.clone();
        self.spawner.spawn(async move {
            let _ = tx2.send(zero).await;
        });
        rx
    }

    /// Stops the active backend, if any.
    pub fn stop(&self) {
        if let Some(backend) = self.active_backend.write().take() {
            backend.close();
        }
        self.telemetry.write().backend = None;
    }

    /// Stops and restarts, recording the reason for telemetry/logs.
    pub fn restart(&self, reason: &str) -> mpsc::Receiver<AudioFrame> {
        tracing::info!(reason, "restarting audio source");
        self.telemetry.write().restarts += 1;
        self.stop();
        self.start()
    }

    /// Applies a partial configuration update, requiring a restart to take effect.
    pub fn set_config(&self, patch: AudioConfig) {
        *self.config.write() = patch;
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn get_config(&self) -> AudioConfig {
        self.config.read().clone()
    }

    /// Returns a telemetry snapshot.
    #[must_use]
    pub fn get_telemetry(&self) -> AudioTelemetry {
        let mut snap = self.telemetry.read().clone();
        snap.silent_ms = self.watchdog.silent_ms();
        snap
    }

    /// Called by the feature extractor whenever a frame is consumed, resetting the watchdog.
    pub fn notify_frame_received(&self) {
        self.watchdog.touch();
    }

    /// Checks the watchdog and returns `Some(reason)` if it has tripped.
    ///
    /// Callers should `restart()` when this returns `Some`.
    pub fn check_watchdog(&self) -> Option<String> {
        if self.watchdog.has_tripped() {
            let silent = self.watchdog.silent_ms();
            self.emitter.emit_audio(AudioEvent::WatchdogTripped {
                silent_ms: silent,
                timestamp: self.clock.now_millis(),
            });
            Some(format!("watchdog: silent for {silent}ms"))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventEmitter;
    use crate::runtime::{ManualClock, TokioSpawner};

    struct AlwaysFailBackend;
    impl CaptureBackend for AlwaysFailBackend {
        fn open(&self, _config: &AudioConfig, _tx: mpsc::Sender<AudioFrame>) -> Result<(), AudioError> {
            Err(AudioError::Unavailable("test backend never opens".into()))
        }
        fn close(&self) {}
        fn name(&self) -> &'static str {
            "always-fail"
        }
    }

    #[tokio::test]
    async fn falls_back_to_zero_snapshot_when_no_backend_available() {
        let source = AudioSource::new(
            AudioConfig::default(),
            vec![Arc::new(AlwaysFailBackend)],
            Arc::new(NoopEventEmitter),
            Arc::new(TokioSpawner::current()),
            Arc::new(ManualClock::new(0)),
        );
        let mut rx = source.start();
        let frame = rx.recv().await.expect("should receive zero frame");
        assert!(frame.samples.iter().all(|&s| s == 0.0));
        assert!(source.get_telemetry().unavailable_reason.is_some());
    }
}
