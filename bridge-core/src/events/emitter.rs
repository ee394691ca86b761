//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative transport implementations.

use super::{AnimatorEvent, AudioEvent, EngineEvent, SchedulerEvent, TransportEvent};

/// Trait for emitting domain events without knowledge of transport.
///
/// Services use this trait to emit events, decoupling them from the
/// specifics of how events are delivered to observers (status surface,
/// logs, an embedding host).
///
/// # Example
///
/// ```ignore
/// struct MyService {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyService {
///     fn do_something(&self) {
///         self.emitter.emit_engine(EngineEvent::BeatDetected { .. });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits an audio capture event.
    fn emit_audio(&self, event: AudioEvent);

    /// Emits a reactive engine event.
    fn emit_engine(&self, event: EngineEvent);

    /// Emits a hub transport event.
    fn emit_transport(&self, event: TransportEvent);

    /// Emits a per-zone scheduler event.
    fn emit_scheduler(&self, event: SchedulerEvent);

    /// Emits a standalone animator event.
    fn emit_animator(&self, event: AnimatorEvent);
}

/// No-op emitter for headless operation or testing.
///
/// Events are silently discarded. Used when there's no need to observe
/// events beyond the structured log lines each module already emits.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_audio(&self, _event: AudioEvent) {}
    fn emit_engine(&self, _event: EngineEvent) {}
    fn emit_transport(&self, _event: TransportEvent) {}
    fn emit_scheduler(&self, _event: SchedulerEvent) {}
    fn emit_animator(&self, _event: AnimatorEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_audio(&self, event: AudioEvent) {
        tracing::debug!(?event, "audio_event");
    }

    fn emit_engine(&self, event: EngineEvent) {
        tracing::debug!(?event, "engine_event");
    }

    fn emit_transport(&self, event: TransportEvent) {
        tracing::debug!(?event, "transport_event");
    }

    fn emit_scheduler(&self, event: SchedulerEvent) {
        tracing::debug!(?event, "scheduler_event");
    }

    fn emit_animator(&self, event: AnimatorEvent) {
        tracing::debug!(?event, "animator_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test emitter that counts events.
    struct CountingEventEmitter {
        engine_count: AtomicUsize,
        transport_count: AtomicUsize,
    }

    impl CountingEventEmitter {
        fn new() -> Self {
            Self {
                engine_count: AtomicUsize::new(0),
                transport_count: AtomicUsize::new(0),
            }
        }
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_audio(&self, _event: AudioEvent) {}

        fn emit_engine(&self, _event: EngineEvent) {
            self.engine_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_transport(&self, _event: TransportEvent) {
            self.transport_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_scheduler(&self, _event: SchedulerEvent) {}
        fn emit_animator(&self, _event: AnimatorEvent) {}
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter::new());

        emitter.emit_engine(EngineEvent::BeatDetected {
            bpm: Some(128.0),
            timestamp: 0,
        });
        emitter.emit_engine(EngineEvent::DropDetected { timestamp: 1 });
        emitter.emit_transport(TransportEvent::ModeChanged {
            mode: "stream".into(),
            timestamp: 2,
        });

        assert_eq!(emitter.engine_count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.transport_count.load(Ordering::SeqCst), 1);
    }
}
