//! Bridge implementation that maps domain events to broadcast transport.
//!
//! The [`BroadcastEventBridge`] lives at the boundary between domain services
//! and transport concerns, mapping typed domain events to the status
//! surface's broadcast channel.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::emitter::EventEmitter;
use super::{AnimatorEvent, AudioEvent, BroadcastEvent, EngineEvent, SchedulerEvent, TransportEvent};

/// Bridges domain events to the status surface's broadcast channel.
///
/// This adapter implements [`EventEmitter`] by forwarding events to
/// a `tokio::sync::broadcast` channel. An optional external emitter can be
/// registered after construction for hosts that embed the bridge and want
/// their own delivery path (e.g. forwarding into a UI process).
///
/// # Thread Safety
///
/// The bridge is `Send + Sync` and can be shared across async tasks.
/// The external emitter uses `RwLock` to allow setting it after construction.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<BroadcastEvent>,
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a new bridge wrapping an existing broadcast sender.
    pub fn with_sender(tx: broadcast::Sender<BroadcastEvent>) -> Self {
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter for additional event delivery.
    ///
    /// Can be called after construction, which is useful when the embedding
    /// host's delivery handle isn't available until later.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    /// Returns a reference to the broadcast sender.
    pub fn sender(&self) -> &broadcast::Sender<BroadcastEvent> {
        &self.tx
    }
}

/// Generates an [`EventEmitter`] method that forwards to the external emitter
/// (if set) and then sends to the broadcast channel.
macro_rules! impl_emit {
    ($method:ident, $event_ty:ty, $variant:ident) => {
        fn $method(&self, event: $event_ty) {
            if let Some(ref emitter) = *self.external_emitter.read() {
                emitter.$method(event.clone());
            }
            if let Err(e) = self.tx.send(BroadcastEvent::$variant(event)) {
                log::trace!("[EventBridge] No broadcast receivers: {}", e);
            }
        }
    };
}

impl EventEmitter for BroadcastEventBridge {
    impl_emit!(emit_audio, AudioEvent, Audio);
    impl_emit!(emit_engine, EngineEvent, Engine);
    impl_emit!(emit_transport, TransportEvent, Transport);
    impl_emit!(emit_scheduler, SchedulerEvent, Scheduler);
    impl_emit!(emit_animator, AnimatorEvent, Animator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_emitted_events() {
        let bridge = BroadcastEventBridge::new(16);
        let mut rx = bridge.subscribe();

        bridge.emit_engine(EngineEvent::BeatDetected {
            bpm: Some(120.0),
            timestamp: 42,
        });

        let received = rx.try_recv().expect("event should be buffered");
        match received {
            BroadcastEvent::Engine(EngineEvent::BeatDetected { bpm, timestamp }) => {
                assert_eq!(bpm, Some(120.0));
                assert_eq!(timestamp, 42);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn send_with_no_receivers_does_not_panic() {
        let bridge = BroadcastEventBridge::new(16);
        bridge.emit_transport(TransportEvent::ModeChanged {
            mode: "rest".into(),
            timestamp: 0,
        });
    }
}
