//! Hub transport (C5): dual-mode REST/STREAM dispatcher with a serialized
//! recovery coordinator.

pub mod dns_shim;
pub mod recovery;
pub mod rest;
pub mod state_machine;
pub mod stream;

pub use dns_shim::HubDnsShim;
pub use rest::{HubRestClient, HubRestTarget, HubWireState};
pub use state_machine::{ActiveMode, DesiredMode, HubTransportState, StreamPhase};
pub use stream::{ChannelColor, StreamEndpoint, StreamSession, UnavailableStreamSession};

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::TransportError;
use crate::events::{EventEmitter, NoopEventEmitter, TransportEvent};
use crate::runtime::{Clock, SystemClock, TaskSpawner};

/// Coordinates the hub's REST client and streaming session behind one
/// `{desired, active}` state machine, driving recovery on failure.
pub struct HubTransport {
    rest: HubRestClient,
    stream: Mutex<Option<Box<dyn StreamSession>>>,
    state: Mutex<HubTransportState>,
    clock: Arc<dyn Clock>,
    emitter: Arc<dyn EventEmitter>,
    next_recovery_at_ms: Mutex<Option<u64>>,
    closing: Arc<Notify>,
}

impl HubTransport {
    /// Builds a transport with a REST client routed through `dns_shim` and
    /// the system clock/no-op emitter.
    pub fn new(spawner: Arc<dyn TaskSpawner>, dns_shim: &HubDnsShim) -> Result<Self, TransportError> {
        Self::with_clock_and_emitter(spawner, dns_shim, Arc::new(SystemClock), Arc::new(NoopEventEmitter))
    }

    /// Builds a transport with explicit clock/emitter dependencies, for tests
    /// and production wiring that shares one clock across the process.
    pub fn with_clock_and_emitter(
        spawner: Arc<dyn TaskSpawner>,
        dns_shim: &HubDnsShim,
        clock: Arc<dyn Clock>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            rest: HubRestClient::new(spawner, dns_shim)?,
            stream: Mutex::new(None),
            state: Mutex::new(HubTransportState::default()),
            clock,
            emitter,
            next_recovery_at_ms: Mutex::new(None),
            closing: Arc::new(Notify::new()),
        })
    }

    /// Current transport telemetry snapshot.
    #[must_use]
    pub fn state(&self) -> HubTransportState {
        self.state.lock().clone()
    }

    /// Queues a REST PUT for one fixture. Always available regardless of the
    /// active mode; used directly when `active == Rest`, and as the fallback
    /// path when the stream session fails.
    pub fn send_rest(&self, target: HubRestTarget, state: HubWireState) {
        self.rest.send(target, state);
    }

    /// Emits one streaming frame if the session is active; returns an error
    /// (and triggers fallback bookkeeping) otherwise.
    pub fn send_stream_frame(&self, channels: &[ChannelColor]) -> Result<(), TransportError> {
        let session = self.stream.lock();
        match session.as_ref() {
            Some(session) => {
                let result = session.send_frame(channels);
                if let Err(ref err) = result {
                    drop(session);
                    self.handle_stream_fault(err.to_string());
                }
                result
            }
            None => Err(TransportError::NotConfigured("stream not active".into())),
        }
    }

    /// Whether the active mode is currently REST — callers should route new
    /// intents there rather than attempting a stream send.
    #[must_use]
    pub fn is_rest_active(&self) -> bool {
        self.state.lock().active == ActiveMode::Rest
    }

    /// Installs a freshly connected session and marks the transport stream-active.
    pub fn adopt_stream_session(&self, session: Box<dyn StreamSession>) {
        *self.stream.lock() = Some(session);
        let mut state = self.state.lock();
        state.mark_stream_active();
        self.emitter.emit_transport(TransportEvent::ModeChanged {
            mode: "stream".into(),
            timestamp: self.clock.now_millis(),
        });
    }

    /// Records a fatal handshake outcome (e.g. untrusted certificate):
    /// permanently closes the stream path.
    pub fn close_stream_permanently(&self, reason: impl Into<String>) {
        *self.stream.lock() = None;
        self.state.lock().close_permanently(reason);
        self.emitter.emit_transport(TransportEvent::ModeChanged {
            mode: "rest".into(),
            timestamp: self.clock.now_millis(),
        });
    }

    /// Records a failed connect/send attempt: drops any half-open stream,
    /// falls back to REST, and schedules the next recovery attempt's backoff.
    pub(crate) fn handle_stream_fault(&self, reason: String) {
        *self.stream.lock() = None;
        let mut state = self.state.lock();
        state.fall_back_to_rest(reason);
        state.record_failure();
        let delay = recovery::recovery_delay_ms(state.consecutive_failures.saturating_sub(1));
        let attempt = state.consecutive_failures;
        drop(state);

        *self.next_recovery_at_ms.lock() = Some(self.clock.now_millis() + delay);
        self.emitter.emit_transport(TransportEvent::RecoveryScheduled {
            delay_ms: delay,
            attempt,
            timestamp: self.clock.now_millis(),
        });
        self.emitter.emit_transport(TransportEvent::ModeChanged {
            mode: "rest".into(),
            timestamp: self.clock.now_millis(),
        });
    }

    /// Returns `true` if a recovery attempt is due, given the clock this
    /// transport was built with.
    #[must_use]
    pub fn recovery_due(&self) -> bool {
        match *self.next_recovery_at_ms.lock() {
            Some(at) => self.clock.now_millis() >= at,
            None => false,
        }
    }

    /// Called after a successful reconnect to clear the recovery schedule
    /// and emit `RecoverySucceeded`.
    pub fn clear_recovery_schedule(&self) {
        *self.next_recovery_at_ms.lock() = None;
        self.emitter.emit_transport(TransportEvent::RecoverySucceeded {
            timestamp: self.clock.now_millis(),
        });
    }

    /// Force-drains the streaming session: drops it and marks REST-only,
    /// without recording a failure (this is an intentional mode switch).
    pub fn force_rest(&self) {
        *self.stream.lock() = None;
        let mut state = self.state.lock();
        if state.active != ActiveMode::Rest {
            state.switches += 1;
        }
        state.active = ActiveMode::Rest;
        state.phase = StreamPhase::RestOnly;
        state.desired = DesiredMode::Rest;
        *self.next_recovery_at_ms.lock() = None;
    }

    /// Requests the transport attempt STREAM mode on the next connect cycle.
    pub fn set_desired_stream(&self) {
        self.state.lock().desired = DesiredMode::Stream;
    }

    /// Marks a handshake attempt starting, for telemetry (`phase`).
    pub(crate) fn mark_connecting(&self) {
        self.state.lock().mark_connecting();
    }

    /// Signals any in-flight recovery wait to abort, used during shutdown.
    pub fn cancel_recovery(&self) {
        self.closing.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ManualClock, TokioSpawner};

    fn transport(clock: Arc<ManualClock>) -> HubTransport {
        let shim = HubDnsShim::new();
        HubTransport::with_clock_and_emitter(
            Arc::new(TokioSpawner::current()),
            &shim,
            clock,
            Arc::new(NoopEventEmitter),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn stream_fault_falls_back_to_rest_and_schedules_recovery() {
        let clock = Arc::new(ManualClock::new(0));
        let transport = transport(clock.clone());
        transport.adopt_stream_session(Box::new(UnavailableStreamSession));

        let err = transport.send_stream_frame(&[ChannelColor::default()]).unwrap_err();
        assert!(matches!(err, TransportError::NotConfigured(_)));
        assert!(transport.is_rest_active());
        assert!(!transport.recovery_due());

        clock.advance(5_001);
        assert!(transport.recovery_due());
    }

    #[tokio::test]
    async fn force_rest_clears_stream_without_counting_a_failure() {
        let clock = Arc::new(ManualClock::new(0));
        let transport = transport(clock);
        transport.adopt_stream_session(Box::new(UnavailableStreamSession));
        transport.force_rest();
        assert!(transport.is_rest_active());
        assert_eq!(transport.state().errors, 0);
    }
}
