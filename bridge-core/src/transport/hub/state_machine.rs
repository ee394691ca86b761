//! Hub transport state machine: `{desired, active, fallbackReason, switches, errors}`.

use serde::Serialize;

/// The mode a caller wants the hub transport to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DesiredMode {
    /// REST-only; never attempt a streaming session.
    Rest,
    /// Prefer the low-latency DTLS-PSK streaming session, falling back to REST.
    Stream,
}

/// The mode actually in effect right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActiveMode {
    /// Sending via REST PUTs.
    Rest,
    /// Sending via the streaming session.
    Stream,
}

/// Connection-level phase of the streaming session, independent of `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamPhase {
    /// No streaming session attempted, or `desired == Rest`.
    RestOnly,
    /// A handshake is in progress.
    StreamConnecting,
    /// The session is established and frames are flowing.
    StreamActive,
    /// A transient failure occurred; recovery is scheduled.
    StreamFailing,
    /// The session was torn down and will not be retried until `desired` changes.
    StreamClosed,
}

/// Full transport telemetry surfaced to `getHueTelemetry`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubTransportState {
    /// The caller-requested mode.
    pub desired: DesiredMode,
    /// The mode currently carrying traffic.
    pub active: ActiveMode,
    /// Streaming session connection phase.
    pub phase: StreamPhase,
    /// Human-readable reason for the most recent REST fallback, if any.
    pub fallback_reason: Option<String>,
    /// Total number of active-mode transitions.
    pub switches: u64,
    /// Total number of stream errors observed.
    pub errors: u64,
    /// Consecutive recovery failures, reset to 0 on success.
    pub consecutive_failures: u32,
}

impl Default for HubTransportState {
    fn default() -> Self {
        Self {
            desired: DesiredMode::Rest,
            active: ActiveMode::Rest,
            phase: StreamPhase::RestOnly,
            fallback_reason: None,
            switches: 0,
            errors: 0,
            consecutive_failures: 0,
        }
    }
}

impl HubTransportState {
    /// Marks the transport as REST-active, recording why the fallback occurred.
    pub fn fall_back_to_rest(&mut self, reason: impl Into<String>) {
        if self.active != ActiveMode::Rest {
            self.switches += 1;
        }
        self.active = ActiveMode::Rest;
        self.phase = StreamPhase::StreamFailing;
        self.fallback_reason = Some(reason.into());
        self.errors += 1;
    }

    /// Marks a successful stream handshake: active=Stream, phase=StreamActive.
    pub fn mark_stream_active(&mut self) {
        if self.active != ActiveMode::Stream {
            self.switches += 1;
        }
        self.active = ActiveMode::Stream;
        self.phase = StreamPhase::StreamActive;
        self.fallback_reason = None;
        self.consecutive_failures = 0;
    }

    /// Records a handshake/recovery attempt starting.
    pub fn mark_connecting(&mut self) {
        self.phase = StreamPhase::StreamConnecting;
    }

    /// Records a fatal condition (e.g. untrusted certificate): closes the
    /// stream path entirely until `desired` is explicitly re-set.
    pub fn close_permanently(&mut self, reason: impl Into<String>) {
        self.fall_back_to_rest(reason);
        self.phase = StreamPhase::StreamClosed;
    }

    /// Increments the consecutive-failure counter, used to drive backoff.
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fall_back_counts_a_switch_only_when_mode_changes() {
        let mut state = HubTransportState::default();
        state.mark_stream_active();
        assert_eq!(state.switches, 1);
        state.fall_back_to_rest("SocketFault");
        assert_eq!(state.switches, 2);
        assert_eq!(state.active, ActiveMode::Rest);
        state.fall_back_to_rest("SocketFault again");
        assert_eq!(state.switches, 2, "already REST, no extra switch");
    }

    #[test]
    fn close_permanently_sets_stream_closed_phase() {
        let mut state = HubTransportState::default();
        state.mark_stream_active();
        state.close_permanently("CertUntrusted");
        assert_eq!(state.phase, StreamPhase::StreamClosed);
        assert_eq!(state.active, ActiveMode::Rest);
    }
}
