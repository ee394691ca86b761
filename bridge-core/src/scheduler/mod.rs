//! Per-fixture schedulers (C4): decide whether a new light state is worth
//! sending, independent of the transport that eventually carries it.

pub mod hub;
pub mod state;
pub mod udp;

pub use hub::{circular_hue_distance, HubLightState};
pub use state::{rate_reactive_scale, DeltaState, SchedulerOptions, SchedulerTelemetry};
pub use udp::UdpPulseState;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::events::{EventEmitter, NoopEventEmitter};
use crate::runtime::{Clock, SystemClock};

/// Per-zone gatekeeper combining a rate guard, a delta guard, and a forced
/// heartbeat, per §4.4. One instance per zone per fixture family.
pub struct Scheduler<T: DeltaState> {
    last: Mutex<Option<(T, u64)>>,
    telemetry: Mutex<SchedulerTelemetry>,
    clock: Arc<dyn Clock>,
    emitter: Arc<dyn EventEmitter>,
    zone: String,
}

impl<T: DeltaState> Scheduler<T> {
    /// Creates a scheduler for the named zone using the system clock and a
    /// no-op emitter.
    #[must_use]
    pub fn new(zone: impl Into<String>) -> Self {
        Self::with_clock_and_emitter(zone, Arc::new(SystemClock), Arc::new(NoopEventEmitter))
    }

    /// Creates a scheduler with explicit clock/emitter dependencies, for tests
    /// and for production wiring that shares one clock across the process.
    pub fn with_clock_and_emitter(
        zone: impl Into<String>,
        clock: Arc<dyn Clock>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            last: Mutex::new(None),
            telemetry: Mutex::new(SchedulerTelemetry::default()),
            clock,
            emitter,
            zone: zone.into(),
        }
    }

    /// Decides whether `next` should be sent, given `options`, and records
    /// the decision as the new baseline if it should.
    pub fn should_send(&self, next: &T, options: &SchedulerOptions) -> bool {
        let now = self.clock.now_millis();
        let mut last = self.last.lock();
        let mut telemetry = self.telemetry.lock();

        let Some((prev_state, prev_at)) = last.as_ref() else {
            *last = Some((next.clone(), now));
            telemetry.sent += 1;
            return true;
        };

        let elapsed = now.saturating_sub(*prev_at);
        if elapsed < options.min_interval_ms && !options.force_delta {
            telemetry.skipped_rate += 1;
            return false;
        }

        let scale = options.delta_scale
            * rate_reactive_scale(options.min_interval_ms)
            * (1.0 - 0.22 * options.trigger_boost).max(0.0);
        let within = next.within_limits(prev_state, scale);

        if within && !options.force_delta {
            if elapsed >= options.max_silence_ms {
                *last = Some((next.clone(), now));
                telemetry.forced_heartbeat += 1;
                self.emitter.emit_scheduler(crate::events::SchedulerEvent::HeartbeatForced {
                    zone: self.zone.clone(),
                    timestamp: crate::utils::now_millis(),
                });
                true
            } else {
                telemetry.skipped_delta += 1;
                self.emitter.emit_scheduler(crate::events::SchedulerEvent::Coalesced {
                    zone: self.zone.clone(),
                    timestamp: crate::utils::now_millis(),
                });
                false
            }
        } else {
            *last = Some((next.clone(), now));
            telemetry.sent += 1;
            true
        }
    }

    /// Clears the remembered last-sent state, forcing the next call through.
    pub fn reset(&self) {
        *self.last.lock() = None;
    }

    /// A snapshot of this scheduler's running counters.
    #[must_use]
    pub fn telemetry(&self) -> SchedulerTelemetry {
        *self.telemetry.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;

    fn scheduler(clock: Arc<ManualClock>) -> Scheduler<HubLightState> {
        Scheduler::with_clock_and_emitter("zone-a", clock, Arc::new(NoopEventEmitter))
    }

    #[test]
    fn first_send_always_goes_through() {
        let clock = Arc::new(ManualClock::new(0));
        let sched = scheduler(clock);
        let state = HubLightState { hue: 0, sat: 0, bri: 0 };
        assert!(sched.should_send(&state, &HubLightState::default_options()));
        assert_eq!(sched.telemetry().sent, 1);
    }

    #[test]
    fn rate_guard_rejects_too_soon() {
        let clock = Arc::new(ManualClock::new(0));
        let sched = scheduler(clock.clone());
        let options = HubLightState::default_options();
        let a = HubLightState { hue: 0, sat: 0, bri: 0 };
        let b = HubLightState { hue: 40000, sat: 254, bri: 254 };
        assert!(sched.should_send(&a, &options));
        clock.advance(50);
        assert!(!sched.should_send(&b, &options));
        assert_eq!(sched.telemetry().skipped_rate, 1);
    }

    #[test]
    fn delta_guard_rejects_small_changes_after_rate_window() {
        let clock = Arc::new(ManualClock::new(0));
        let sched = scheduler(clock.clone());
        let options = HubLightState::default_options();
        let a = HubLightState { hue: 1000, sat: 200, bri: 200 };
        let b = HubLightState { hue: 1005, sat: 200, bri: 200 };
        assert!(sched.should_send(&a, &options));
        clock.advance(300);
        assert!(!sched.should_send(&b, &options));
        assert_eq!(sched.telemetry().skipped_delta, 1);
    }

    #[test]
    fn forced_heartbeat_fires_after_max_silence() {
        let clock = Arc::new(ManualClock::new(0));
        let sched = scheduler(clock.clone());
        let options = HubLightState::default_options();
        let a = HubLightState { hue: 1000, sat: 200, bri: 200 };
        assert!(sched.should_send(&a, &options));
        clock.advance(options.max_silence_ms + 1);
        assert!(sched.should_send(&a, &options));
        assert_eq!(sched.telemetry().forced_heartbeat, 1);
    }

    #[test]
    fn large_delta_goes_through_even_inside_rate_window_once_elapsed_allows() {
        let clock = Arc::new(ManualClock::new(0));
        let sched = scheduler(clock.clone());
        let options = HubLightState::default_options();
        let a = HubLightState { hue: 0, sat: 0, bri: 0 };
        let b = HubLightState { hue: 40000, sat: 254, bri: 254 };
        assert!(sched.should_send(&a, &options));
        clock.advance(options.min_interval_ms + 1);
        assert!(sched.should_send(&b, &options));
        assert_eq!(sched.telemetry().sent, 2);
    }
}
