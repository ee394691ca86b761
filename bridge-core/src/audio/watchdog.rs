//! Audio source watchdog.
//!
//! Trips when no frame has arrived within `watchdog_ms`. Restarts are
//! coalesced by the caller (only ever one `AudioSource::restart` in flight).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::runtime::Clock;

/// Tracks time since the last observed frame and reports watchdog trips.
pub struct Watchdog {
    watchdog_ms: u64,
    #[allow(dead_code)]
    restart_ms: u64,
    last_data_at_ms: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl Watchdog {
    /// Creates a new watchdog armed with `watchdog_ms`; `restart_ms` is the
    /// delay the caller should wait before restarting after a trip.
    pub fn new(watchdog_ms: u64, restart_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();
        Self {
            watchdog_ms,
            restart_ms,
            last_data_at_ms: AtomicU64::new(now),
            clock,
        }
    }

    /// Records that data was just observed.
    pub fn touch(&self) {
        self.last_data_at_ms
            .store(self.clock.now_millis(), Ordering::SeqCst);
    }

    /// Milliseconds elapsed since the last `touch`.
    #[must_use]
    pub fn silent_ms(&self) -> u64 {
        self.clock
            .now_millis()
            .saturating_sub(self.last_data_at_ms.load(Ordering::SeqCst))
    }

    /// Returns `true` if `now - lastDataAt > watchdogMs`.
    #[must_use]
    pub fn has_tripped(&self) -> bool {
        self.silent_ms() > self.watchdog_ms
    }

    /// The configured restart delay, for callers scheduling the next attempt.
    #[must_use]
    pub fn restart_delay_ms(&self) -> u64 {
        self.restart_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;

    #[test]
    fn trips_only_after_watchdog_window_elapses() {
        let clock = Arc::new(ManualClock::new(0));
        let wd = Watchdog::new(1_000, 500, clock.clone());
        assert!(!wd.has_tripped());

        clock.advance(999);
        assert!(!wd.has_tripped());

        clock.advance(2);
        assert!(wd.has_tripped());
    }

    #[test]
    fn touch_resets_the_silent_window() {
        let clock = Arc::new(ManualClock::new(0));
        let wd = Watchdog::new(1_000, 500, clock.clone());
        clock.advance(1_500);
        assert!(wd.has_tripped());
        wd.touch();
        assert!(!wd.has_tripped());
        assert_eq!(wd.silent_ms(), 0);
    }
}
