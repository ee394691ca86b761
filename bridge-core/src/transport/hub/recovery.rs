//! Exponential backoff schedule for hub stream recovery attempts.

/// Backoff sequence in milliseconds: `5s, 10s, 20s, 40s`, capped at 60s.
const BACKOFF_STEPS_MS: [u64; 4] = [5_000, 10_000, 20_000, 40_000];
const BACKOFF_CAP_MS: u64 = 60_000;

/// Returns the delay before the next recovery attempt, given the number of
/// consecutive failures so far (0 = first failure).
#[must_use]
pub fn recovery_delay_ms(consecutive_failures: u32) -> u64 {
    BACKOFF_STEPS_MS
        .get(consecutive_failures as usize)
        .copied()
        .unwrap_or(BACKOFF_CAP_MS)
}

/// Per-attempt connect timeout and mode, per §4.5's escalation: two "forced"
/// attempts with growing timeouts, then up to two "legacy" retries.
#[derive(Debug, Clone, Copy)]
pub struct ConnectAttempt {
    /// Connect timeout for this attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Whether this attempt uses the legacy (slower, more compatible) handshake path.
    pub legacy: bool,
}

const FORCED_ATTEMPTS: [u64; 2] = [6_500, 9_000];
const LEGACY_ATTEMPTS: [u64; 2] = [8_000, 12_000];

/// Returns the attempt plan for the given zero-based attempt index within one
/// connect cycle, or `None` once all attempts are exhausted.
#[must_use]
pub fn connect_attempt(index: usize) -> Option<ConnectAttempt> {
    if let Some(&timeout_ms) = FORCED_ATTEMPTS.get(index) {
        return Some(ConnectAttempt { timeout_ms, legacy: false });
    }
    let legacy_index = index - FORCED_ATTEMPTS.len();
    LEGACY_ATTEMPTS
        .get(legacy_index)
        .map(|&timeout_ms| ConnectAttempt { timeout_ms, legacy: true })
}

/// Pre-connect teardown wait between attempts: `280 + i·180 + area·140` ms.
#[must_use]
pub fn inter_attempt_wait_ms(attempt_index: u32, area_index: u32) -> u64 {
    280 + u64::from(attempt_index) * 180 + u64::from(area_index) * 140
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_escalates_then_caps() {
        assert_eq!(recovery_delay_ms(0), 5_000);
        assert_eq!(recovery_delay_ms(1), 10_000);
        assert_eq!(recovery_delay_ms(2), 20_000);
        assert_eq!(recovery_delay_ms(3), 40_000);
        assert_eq!(recovery_delay_ms(4), 60_000);
        assert_eq!(recovery_delay_ms(100), 60_000);
    }

    #[test]
    fn connect_attempts_escalate_forced_then_legacy() {
        assert_eq!(connect_attempt(0).unwrap().timeout_ms, 6_500);
        assert!(!connect_attempt(0).unwrap().legacy);
        assert_eq!(connect_attempt(2).unwrap().timeout_ms, 8_000);
        assert!(connect_attempt(2).unwrap().legacy);
        assert!(connect_attempt(4).is_none());
    }
}
