//! Scheduler options, telemetry, and the per-state delta contract.

/// Tunables for one `should_send` decision.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Minimum milliseconds between accepted sends (the rate guard).
    pub min_interval_ms: u64,
    /// Maximum milliseconds of silence before a heartbeat is forced through.
    pub max_silence_ms: u64,
    /// Bypasses the delta guard when set (still respects the rate guard).
    pub force_delta: bool,
    /// Multiplier applied to the default per-component delta thresholds.
    pub delta_scale: f32,
    /// Narrows delta thresholds under high reactivity, `[0, 1]`.
    pub trigger_boost: f32,
}

/// Running counters for one scheduler instance, exposed via `getTelemetry()`.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerTelemetry {
    /// Accepted sends (including forced heartbeats).
    pub sent: u64,
    /// Rejections from the rate guard.
    pub skipped_rate: u64,
    /// Rejections from the delta guard.
    pub skipped_delta: u64,
    /// Accepted sends forced through by the silence heartbeat.
    pub forced_heartbeat: u64,
}

/// A per-zone light state that knows its own delta thresholds.
///
/// Implemented once per fixture family (hub/UDP) with that family's default
/// component deltas baked in; `within_limits` scales them by the caller's
/// `scale` (delta_scale × rate-reactive-scale × trigger-boost term).
pub trait DeltaState: Clone {
    /// Returns `true` if every component's delta from `other` is within the
    /// scaled per-component threshold — i.e. the change is small enough to skip.
    fn within_limits(&self, other: &Self, scale: f32) -> bool;

    /// This family's default scheduler options.
    fn default_options() -> SchedulerOptions;
}

/// `rateReactiveScale`: 0.72 at ≤105ms, 0.84 at ≤140ms, 0.94 at ≤190ms, else 1.
#[must_use]
pub fn rate_reactive_scale(min_interval_ms: u64) -> f32 {
    if min_interval_ms <= 105 {
        0.72
    } else if min_interval_ms <= 140 {
        0.84
    } else if min_interval_ms <= 190 {
        0.94
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_reactive_scale_buckets() {
        assert_eq!(rate_reactive_scale(90), 0.72);
        assert_eq!(rate_reactive_scale(105), 0.72);
        assert_eq!(rate_reactive_scale(120), 0.84);
        assert_eq!(rate_reactive_scale(180), 0.94);
        assert_eq!(rate_reactive_scale(218), 1.0);
    }
}
