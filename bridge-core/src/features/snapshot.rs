//! Feature snapshot type produced once per processed audio frame.

/// Per-frame audio feature snapshot.
///
/// Ephemeral: consumers (the reactive engine) must not retain references
/// beyond one tick.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSnapshot {
    /// Soft-limited combined output level, `[0, 1]`.
    pub level: f32,
    /// Peak absolute sample value this frame, `[0, 1]`.
    pub peak: f32,
    /// Root-mean-square of this frame, `[0, 1]`.
    pub rms: f32,
    /// Low-band normalized energy; `low + mid + high ≈ rms`.
    pub band_low: f32,
    /// Mid-band normalized energy.
    pub band_mid: f32,
    /// High-band normalized energy.
    pub band_high: f32,
    /// Positive derivative of the fast envelope, smoothed.
    pub transient: f32,
    /// Sum of positive per-band deltas vs. the prior frame, clipped to `[0, 1]`.
    pub spectral_flux: f32,
    /// Zero-crossing rate, `[0, 1]`.
    pub zcr: f32,
    /// Current auto-level gain multiplier.
    pub auto_gain: f32,
    /// Current adaptive noise floor.
    pub adaptive_floor: f32,
    /// Current adaptive ceiling.
    pub adaptive_ceil: f32,
    /// Estimated tempo in BPM, if the beat estimator has converged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm_estimate: Option<f32>,
    /// Confidence of the current beat estimate, `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beat_confidence: Option<f32>,
}
