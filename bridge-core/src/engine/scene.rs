//! Scene → motion policy selection for the reactive engine.

/// The reactive engine's motion policy, chosen by the active scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPolicy {
    /// Linear hue sweep across the palette.
    Sweep,
    /// Phase bounces at 0/1, direction flips.
    Bounce,
    /// Brightness pulses with the palette held static.
    Pulse,
    /// Probabilistic jumps between palette anchors.
    Spark,
}

/// Resolves a scene id to its motion policy. `None` means "auto": the engine
/// picks a policy from genre + behavior instead of a fixed scene.
///
/// Unknown scene ids fall back to `Sweep` (the "auto/edm" motion default)
/// rather than panicking, per §4.3's fallback requirement.
#[must_use]
pub fn policy_for_scene(scene: Option<&str>) -> MotionPolicy {
    match scene.map(str::to_ascii_lowercase).as_deref() {
        None => MotionPolicy::Sweep,
        Some("idle_soft") => MotionPolicy::Pulse,
        Some("flow") => MotionPolicy::Sweep,
        Some("pulse_drive") => MotionPolicy::Bounce,
        Some("spark") => MotionPolicy::Spark,
        Some(_) => MotionPolicy::Sweep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_scene_defaults_to_sweep() {
        assert_eq!(policy_for_scene(None), MotionPolicy::Sweep);
    }

    #[test]
    fn unknown_scene_falls_back_to_sweep_instead_of_panicking() {
        assert_eq!(policy_for_scene(Some("not-a-real-scene")), MotionPolicy::Sweep);
    }

    #[test]
    fn known_scenes_map_to_their_documented_policy() {
        assert_eq!(policy_for_scene(Some("idle_soft")), MotionPolicy::Pulse);
        assert_eq!(policy_for_scene(Some("pulse_drive")), MotionPolicy::Bounce);
        assert_eq!(policy_for_scene(Some("spark")), MotionPolicy::Spark);
    }
}
