//! Intents (§3 Data Model): the values C3 emits for C4/C5/C6 to gate and send.

use crate::config::IntentKind;

/// Desired hub light state, independent of any scheduler/transport concern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HubIntentState {
    /// Hue, 0-65535.
    pub hue: u16,
    /// Saturation, 0-254.
    pub sat: u8,
    /// Brightness, 0-254.
    pub bri: u8,
    /// CIE xy chromaticity, when preferred over hue/sat.
    pub xy: Option<(f32, f32)>,
    /// Mired color temperature.
    pub ct: Option<u32>,
    /// Whether the light should be on.
    pub on: bool,
    /// Transition time in 100ms units.
    pub transition_time: u16,
}

/// Desired UDP fixture color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UdpIntentColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Dimming percentage, 10-100.
    pub dimming: u8,
}

/// A value produced by the reactive engine describing a desired light state
/// for one light family, carrying routing metadata but not target identities.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Reactive hub light state.
    HubState {
        /// Desired state.
        state: HubIntentState,
        /// Zone token override, or `None` to use the route table.
        zone: Option<String>,
        /// Scheduler rate-guard override for this intent's zone.
        rate_ms: u64,
        /// Bypasses the delta guard when true.
        force_delta: bool,
        /// Scheduler delta-threshold multiplier.
        delta_scale: f32,
    },
    /// Reactive UDP pulse.
    UdpPulse {
        /// Desired color.
        color: UdpIntentColor,
        /// Zone token override, or `None` to use the route table.
        zone: Option<String>,
        /// Scheduler rate-guard override for this intent's zone.
        rate_ms: u64,
        /// Bypasses the delta guard when true.
        force_delta: bool,
        /// Scheduler delta-threshold multiplier.
        delta_scale: f32,
        /// Whether this pulse corresponds to a detected beat.
        beat: bool,
        /// Whether this pulse corresponds to a detected drop.
        drop: bool,
        /// Dominant band driving this pulse, if any (`"low"`, `"mid"`, `"high"`).
        band: Option<&'static str>,
    },
    /// Chat-triggered hub light state; same shape, different route key.
    ChatHubState {
        /// Desired state.
        state: HubIntentState,
        /// Zone token override, or `None` to use the route table.
        zone: Option<String>,
    },
    /// Chat-triggered UDP pulse; same shape, different route key.
    ChatUdpPulse {
        /// Desired color.
        color: UdpIntentColor,
        /// Zone token override, or `None` to use the route table.
        zone: Option<String>,
    },
}

impl Intent {
    /// The route/registry kind this intent resolves zones under.
    #[must_use]
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::HubState { .. } => IntentKind::HubState,
            Self::UdpPulse { .. } => IntentKind::UdpPulse,
            Self::ChatHubState { .. } => IntentKind::ChatHubState,
            Self::ChatUdpPulse { .. } => IntentKind::ChatUdpPulse,
        }
    }

    /// The zone token carried by this intent, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        match self {
            Self::HubState { zone, .. } | Self::ChatHubState { zone, .. } => zone.as_deref(),
            Self::UdpPulse { zone, .. } | Self::ChatUdpPulse { zone, .. } => zone.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_each_variant_to_its_route_key() {
        let hub = Intent::HubState {
            state: HubIntentState {
                hue: 0,
                sat: 0,
                bri: 0,
                xy: None,
                ct: None,
                on: true,
                transition_time: 2,
            },
            zone: None,
            rate_ms: 100,
            force_delta: false,
            delta_scale: 1.0,
        };
        assert_eq!(hub.kind(), IntentKind::HubState);
        assert_eq!(hub.zone(), None);
    }
}
