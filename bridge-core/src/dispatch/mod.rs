//! Intent dispatch: wires C3's `Intent` stream through C7 (routing), C4
//! (scheduling), and C5/C6 (transports). Kept separate from `bootstrap` so
//! the composition root stays a thin wiring list.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::config::{Brand, FixtureRecord};
use crate::engine::{HubIntentState, Intent, UdpIntentColor};
use crate::error::DispatchError;
use crate::registry::FixtureRegistry;
use crate::scheduler::{
    DeltaState, HubLightState, Scheduler, SchedulerOptions, SchedulerTelemetry, UdpPulseState,
};
use crate::transport::hub::{ChannelColor, HubRestTarget, HubWireState};
use crate::transport::{HubTransport, RepeatPolicy, UdpTransport};

/// Per-zone scheduler counters for both fixture families, for the status surface.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerTelemetrySnapshot {
    /// Hub scheduler telemetry, keyed by zone.
    pub hub: HashMap<String, SchedulerTelemetry>,
    /// UDP scheduler telemetry, keyed by zone.
    pub udp: HashMap<String, SchedulerTelemetry>,
}

/// Resolves intents to fixtures and drives them through the gated
/// schedulers onto the correct transport.
pub struct Dispatcher {
    registry: Arc<FixtureRegistry>,
    hub_transport: Arc<HubTransport>,
    udp_transport: Arc<UdpTransport>,
    hub_schedulers: DashMap<String, Arc<Scheduler<HubLightState>>>,
    udp_schedulers: DashMap<String, Arc<Scheduler<UdpPulseState>>>,
}

impl Dispatcher {
    /// Builds a dispatcher over the given registry and transports.
    #[must_use]
    pub fn new(
        registry: Arc<FixtureRegistry>,
        hub_transport: Arc<HubTransport>,
        udp_transport: Arc<UdpTransport>,
    ) -> Self {
        Self {
            registry,
            hub_transport,
            udp_transport,
            hub_schedulers: DashMap::new(),
            udp_schedulers: DashMap::new(),
        }
    }

    /// Resolves `intent` to its target fixtures and dispatches to each,
    /// respecting per-zone×brand scheduler gating.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), DispatchError> {
        let kind = intent.kind();
        let targets = self.registry.resolve_zone(kind, intent.zone());
        if targets.is_empty() {
            let zone = intent.zone().unwrap_or("<route-table>").to_string();
            tracing::warn!(zone, ?kind, "no fixtures matched intent zone");
            return Err(DispatchError::NoTargets(zone));
        }

        match &intent {
            Intent::HubState { state, rate_ms, force_delta, delta_scale, .. } => {
                self.dispatch_hub(&targets, *state, *rate_ms, *force_delta, *delta_scale).await;
            }
            Intent::ChatHubState { state, .. } => {
                self.dispatch_hub(&targets, *state, 0, true, 1.0).await;
            }
            Intent::UdpPulse { color, rate_ms, force_delta, delta_scale, beat, drop, .. } => {
                let boost = if *drop { 1.0 } else if *beat { 0.5 } else { 0.0 };
                self.dispatch_udp(&targets, *color, *rate_ms, *force_delta, *delta_scale, boost).await;
            }
            Intent::ChatUdpPulse { color, .. } => {
                self.dispatch_udp(&targets, *color, 0, true, 1.0, 0.0).await;
            }
        }

        Ok(())
    }

    async fn dispatch_hub(
        &self,
        targets: &[FixtureRecord],
        state: HubIntentState,
        rate_ms: u64,
        force_delta: bool,
        delta_scale: f32,
    ) {
        let rest_active = self.hub_transport.is_rest_active();
        let light = HubLightState { hue: state.hue, sat: state.sat, bri: state.bri };

        let mut stream_frame = Vec::with_capacity(targets.len());
        for fixture in targets {
            if fixture.brand != Brand::Hub || !fixture.is_configured() {
                continue;
            }
            let scheduler = self.hub_scheduler_for(&fixture.zone);
            let options = hub_options(rate_ms, force_delta, delta_scale);
            if !scheduler.should_send(&light, &options) {
                continue;
            }

            if rest_active {
                let target = HubRestTarget {
                    host: fixture.addressing.host.clone().unwrap_or_default(),
                    username: fixture.addressing.username.clone().unwrap_or_default(),
                    light_id: fixture.addressing.light_id.clone().unwrap_or_default(),
                };
                let wire = HubWireState {
                    on: state.on,
                    hue: state.hue,
                    sat: state.sat,
                    bri: state.bri,
                    xy: state.xy,
                    ct: state.ct,
                    transition_time: state.transition_time,
                };
                self.hub_transport.send_rest(target, wire);
            } else {
                stream_frame.push(ChannelColor {
                    r: hsv_to_r(state.hue, state.sat, state.bri),
                    g: hsv_to_g(state.hue, state.sat, state.bri),
                    b: hsv_to_b(state.hue, state.sat, state.bri),
                });
            }
        }

        if !rest_active && !stream_frame.is_empty() {
            if let Err(err) = self.hub_transport.send_stream_frame(&stream_frame) {
                tracing::warn!(error = %err, "stream frame send failed, transport will fall back to REST");
            }
        }
    }

    async fn dispatch_udp(
        &self,
        targets: &[FixtureRecord],
        color: UdpIntentColor,
        rate_ms: u64,
        force_delta: bool,
        delta_scale: f32,
        trigger_boost: f32,
    ) {
        let pulse = UdpPulseState { r: color.r, g: color.g, b: color.b, dim: color.dimming };
        for fixture in targets {
            if !matches!(fixture.brand, Brand::Udp | Brand::Mod) || !fixture.is_configured() {
                continue;
            }
            let scheduler = self.udp_scheduler_for(&fixture.zone);
            let mut options = udp_options(rate_ms, force_delta, delta_scale);
            options.trigger_boost = trigger_boost;
            if !scheduler.should_send(&pulse, &options) {
                continue;
            }

            let Some(addr) = fixture_socket_addr(fixture) else {
                continue;
            };
            let wire = crate::transport::UdpWireState {
                r: color.r,
                g: color.g,
                b: color.b,
                dimming: color.dimming,
                temp: None,
                on: true,
            };
            if let Err(err) = self.udp_transport.send(addr, wire, RepeatPolicy::default()).await {
                tracing::warn!(fixture = fixture.id, error = %err, "udp send failed");
            }
        }
    }

    /// Current scheduler counters across every zone seen so far.
    #[must_use]
    pub fn scheduler_telemetry(&self) -> SchedulerTelemetrySnapshot {
        SchedulerTelemetrySnapshot {
            hub: self
                .hub_schedulers
                .iter()
                .map(|e| (e.key().clone(), e.value().telemetry()))
                .collect(),
            udp: self
                .udp_schedulers
                .iter()
                .map(|e| (e.key().clone(), e.value().telemetry()))
                .collect(),
        }
    }

    fn hub_scheduler_for(&self, zone: &str) -> Arc<Scheduler<HubLightState>> {
        Arc::clone(
            self.hub_schedulers
                .entry(zone.to_string())
                .or_insert_with(|| Arc::new(Scheduler::new(zone.to_string())))
                .value(),
        )
    }

    fn udp_scheduler_for(&self, zone: &str) -> Arc<Scheduler<UdpPulseState>> {
        Arc::clone(
            self.udp_schedulers
                .entry(zone.to_string())
                .or_insert_with(|| Arc::new(Scheduler::new(zone.to_string())))
                .value(),
        )
    }
}

fn hub_options(rate_ms: u64, force_delta: bool, delta_scale: f32) -> SchedulerOptions {
    let mut options = HubLightState::default_options();
    if rate_ms > 0 {
        options.min_interval_ms = rate_ms;
    }
    options.force_delta = force_delta;
    options.delta_scale = delta_scale;
    options
}

fn udp_options(rate_ms: u64, force_delta: bool, delta_scale: f32) -> SchedulerOptions {
    let mut options = UdpPulseState::default_options();
    if rate_ms > 0 {
        options.min_interval_ms = rate_ms;
    }
    options.force_delta = force_delta;
    options.delta_scale = delta_scale;
    options
}

fn fixture_socket_addr(fixture: &FixtureRecord) -> Option<SocketAddr> {
    let host = fixture.addressing.host.as_deref()?;
    let port = fixture.addressing.port?;
    format!("{host}:{port}").parse().ok()
}

/// Converts a hub-style `{hue: 0..65535, sat: 0..254, bri: 0..254}` to sRGB,
/// for the one case (entertainment streaming) where the wire format needs
/// RGB instead of HSV.
fn hsv_to_rgb(hue: u16, sat: u8, bri: u8) -> (u8, u8, u8) {
    let h = f32::from(hue) / 65535.0 * 360.0;
    let s = f32::from(sat) / 254.0;
    let v = f32::from(bri) / 254.0;
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0..=59 => (c, x, 0.0),
        60..=119 => (x, c, 0.0),
        120..=179 => (0.0, c, x),
        180..=239 => (0.0, x, c),
        240..=299 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

fn hsv_to_r(hue: u16, sat: u8, bri: u8) -> u8 {
    hsv_to_rgb(hue, sat, bri).0
}
fn hsv_to_g(hue: u16, sat: u8, bri: u8) -> u8 {
    hsv_to_rgb(hue, sat, bri).1
}
fn hsv_to_b(hue: u16, sat: u8, bri: u8) -> u8 {
    hsv_to_rgb(hue, sat, bri).2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_to_rgb_full_brightness_red_is_pure_red() {
        assert_eq!(hsv_to_rgb(0, 254, 254), (254, 0, 0));
    }

    #[test]
    fn fixture_socket_addr_requires_host_and_port() {
        let mut fixture = sample_fixture();
        fixture.addressing.port = None;
        assert!(fixture_socket_addr(&fixture).is_none());
    }

    #[test]
    fn fixture_socket_addr_combines_host_and_port() {
        let fixture = sample_fixture();
        assert_eq!(
            fixture_socket_addr(&fixture),
            Some("192.168.1.50:38899".parse().unwrap())
        );
    }

    fn sample_fixture() -> FixtureRecord {
        FixtureRecord {
            id: "f1".to_string(),
            brand: Brand::Udp,
            zone: "desk".to_string(),
            enabled: true,
            engine_enabled: true,
            twitch_enabled: false,
            custom_enabled: false,
            addressing: crate::config::FixtureAddressing {
                host: Some("192.168.1.50".to_string()),
                port: Some(38899),
                username: None,
                light_id: None,
                entertainment_area_id: None,
                client_key_hex: None,
            },
        }
    }
}
