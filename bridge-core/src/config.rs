//! Persisted configuration schemas.
//!
//! These structs mirror the on-disk YAML schemas the bridge consumes:
//! audio capture settings, the fixture catalog + route table, Twitch chat
//! color bindings, and MIDI bindings. Loading follows the same
//! read-then-parse-then-validate shape as the host's own configuration
//! (see `bridge-server::config`), just scoped to the core's own files.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// Audio configuration (§4.1 / §4.2)
// ─────────────────────────────────────────────────────────────────────────────

/// Per-application isolation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IsolationConfig {
    /// Whether isolation scanning is enabled at all.
    pub enabled: bool,
    /// Preferred application process token.
    pub primary_app: Option<String>,
    /// Fallback application process token.
    pub fallback_app: Option<String>,
    /// If true and neither app is running, emit silence rather than ambient audio.
    pub strict: bool,
    /// Milliseconds between process-table scans.
    pub scan_interval_ms: u64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            primary_app: None,
            fallback_app: None,
            strict: false,
            scan_interval_ms: 2_000,
        }
    }
}

/// Audio capture and feature-extraction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1-8).
    pub channels: u8,
    /// Frames per buffer for the native backend.
    pub frames_per_buffer: u32,
    /// Explicit device id, if known.
    pub device_id: Option<String>,
    /// Case-insensitive substring to match against device names.
    pub device_name_substr: Option<String>,
    /// Path to the external muxer subprocess binary.
    pub muxer_path: Option<String>,
    /// Format string passed to the muxer subprocess.
    pub muxer_format: Option<String>,
    /// One or more muxer input device strings to mix.
    pub muxer_inputs: Vec<String>,
    /// Milliseconds of silence before the watchdog trips.
    pub watchdog_ms: u64,
    /// Milliseconds to wait before restarting after a watchdog trip.
    pub restart_ms: u64,
    /// Low band cutoff (60-500 Hz).
    pub band_low_hz: f32,
    /// Mid band cutoff (700-8000 Hz).
    pub band_mid_hz: f32,
    /// Minimum noise floor used by the absolute-quiet gate.
    pub noise_floor: f32,
    /// Target RMS for the auto-level gain.
    pub target_rms: f32,
    /// Minimum auto-gain multiplier.
    pub min_gain: f32,
    /// Maximum auto-gain multiplier.
    pub max_gain: f32,
    /// Disables automatic gain control when false.
    pub auto_gain_enabled: bool,
    /// Overall output gain multiplier applied after auto-gain.
    pub output_gain: f32,
    /// Per-application isolation settings.
    pub isolation: IsolationConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            frames_per_buffer: 1_024,
            device_id: None,
            device_name_substr: None,
            muxer_path: None,
            muxer_format: None,
            muxer_inputs: Vec::new(),
            watchdog_ms: 2_500,
            restart_ms: 1_000,
            band_low_hz: 150.0,
            band_mid_hz: 2_500.0,
            noise_floor: 0.0015,
            target_rms: 0.18,
            min_gain: 0.5,
            max_gain: 4.0,
            auto_gain_enabled: true,
            output_gain: 1.0,
            isolation: IsolationConfig::default(),
        }
    }
}

impl AudioConfig {
    /// Loads an `AudioConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures & routing (§4.7, §3 "Fixture"/"Route table")
// ─────────────────────────────────────────────────────────────────────────────

/// The family of device a fixture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    /// Hue-style bridge/hub fixture (REST + optional DTLS-PSK stream).
    Hub,
    /// Directly addressed UDP fixture (WiZ-style).
    Udp,
    /// Custom/standalone-only fixture addressed like a UDP device but never
    /// driven by the reactive engine directly, only by the standalone animator.
    Mod,
}

impl Brand {
    /// The brand's own literal zone token (e.g. a route table or chat zone
    /// entry of `"hub"`), distinct from the family nickname (`"hue"`/`"wiz"`).
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Hub => "hub",
            Self::Udp => "udp",
            Self::Mod => "mod",
        }
    }
}

/// The kind of intent a route table entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentKind {
    /// Reactive hub light state.
    HubState,
    /// Reactive UDP pulse.
    UdpPulse,
    /// Chat-triggered hub light state.
    ChatHubState,
    /// Chat-triggered UDP pulse.
    ChatUdpPulse,
}

impl IntentKind {
    /// The route-table key this kind is persisted under, matching the
    /// camelCase serde rendering used by `intentRoutes` in the YAML schema.
    #[must_use]
    pub fn route_key(self) -> &'static str {
        match self {
            Self::HubState => "hubState",
            Self::UdpPulse => "udpPulse",
            Self::ChatHubState => "chatHubState",
            Self::ChatUdpPulse => "chatUdpPulse",
        }
    }

    /// The brand this intent kind is routed to.
    #[must_use]
    pub fn brand(self) -> Brand {
        match self {
            Self::HubState | Self::ChatHubState => Brand::Hub,
            Self::UdpPulse | Self::ChatUdpPulse => Brand::Udp,
        }
    }

    /// Whether this intent kind originates from chat, rather than the
    /// reactive engine — determines whether routing gates on `twitchEnabled`
    /// or `engineEnabled` (§4.7 step 3).
    #[must_use]
    pub fn is_chat(self) -> bool {
        matches!(self, Self::ChatHubState | Self::ChatUdpPulse)
    }
}

/// Brand-specific network addressing for a fixture.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureAddressing {
    /// Fixture host IP (validated as private IPv4 when the fixture is enabled).
    pub host: Option<String>,
    /// UDP/REST port. For hub fixtures this is typically the bridge's HTTPS port.
    pub port: Option<u16>,
    /// Hub API username (hub fixtures only).
    pub username: Option<String>,
    /// Hub light id within the bridge (hub fixtures only).
    pub light_id: Option<String>,
    /// Hub entertainment-area id used for STREAM mode (hub fixtures only).
    pub entertainment_area_id: Option<String>,
    /// Hub client key for DTLS-PSK, hex-encoded (hub fixtures only).
    pub client_key_hex: Option<String>,
}

/// A single fixture entry as persisted in the fixtures config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRecord {
    /// Stable fixture id.
    pub id: String,
    /// Device family.
    pub brand: Brand,
    /// Zone token this fixture belongs to.
    pub zone: String,
    /// Whether the fixture participates at all.
    pub enabled: bool,
    /// Whether the reactive engine may target this fixture.
    pub engine_enabled: bool,
    /// Whether Twitch chat color commands may target this fixture.
    pub twitch_enabled: bool,
    /// Whether the standalone animator may target this fixture.
    pub custom_enabled: bool,
    /// Brand-specific addressing.
    pub addressing: FixtureAddressing,
}

impl FixtureRecord {
    /// A fixture is "configured" when every brand-specific address field it
    /// needs is present and the host passes the private-IPv4 check.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        let Some(host) = self.addressing.host.as_deref() else {
            return false;
        };
        let Ok(ip) = host.parse::<std::net::IpAddr>() else {
            return false;
        };
        if crate::utils::validate_fixture_ip(&ip).is_err() {
            return false;
        }
        match self.brand {
            Brand::Hub => {
                self.addressing.username.is_some() && self.addressing.light_id.is_some()
            }
            Brand::Udp | Brand::Mod => self.addressing.port.is_some(),
        }
    }

    /// The alias set this fixture matches against a route token, per §4.7.
    #[must_use]
    pub fn alias_set(&self) -> Vec<String> {
        let mut aliases = vec![
            self.zone.clone(),
            "all".to_string(),
            "*".to_string(),
            self.brand.token().to_string(),
        ];
        match self.brand {
            Brand::Hub => aliases.push("hue".to_string()),
            Brand::Udp | Brand::Mod => {
                aliases.push("wiz".to_string());
                if self.custom_enabled {
                    aliases.push("custom".to_string());
                }
            }
        }
        aliases
    }
}

/// Persisted fixtures + route table schema.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixturesConfig {
    /// Monotonic version, bumped on every save by the authoring collaborator.
    pub version: u64,
    /// Intent-kind to zone-token route table.
    pub intent_routes: HashMap<String, String>,
    /// The fixture catalog.
    pub fixtures: Vec<FixtureRecord>,
}

impl FixturesConfig {
    /// Loads a `FixturesConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Twitch chat color (§6 "Persisted state layout")
// ─────────────────────────────────────────────────────────────────────────────

/// Rave-off behavior applied when chat color commands are disabled mid-stream.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RaveOffConfig {
    /// Restore the previous reactive state instead of going dark.
    pub restore_previous: bool,
    /// Milliseconds to fade out over.
    pub fade_ms: u64,
}

/// Persisted Twitch chat-color configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TwitchColorConfig {
    /// Monotonic version.
    pub version: u64,
    /// Default target fixture id or zone token when a command doesn't name one.
    pub default_target: Option<String>,
    /// Whether `default_target` is chosen automatically (first configured fixture).
    pub auto_default_target: bool,
    /// Per-brand command prefixes, e.g. `{"hue": "!hue", "wiz": "!wiz"}`.
    pub prefixes: HashMap<String, String>,
    /// Per-fixture command prefix overrides.
    pub fixture_prefixes: HashMap<String, String>,
    /// Behavior when chat color mode is turned off.
    pub rave_off: RaveOffConfig,
}

impl TwitchColorConfig {
    /// Loads a `TwitchColorConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MIDI bindings (§10.4)
// ─────────────────────────────────────────────────────────────────────────────

/// One bound MIDI trigger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiBinding {
    /// Message type this binding listens for (`noteOn`, `noteOff`, `cc`).
    #[serde(rename = "type")]
    pub message_type: String,
    /// Note or controller number (0-127).
    pub number: u8,
    /// Channel (0-15), or `None` to match any channel.
    pub channel: Option<u8>,
    /// Minimum value (velocity or CC value) to trigger the action.
    pub min_value: u8,
}

/// Persisted MIDI bindings schema.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MidiBindingsConfig {
    /// Monotonic version.
    pub version: u64,
    /// Whether MIDI input is enabled at all.
    pub enabled: bool,
    /// Explicit device index, if known.
    pub device_index: Option<u32>,
    /// Case-insensitive substring to match against device names.
    pub device_match: Option<String>,
    /// Velocity/CC-value gate below which triggers are ignored.
    pub velocity_threshold: u8,
    /// Action name to binding.
    pub bindings: HashMap<String, MidiBinding>,
}

impl MidiBindingsConfig {
    /// Loads a `MidiBindingsConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared loader
// ─────────────────────────────────────────────────────────────────────────────

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    #[test]
    fn audio_config_defaults_are_sane() {
        let cfg = AudioConfig::default();
        assert_eq!(cfg.sample_rate, 48_000);
        assert!(cfg.auto_gain_enabled);
        assert!(!cfg.isolation.enabled);
    }

    #[test]
    fn fixtures_config_round_trips_through_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
version: 3
intentRoutes:
  hubState: "all"
fixtures:
  - id: "living-room-hub-1"
    brand: "hub"
    zone: "living-room"
    enabled: true
    engineEnabled: true
    twitchEnabled: false
    customEnabled: false
    addressing:
      host: "192.168.1.50"
      port: 443
      username: "abc123"
      lightId: "1"
      entertainmentAreaId: null
      clientKeyHex: null
"#
        )
        .unwrap();

        let cfg = FixturesConfig::load(file.path()).expect("should parse");
        assert_eq!(cfg.version, 3);
        assert_eq!(cfg.fixtures.len(), 1);
        assert_eq!(cfg.fixtures[0].brand, Brand::Hub);
        assert_eq!(cfg.intent_routes.get("hubState").unwrap(), "all");
    }

    #[test]
    fn load_missing_file_is_load_error() {
        let err = AudioConfig::load(Path::new("/nonexistent/path.yaml")).unwrap_err();
        assert_eq!(err.code(), "config_load_failed");
    }

    #[test]
    fn placeholder_host_is_detected_separately_from_parse_errors() {
        assert!(ConfigError::is_placeholder("x.x.x.x"));
    }

    #[test]
    fn alias_set_always_includes_the_brand_token() {
        let fixture = FixtureRecord {
            id: "a".to_string(),
            brand: Brand::Hub,
            zone: "living-room".to_string(),
            enabled: true,
            engine_enabled: true,
            twitch_enabled: false,
            custom_enabled: false,
            addressing: FixtureAddressing {
                host: None,
                port: None,
                username: None,
                light_id: None,
                entertainment_area_id: None,
                client_key_hex: None,
            },
        };
        let aliases = fixture.alias_set();
        assert!(aliases.contains(&"hub".to_string()));
        assert!(aliases.contains(&"hue".to_string()));
    }

    #[test]
    fn brand_token_is_distinct_from_family_nickname() {
        assert_eq!(Brand::Hub.token(), "hub");
        assert_eq!(Brand::Udp.token(), "udp");
        assert_eq!(Brand::Mod.token(), "mod");
    }
}
