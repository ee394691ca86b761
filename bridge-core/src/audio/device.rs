//! Device selection policy for the native capture backend.

use crate::config::AudioConfig;

/// A candidate capture device, as reported by the native backend's host API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend-assigned device id.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// True if the device can be used as an audio input (loopback counts).
    pub is_input: bool,
}

/// Keywords tried in priority order when no explicit device is configured.
const AUTO_PICK_KEYWORDS: &[&str] = &["loopback", "stereo mix", "cable output", "monitor of", "mix"];

/// Selects a device from `devices` per the configured policy:
/// 1. explicit device id
/// 2. case-insensitive substring match on device name
/// 3. auto-pick by keyword priority list
/// 4. first input device
#[must_use]
pub fn select_device<'a>(config: &AudioConfig, devices: &'a [DeviceInfo]) -> Option<&'a DeviceInfo> {
    if let Some(id) = &config.device_id {
        if let Some(found) = devices.iter().find(|d| &d.id == id) {
            return Some(found);
        }
    }

    if let Some(substr) = &config.device_name_substr {
        let needle = substr.to_ascii_lowercase();
        if let Some(found) = devices
            .iter()
            .find(|d| d.is_input && d.name.to_ascii_lowercase().contains(&needle))
        {
            return Some(found);
        }
    }

    for keyword in AUTO_PICK_KEYWORDS {
        if let Some(found) = devices
            .iter()
            .find(|d| d.is_input && d.name.to_ascii_lowercase().contains(keyword))
        {
            return Some(found);
        }
    }

    devices.iter().find(|d| d.is_input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str) -> DeviceInfo {
        DeviceInfo {
            id: id.into(),
            name: name.into(),
            is_input: true,
        }
    }

    #[test]
    fn explicit_device_id_wins() {
        let mut config = AudioConfig::default();
        config.device_id = Some("dev-2".into());
        let devices = vec![device("dev-1", "Microphone"), device("dev-2", "Line In")];
        assert_eq!(select_device(&config, &devices).unwrap().id, "dev-2");
    }

    #[test]
    fn name_substring_match_is_case_insensitive() {
        let mut config = AudioConfig::default();
        config.device_name_substr = Some("LOOPBACK".into());
        let devices = vec![device("dev-1", "Microphone"), device("dev-2", "System Loopback")];
        assert_eq!(select_device(&config, &devices).unwrap().id, "dev-2");
    }

    #[test]
    fn auto_pick_prefers_loopback_keyword_over_mix() {
        let config = AudioConfig::default();
        let devices = vec![device("dev-1", "Stereo Mix"), device("dev-2", "Loopback Audio")];
        assert_eq!(select_device(&config, &devices).unwrap().id, "dev-2");
    }

    #[test]
    fn falls_back_to_first_input_device() {
        let config = AudioConfig::default();
        let devices = vec![device("dev-1", "Webcam Mic"), device("dev-2", "Random Device")];
        assert_eq!(select_device(&config, &devices).unwrap().id, "dev-1");
    }

    #[test]
    fn returns_none_when_no_input_devices() {
        let config = AudioConfig::default();
        let mut output_only = device("dev-1", "Speakers");
        output_only.is_input = false;
        assert!(select_device(&config, &[output_only]).is_none());
    }
}
