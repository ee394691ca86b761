//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the status surface binds to.
    /// Override: `BRIDGE_BIND_PORT`
    pub bind_port: u16,

    /// Path to the fixture catalog YAML file.
    /// Override: `BRIDGE_FIXTURES_FILE`
    pub fixtures_file: Option<PathBuf>,

    /// Path to the audio capture config YAML file.
    /// Override: `BRIDGE_AUDIO_FILE`
    pub audio_file: Option<PathBuf>,

    /// Path to the MIDI bindings YAML file.
    /// Override: `BRIDGE_MIDI_FILE`
    pub midi_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_port: 7880,
            fixtures_file: None,
            audio_file: None,
            midi_file: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BRIDGE_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("BRIDGE_FIXTURES_FILE") {
            self.fixtures_file = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("BRIDGE_AUDIO_FILE") {
            self.audio_file = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("BRIDGE_MIDI_FILE") {
            self.midi_file = Some(PathBuf::from(val));
        }
    }

    /// Loads the audio, fixtures, and MIDI schemas this config points at,
    /// falling back to defaults for any file that was not configured.
    pub fn load_bootstrap_config(&self) -> Result<bridge_core::BootstrapConfig> {
        let audio = match &self.audio_file {
            Some(path) => bridge_core::AudioConfig::load(path)
                .with_context(|| format!("failed to load audio config: {}", path.display()))?,
            None => bridge_core::AudioConfig::default(),
        };
        let fixtures = match &self.fixtures_file {
            Some(path) => bridge_core::FixturesConfig::load(path)
                .with_context(|| format!("failed to load fixtures config: {}", path.display()))?,
            None => bridge_core::FixturesConfig::default(),
        };
        let midi = match &self.midi_file {
            Some(path) => bridge_core::MidiBindingsConfig::load(path)
                .with_context(|| format!("failed to load midi bindings: {}", path.display()))?,
            None => bridge_core::MidiBindingsConfig::default(),
        };

        Ok(bridge_core::BootstrapConfig {
            audio,
            fixtures,
            midi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_bind_port() {
        assert_eq!(ServerConfig::default().bind_port, 7880);
    }

    #[test]
    fn load_without_path_returns_default() {
        let config = ServerConfig::load(None).expect("default load should succeed");
        assert_eq!(config.bind_port, 7880);
    }

    #[test]
    fn load_parses_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(&path, "bind_port: 9000\n").unwrap();
        let config = ServerConfig::load(Some(&path)).expect("yaml load should succeed");
        assert_eq!(config.bind_port, 9000);
    }

    #[test]
    fn bootstrap_config_falls_back_to_defaults_when_no_files_set() {
        let config = ServerConfig::default();
        let bootstrap = config.load_bootstrap_config().expect("should succeed with defaults");
        assert_eq!(bootstrap.audio.sample_rate, 48_000);
    }
}
