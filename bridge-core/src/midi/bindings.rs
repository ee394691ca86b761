//! In-memory MIDI binding table (§10.4): maps bound MIDI messages to the
//! control-surface action names listed in §6, gated by velocity.

use std::collections::HashMap;

use crate::config::{MidiBinding, MidiBindingsConfig};

use super::decode::MidiEvent;

/// Built from [`MidiBindingsConfig`]; never written back to disk by this crate.
pub struct MidiBindingTable {
    enabled: bool,
    velocity_threshold: u8,
    bindings: HashMap<String, MidiBinding>,
}

impl MidiBindingTable {
    /// Builds a binding table from a loaded config. Bindings are held
    /// in-memory only; persistence is the host's concern.
    #[must_use]
    pub fn from_config(config: &MidiBindingsConfig) -> Self {
        Self {
            enabled: config.enabled,
            velocity_threshold: config.velocity_threshold,
            bindings: config.bindings.clone(),
        }
    }

    /// Resolves a decoded event to every action it triggers, or an empty
    /// list if MIDI is disabled, no binding matches, or the event's value
    /// falls below both the global and per-binding velocity gate.
    #[must_use]
    pub fn resolve(&self, event: &MidiEvent) -> Vec<&str> {
        if !self.enabled {
            return Vec::new();
        }
        self.bindings
            .iter()
            .filter(|(_, binding)| self.matches(binding, event))
            .map(|(action, _)| action.as_str())
            .collect()
    }

    fn matches(&self, binding: &MidiBinding, event: &MidiEvent) -> bool {
        binding.message_type == event.message_type()
            && binding.number == event.number()
            && binding.channel.map_or(true, |ch| ch == event.channel())
            && event.value() >= binding.min_value.max(self.velocity_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(message_type: &str, number: u8, min_value: u8) -> MidiBinding {
        MidiBinding {
            message_type: message_type.to_string(),
            number,
            channel: None,
            min_value,
        }
    }

    #[test]
    fn disabled_table_resolves_nothing() {
        let mut config = MidiBindingsConfig::default();
        config.enabled = false;
        config.bindings.insert("forceDrop".to_string(), binding("noteOn", 60, 1));
        let table = MidiBindingTable::from_config(&config);
        let event = MidiEvent::NoteOn { channel: 0, note: 60, velocity: 100 };
        assert!(table.resolve(&event).is_empty());
    }

    #[test]
    fn matching_binding_above_threshold_resolves_its_action() {
        let mut config = MidiBindingsConfig::default();
        config.enabled = true;
        config.velocity_threshold = 10;
        config.bindings.insert("forceDrop".to_string(), binding("noteOn", 60, 1));
        let table = MidiBindingTable::from_config(&config);
        let event = MidiEvent::NoteOn { channel: 0, note: 60, velocity: 100 };
        assert_eq!(table.resolve(&event), vec!["forceDrop"]);
    }

    #[test]
    fn velocity_below_global_threshold_is_gated_out() {
        let mut config = MidiBindingsConfig::default();
        config.enabled = true;
        config.velocity_threshold = 80;
        config.bindings.insert("forceDrop".to_string(), binding("noteOn", 60, 1));
        let table = MidiBindingTable::from_config(&config);
        let event = MidiEvent::NoteOn { channel: 0, note: 60, velocity: 50 };
        assert!(table.resolve(&event).is_empty());
    }

    #[test]
    fn mismatched_number_does_not_resolve() {
        let mut config = MidiBindingsConfig::default();
        config.enabled = true;
        config.bindings.insert("forceDrop".to_string(), binding("noteOn", 60, 1));
        let table = MidiBindingTable::from_config(&config);
        let event = MidiEvent::NoteOn { channel: 0, note: 61, velocity: 100 };
        assert!(table.resolve(&event).is_empty());
    }
}
