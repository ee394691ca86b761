//! Raw channel-voice MIDI byte decoding (§6, §10.4).

const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CC: u8 = 0xB0;

/// A decoded channel-voice MIDI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// `0x90`: note on. Velocity `0` is treated as note-off by convention.
    NoteOn {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Note number, 0-127.
        note: u8,
        /// Velocity, 0-127.
        velocity: u8,
    },
    /// `0x80`: note off.
    NoteOff {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Note number, 0-127.
        note: u8,
    },
    /// `0xB0`: control change.
    ControlChange {
        /// MIDI channel, 0-15.
        channel: u8,
        /// Controller number, 0-127.
        controller: u8,
        /// Controller value, 0-127.
        value: u8,
    },
}

impl MidiEvent {
    /// The binding-table message type string this event matches
    /// (`"noteOn"`, `"noteOff"`, `"cc"`).
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::NoteOn { .. } => "noteOn",
            Self::NoteOff { .. } => "noteOff",
            Self::ControlChange { .. } => "cc",
        }
    }

    /// The binding-table number this event matches (note or controller).
    #[must_use]
    pub fn number(&self) -> u8 {
        match self {
            Self::NoteOn { note, .. } | Self::NoteOff { note, .. } => *note,
            Self::ControlChange { controller, .. } => *controller,
        }
    }

    /// The MIDI channel this event arrived on.
    #[must_use]
    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => *channel,
        }
    }

    /// The event's trigger value (velocity or CC value), used for the
    /// `velocityThreshold` gate.
    #[must_use]
    pub fn value(&self) -> u8 {
        match self {
            Self::NoteOn { velocity, .. } => *velocity,
            Self::NoteOff { .. } => 0,
            Self::ControlChange { value, .. } => *value,
        }
    }
}

/// Decodes one 3-byte channel-voice message. Returns `None` for running
/// status, system messages, or a malformed/short slice — the decoder never
/// panics on untrusted input from a host-provided byte stream.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<MidiEvent> {
    let &[status, data1, data2] = bytes else {
        return None;
    };
    let channel = status & 0x0F;
    match status & 0xF0 {
        STATUS_NOTE_ON if data2 == 0 => Some(MidiEvent::NoteOff { channel, note: data1 }),
        STATUS_NOTE_ON => Some(MidiEvent::NoteOn {
            channel,
            note: data1,
            velocity: data2,
        }),
        STATUS_NOTE_OFF => Some(MidiEvent::NoteOff { channel, note: data1 }),
        STATUS_CC => Some(MidiEvent::ControlChange {
            channel,
            controller: data1,
            value: data2,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_with_zero_velocity_decodes_as_note_off() {
        let event = decode(&[0x90, 60, 0]).unwrap();
        assert_eq!(event, MidiEvent::NoteOff { channel: 0, note: 60 });
    }

    #[test]
    fn note_on_decodes_channel_note_and_velocity() {
        let event = decode(&[0x91, 60, 100]).unwrap();
        assert_eq!(
            event,
            MidiEvent::NoteOn {
                channel: 1,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn control_change_decodes_controller_and_value() {
        let event = decode(&[0xB0, 7, 64]).unwrap();
        assert_eq!(
            event,
            MidiEvent::ControlChange {
                channel: 0,
                controller: 7,
                value: 64
            }
        );
    }

    #[test]
    fn unrecognized_status_bytes_decode_to_none() {
        assert_eq!(decode(&[0xF0, 1, 2]), None);
        assert_eq!(decode(&[0x90, 1]), None);
        assert_eq!(decode(&[]), None);
    }
}
