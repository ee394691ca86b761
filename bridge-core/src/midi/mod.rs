//! MIDI input (§10.4): decode + binding application only. No device I/O
//! backend is mandated; hosts supply a byte stream through [`MidiPort`].

mod bindings;
mod decode;

pub use bindings::MidiBindingTable;
pub use decode::{decode, MidiEvent};

use tokio::sync::mpsc;

/// A host-provided MIDI byte stream. This crate decodes and applies
/// bindings; it does not open any concrete MIDI device.
pub trait MidiPort: Send + Sync {
    /// Opens the port and begins pushing decoded 3-byte messages to `tx`
    /// until `close` is called.
    fn open(&self, tx: mpsc::Sender<[u8; 3]>) -> std::io::Result<()>;

    /// Stops the port and releases its resources.
    fn close(&self);

    /// A short identifier for telemetry.
    fn name(&self) -> &'static str;
}
