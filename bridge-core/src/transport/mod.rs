//! Dual transport dispatch: hub REST/STREAM (C5) and per-device UDP (C6).

pub mod hub;
pub mod udp;

pub use hub::HubTransport;
pub use udp::{RepeatPolicy, UdpTransport, UdpWireState};
