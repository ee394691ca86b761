//! UDP transport (C6): per-device fire-and-forget sender with a repeat policy.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::time::Duration;

use crate::error::TransportError;
use crate::runtime::TaskSpawner;

/// A single UDP pulse, as serialized into the device's small JSON envelope.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UdpWireState {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
    /// Dimming percentage, 10-100.
    pub dimming: u8,
    /// Device-local Kelvin, when the fixture supports CCT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<u32>,
    /// Whether the device should be powered on.
    pub on: bool,
}

/// Per-send repeat policy: packets sent `repeats` times, `repeat_delay_ms` apart.
#[derive(Debug, Clone, Copy)]
pub struct RepeatPolicy {
    /// Number of times the datagram is fired (≥1).
    pub repeats: u8,
    /// Delay between repeats, in milliseconds.
    pub repeat_delay_ms: u64,
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            repeats: 1,
            repeat_delay_ms: 12,
        }
    }
}

/// Per-device fire-and-forget UDP sender.
///
/// Maintains a persistent socket per device address. There is no
/// acknowledgement and no fallback: a lost packet is tolerated because the
/// next reactive tick supersedes it.
pub struct UdpTransport {
    sockets: Mutex<HashMap<SocketAddr, Arc<UdpSocket>>>,
    spawner: Arc<dyn TaskSpawner>,
}

impl UdpTransport {
    /// Creates a transport that spawns repeat bursts via `spawner`.
    #[must_use]
    pub fn new(spawner: Arc<dyn TaskSpawner>) -> Self {
        Self {
            sockets: Mutex::new(HashMap::new()),
            spawner,
        }
    }

    /// Sends `state` to `addr`, firing `policy.repeats` datagrams spaced by
    /// `repeat_delay_ms`. The first send happens synchronously; remaining
    /// repeats are spawned so the caller is never blocked.
    pub async fn send(
        &self,
        addr: SocketAddr,
        state: UdpWireState,
        policy: RepeatPolicy,
    ) -> Result<(), TransportError> {
        let socket = self.socket_for(addr).await?;
        let payload = serde_json::to_vec(&state)
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;

        socket
            .send_to(&payload, addr)
            .await
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;

        if policy.repeats > 1 {
            let remaining = policy.repeats - 1;
            let delay = Duration::from_millis(policy.repeat_delay_ms);
            let socket = socket.clone();
            self.spawner.spawn(async move {
                for _ in 0..remaining {
                    tokio::time::sleep(delay).await;
                    let _ = socket.send_to(&payload, addr).await;
                }
            });
        }

        Ok(())
    }

    async fn socket_for(&self, addr: SocketAddr) -> Result<Arc<UdpSocket>, TransportError> {
        if let Some(socket) = self.sockets.lock().get(&addr) {
            return Ok(socket.clone());
        }

        let bind_addr: SocketAddr = if addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;
        let socket = Arc::new(socket);

        self.sockets.lock().insert(addr, socket.clone());
        Ok(socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioSpawner;

    #[tokio::test]
    async fn send_reaches_a_bound_local_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = UdpTransport::new(Arc::new(TokioSpawner::current()));
        let state = UdpWireState {
            r: 255,
            g: 0,
            b: 0,
            dimming: 100,
            temp: None,
            on: true,
        };
        transport
            .send(addr, state, RepeatPolicy { repeats: 1, repeat_delay_ms: 0 })
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = tokio::time::timeout(Duration::from_millis(500), listener.recv_from(&mut buf))
            .await
            .expect("timed out waiting for datagram")
            .unwrap();
        let received: UdpWireState = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(received.r, 255);
        assert!(received.on);
    }

    #[tokio::test]
    async fn reuses_the_same_socket_for_repeated_sends_to_the_same_address() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = UdpTransport::new(Arc::new(TokioSpawner::current()));
        let state = UdpWireState { r: 1, g: 2, b: 3, dimming: 50, temp: None, on: true };

        transport
            .send(addr, state, RepeatPolicy { repeats: 1, repeat_delay_ms: 0 })
            .await
            .unwrap();
        transport
            .send(addr, state, RepeatPolicy { repeats: 1, repeat_delay_ms: 0 })
            .await
            .unwrap();

        assert_eq!(transport.sockets.lock().len(), 1);
    }
}
