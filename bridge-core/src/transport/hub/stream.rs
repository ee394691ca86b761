//! Hub STREAM mode: a DTLS-PSK entertainment session, fire-and-forget after handshake.

use crate::error::TransportError;

/// One entertainment-area channel tuple, as emitted in a stream frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelColor {
    /// Red, 0-255.
    pub r: u8,
    /// Green, 0-255.
    pub g: u8,
    /// Blue, 0-255.
    pub b: u8,
}

/// A handshake-established low-latency streaming session.
///
/// Feature-gated: builds without `dtls-psk` get [`UnavailableStreamSession`],
/// which reports `NotConfigured` for every attempted connect.
pub trait StreamSession: Send + Sync {
    /// Emits one frame of `N` channel tuples. Fire-and-forget; errors
    /// indicate the socket is no longer usable and recovery should run.
    fn send_frame(&self, channels: &[ChannelColor]) -> Result<(), TransportError>;

    /// Tears the session down; idempotent.
    fn close(&self);
}

/// Credentials and endpoint for one connect attempt.
#[derive(Debug, Clone)]
pub struct StreamEndpoint {
    /// Hub LAN host or resolved IP.
    pub host: String,
    /// Well-known entertainment streaming port.
    pub port: u16,
    /// PSK identity (the hub API username).
    pub psk_identity: String,
    /// Pre-shared key, decoded from the fixture's hex client key.
    pub psk: Vec<u8>,
    /// Connect timeout for this attempt.
    pub timeout_ms: u64,
}

/// Session stand-in used when the `dtls-psk` feature is disabled.
pub struct UnavailableStreamSession;

impl StreamSession for UnavailableStreamSession {
    fn send_frame(&self, _channels: &[ChannelColor]) -> Result<(), TransportError> {
        Err(TransportError::NotConfigured(
            "built without the dtls-psk feature".into(),
        ))
    }

    fn close(&self) {}
}

/// Attempts a DTLS-PSK handshake and returns a usable session on success.
#[cfg(not(feature = "dtls-psk"))]
pub async fn connect(_endpoint: &StreamEndpoint) -> Result<Box<dyn StreamSession>, TransportError> {
    Err(TransportError::NotConfigured(
        "built without the dtls-psk feature".into(),
    ))
}

#[cfg(feature = "dtls-psk")]
mod dtls {
    use super::{ChannelColor, StreamEndpoint, StreamSession, TransportError};
    use openssl::ssl::{SslConnector, SslMethod, SslStream, SslVerifyMode};
    use std::io::Write;
    use std::net::UdpSocket;
    use std::sync::Mutex;
    use std::time::Duration;

    /// An established DTLS-PSK session over a connected UDP socket.
    pub struct DtlsPskSession {
        stream: Mutex<SslStream<UdpSocket>>,
    }

    impl DtlsPskSession {
        fn encode_frame(channels: &[ChannelColor]) -> Vec<u8> {
            let mut buf = Vec::with_capacity(channels.len() * 3);
            for c in channels {
                buf.push(c.r);
                buf.push(c.g);
                buf.push(c.b);
            }
            buf
        }
    }

    impl StreamSession for DtlsPskSession {
        fn send_frame(&self, channels: &[ChannelColor]) -> Result<(), TransportError> {
            let payload = Self::encode_frame(channels);
            let mut stream = self.stream.lock().expect("stream mutex poisoned");
            stream
                .write_all(&payload)
                .map_err(|e| TransportError::SocketFault(e.to_string()))
        }

        fn close(&self) {
            if let Ok(mut stream) = self.stream.lock() {
                let _ = stream.shutdown();
            }
        }
    }

    /// Performs the PSK handshake described in §4.5/§6: identity is the hub
    /// API user id, PSK is the hex-decoded entertainment client key.
    pub async fn connect(endpoint: &StreamEndpoint) -> Result<Box<dyn StreamSession>, TransportError> {
        let endpoint = endpoint.clone();
        tokio::task::spawn_blocking(move || connect_blocking(&endpoint))
            .await
            .map_err(|e| TransportError::SocketFault(e.to_string()))?
    }

    fn connect_blocking(endpoint: &StreamEndpoint) -> Result<Box<dyn StreamSession>, TransportError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;
        socket
            .connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;
        socket
            .set_read_timeout(Some(Duration::from_millis(endpoint.timeout_ms)))
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;

        let mut builder = SslConnector::builder(SslMethod::dtls())
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;
        builder.set_verify(SslVerifyMode::NONE);

        let identity = endpoint.psk_identity.clone();
        let psk = endpoint.psk.clone();
        builder.set_psk_client_callback(move |_ssl, _hint, identity_out, psk_out| {
            let id_bytes = identity.as_bytes();
            let len = id_bytes.len().min(identity_out.len() - 1);
            identity_out[..len].copy_from_slice(&id_bytes[..len]);
            identity_out[len] = 0;

            let psk_len = psk.len().min(psk_out.len());
            psk_out[..psk_len].copy_from_slice(&psk[..psk_len]);
            Ok(psk_len)
        });

        let connector = builder.build();
        let ssl = connector
            .configure()
            .map_err(|e| TransportError::SocketFault(e.to_string()))?
            .into_ssl(&endpoint.host)
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;

        let mut stream = openssl::ssl::SslStream::new(ssl, socket)
            .map_err(|e| TransportError::SocketFault(e.to_string()))?;
        stream
            .connect()
            .map_err(|_| TransportError::HandshakeTimeout(Duration::from_millis(endpoint.timeout_ms)))?;

        Ok(Box::new(DtlsPskSession {
            stream: Mutex::new(stream),
        }))
    }
}

#[cfg(feature = "dtls-psk")]
pub use dtls::{connect, DtlsPskSession};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_session_reports_not_configured() {
        let session = UnavailableStreamSession;
        let err = session.send_frame(&[ChannelColor::default()]).unwrap_err();
        assert!(matches!(err, TransportError::NotConfigured(_)));
    }
}
