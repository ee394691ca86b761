//! Centralized error types for the bridge core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes for the thin status surface
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

/// Errors from the audio source.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No capture backend could be selected (no native device, no muxer binary).
    #[error("no audio backend available: {0}")]
    Unavailable(String),

    /// The watchdog tripped because no data arrived within `watchdogMs`.
    #[error("audio source stalled: {0}")]
    Stalled(String),

    /// The muxer subprocess exited unexpectedly.
    #[error("muxer subprocess exited: {0}")]
    SubprocessExited(String),

    /// Underlying device I/O error.
    #[error("device error: {0}")]
    Device(String),
}

impl ErrorCode for AudioError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "audio_unavailable",
            Self::Stalled(_) => "audio_stalled",
            Self::SubprocessExited(_) => "audio_subprocess_exited",
            Self::Device(_) => "audio_device_error",
        }
    }
}

/// Errors from the hub transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No hub fixtures configured; stream mode cannot be attempted.
    #[error("hub transport not configured: {0}")]
    NotConfigured(String),

    /// The DTLS-PSK handshake did not complete before the escalating timeout.
    #[error("hub stream handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// The stream socket closed, reset, or broke the pipe mid-session.
    #[error("hub stream socket fault: {0}")]
    SocketFault(String),

    /// The hub's entertainment area reported busy or in an unknown state.
    #[error("hub entertainment area busy: {0}")]
    AreaBusy(String),

    /// TLS certificate validation failed; fatal for stream mode.
    #[error("hub certificate untrusted: {0}")]
    CertUntrusted(String),

    /// The REST PUT to the hub failed.
    #[error("hub REST request failed: {0}")]
    Rest(#[from] reqwest::Error),
}

impl TransportError {
    /// Returns true if a recovery attempt should be scheduled after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::CertUntrusted(_) | Self::NotConfigured(_))
    }
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "transport_not_configured",
            Self::HandshakeTimeout(_) => "transport_handshake_timeout",
            Self::SocketFault(_) => "transport_socket_fault",
            Self::AreaBusy(_) => "transport_area_busy",
            Self::CertUntrusted(_) => "transport_cert_untrusted",
            Self::Rest(_) => "transport_rest_failed",
        }
    }
}

/// Errors from intent routing / dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No fixtures matched the resolved zone tokens for this intent.
    #[error("no targets for zone(s) {0}")]
    NoTargets(String),
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        "dispatcher_no_targets"
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is structurally invalid; names the offending field path.
    #[error("invalid configuration at {field}: {reason}")]
    Invalid {
        /// Dotted path to the offending field (e.g. `audio.sampleRate`).
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Failed to read or parse the configuration file.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Returns true if `value` looks like an unfilled placeholder
    /// (`replace_with`, `x.x.x.x`, `example`) rather than a genuine error.
    #[must_use]
    pub fn is_placeholder(value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        lower.contains("replace_with") || lower.contains("x.x.x.x") || lower.contains("example")
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "config_invalid",
            Self::Load(_) => "config_load_failed",
        }
    }
}

/// Application-wide error type for the bridge.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum BridgeError {
    /// Audio capture error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Hub or UDP transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Dispatch/routing error.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A device did not respond to a connectivity probe. Informational only.
    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),

    /// Requested fixture, zone, or scene does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Client sent an invalid or malformed request (bad IP, bad tier, etc).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Audio(_) => "audio_error",
            Self::Transport(_) => "transport_error",
            Self::Dispatch(_) => "dispatch_error",
            Self::Config(_) => "config_error",
            Self::DeviceUnreachable(_) => "device_unreachable",
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code for the status surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::DeviceUnreachable(_) => StatusCode::OK,
            Self::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AudioError> for BridgeError {
    fn from(err: AudioError) -> Self {
        Self::Audio(err.to_string())
    }
}

impl From<TransportError> for BridgeError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<DispatchError> for BridgeError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err.to_string())
    }
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenient Result alias for application-wide operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_unreachable_is_informational() {
        let err = BridgeError::DeviceUnreachable("192.168.1.50".into());
        assert_eq!(err.code(), "device_unreachable");
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn transport_cert_untrusted_is_not_recoverable() {
        let err = TransportError::CertUntrusted("self-signed".into());
        assert!(!err.is_recoverable());
        let err = TransportError::SocketFault("reset".into());
        assert!(err.is_recoverable());
    }

    #[test]
    fn placeholder_detection() {
        assert!(ConfigError::is_placeholder("x.x.x.x"));
        assert!(ConfigError::is_placeholder("REPLACE_WITH_BRIDGE_ID"));
        assert!(!ConfigError::is_placeholder("192.168.1.10"));
    }
}
