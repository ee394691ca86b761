//! General utilities shared across the application.

use std::time::{SystemTime, UNIX_EPOCH};

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Deterministic Sampling
// ─────────────────────────────────────────────────────────────────────────────

/// A deterministic stand-in for a uniform sample in `[0, 1)`, seeded by a
/// caller-chosen value (typically a running phase). Used by scene policies
/// that want probabilistic jitter without pulling in a PRNG dependency for
/// what is, in context, just a tie-breaker.
#[must_use]
pub fn pseudo_random(seed: f32) -> f32 {
    let x = (seed * 12.9898).sin() * 43758.547;
    x.fract().abs()
}

// ─────────────────────────────────────────────────────────────────────────────
// Hex Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes a hex-encoded pre-shared key (e.g. a hub's entertainment client
/// key) into raw bytes. Returns `None` on odd length or a non-hex digit.
#[must_use]
pub fn decode_hex_key(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// IP Address Validation
// ─────────────────────────────────────────────────────────────────────────────

use std::net::{IpAddr, Ipv4Addr};

use crate::error::ErrorCode;

/// Error returned when an IP address is not valid for a fixture host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpValidationError {
    /// IPv6 addresses are not supported (fixtures are addressed over IPv4 LAN).
    Ipv6NotSupported,
    /// Loopback address (127.x.x.x).
    Loopback,
    /// Unspecified address (0.0.0.0).
    Unspecified,
    /// Broadcast address (255.255.255.255).
    Broadcast,
    /// Multicast address (224.0.0.0/4).
    Multicast,
    /// Link-local address (169.254.x.x).
    LinkLocal,
    /// Address is routable but not in a private RFC1918 range.
    ///
    /// Fixtures (hub bridges, UDP receivers) are expected to live on the
    /// local network; a public IP is almost always a typo.
    NotPrivate,
}

impl ErrorCode for IpValidationError {
    /// Returns the error code string for API responses.
    fn code(&self) -> &'static str {
        "invalid_ip"
    }
}

impl IpValidationError {
    /// Returns a human-readable description of the error.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ipv6NotSupported => "IPv6 addresses are not supported; fixtures use IPv4",
            Self::Loopback => "Loopback addresses cannot be fixture hosts",
            Self::Unspecified => "Unspecified address (0.0.0.0) is not valid",
            Self::Broadcast => "Broadcast addresses cannot be fixture hosts",
            Self::Multicast => "Multicast addresses cannot be fixture hosts",
            Self::LinkLocal => "Link-local addresses (169.254.x.x) cannot be fixture hosts",
            Self::NotPrivate => "Fixture host must be a private RFC1918 address (10/8, 172.16/12, 192.168/16)",
        }
    }
}

impl std::fmt::Display for IpValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for IpValidationError {}

/// Validates that an IP address is suitable for a fixture host.
///
/// Rejects IPv6, special addresses (loopback, multicast, broadcast,
/// link-local, unspecified), and anything outside the RFC1918 private
/// ranges. Returns the validated IPv4 address for canonical storage.
///
/// # Examples
///
/// ```
/// use std::net::IpAddr;
/// use bridge_core::validate_fixture_ip;
///
/// let ip: IpAddr = "192.168.1.100".parse().unwrap();
/// assert!(validate_fixture_ip(&ip).is_ok());
///
/// let ip: IpAddr = "8.8.8.8".parse().unwrap();
/// assert!(validate_fixture_ip(&ip).is_err());
/// ```
pub fn validate_fixture_ip(ip: &IpAddr) -> Result<Ipv4Addr, IpValidationError> {
    let ipv4 = match ip {
        IpAddr::V4(v4) => *v4,
        IpAddr::V6(_) => return Err(IpValidationError::Ipv6NotSupported),
    };

    if ipv4.is_loopback() {
        return Err(IpValidationError::Loopback);
    }
    if ipv4.is_unspecified() {
        return Err(IpValidationError::Unspecified);
    }
    if ipv4.is_broadcast() {
        return Err(IpValidationError::Broadcast);
    }
    if ipv4.is_multicast() {
        return Err(IpValidationError::Multicast);
    }
    if ipv4.is_link_local() {
        return Err(IpValidationError::LinkLocal);
    }
    if !is_rfc1918_private(&ipv4) {
        return Err(IpValidationError::NotPrivate);
    }

    Ok(ipv4)
}

/// Returns true if `ip` falls in 10/8, 172.16/12, or 192.168/16.
fn is_rfc1918_private(ip: &Ipv4Addr) -> bool {
    let o = ip.octets();
    o[0] == 10 || (o[0] == 172 && (16..=31).contains(&o[1])) || (o[0] == 192 && o[1] == 168)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_private_accepted() {
        let ip: IpAddr = "192.168.1.100".parse().unwrap();
        let result = validate_fixture_ip(&ip);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().to_string(), "192.168.1.100");
    }

    #[test]
    fn ten_dot_range_accepted() {
        let ip: IpAddr = "10.0.5.5".parse().unwrap();
        assert!(validate_fixture_ip(&ip).is_ok());
    }

    #[test]
    fn class_b_private_range_accepted() {
        let ip: IpAddr = "172.20.0.1".parse().unwrap();
        assert!(validate_fixture_ip(&ip).is_ok());
    }

    #[test]
    fn public_ip_rejected() {
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert_eq!(validate_fixture_ip(&ip), Err(IpValidationError::NotPrivate));
    }

    #[test]
    fn ipv6_rejected() {
        let ip: IpAddr = "::1".parse().unwrap();
        assert_eq!(
            validate_fixture_ip(&ip),
            Err(IpValidationError::Ipv6NotSupported)
        );
    }

    #[test]
    fn loopback_rejected() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(validate_fixture_ip(&ip), Err(IpValidationError::Loopback));
    }

    #[test]
    fn unspecified_rejected() {
        let ip: IpAddr = "0.0.0.0".parse().unwrap();
        assert_eq!(
            validate_fixture_ip(&ip),
            Err(IpValidationError::Unspecified)
        );
    }

    #[test]
    fn broadcast_rejected() {
        let ip: IpAddr = "255.255.255.255".parse().unwrap();
        assert_eq!(validate_fixture_ip(&ip), Err(IpValidationError::Broadcast));
    }

    #[test]
    fn multicast_rejected() {
        let ip: IpAddr = "224.0.0.1".parse().unwrap();
        assert_eq!(validate_fixture_ip(&ip), Err(IpValidationError::Multicast));
    }

    #[test]
    fn link_local_rejected() {
        let ip: IpAddr = "169.254.1.1".parse().unwrap();
        assert_eq!(validate_fixture_ip(&ip), Err(IpValidationError::LinkLocal));
    }

    #[test]
    fn decode_hex_key_round_trips_known_bytes() {
        assert_eq!(decode_hex_key("deadbeef"), Some(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn decode_hex_key_rejects_odd_length() {
        assert_eq!(decode_hex_key("abc"), None);
    }

    #[test]
    fn decode_hex_key_rejects_non_hex_digits() {
        assert_eq!(decode_hex_key("zz"), None);
    }

    #[test]
    fn error_code_is_always_invalid_ip() {
        assert_eq!(IpValidationError::Ipv6NotSupported.code(), "invalid_ip");
        assert_eq!(IpValidationError::NotPrivate.code(), "invalid_ip");
        assert_eq!(IpValidationError::LinkLocal.code(), "invalid_ip");
    }
}
