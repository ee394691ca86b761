//! In-process DNS shim: rewrites the hub's identity hostname to its observed
//! LAN IP while preserving the hostname for TLS certificate/SNI validation.

use std::net::{IpAddr, SocketAddr};

use parking_lot::RwLock;

/// Holds the current hostname→IP mapping for one hub and applies it to a
/// [`reqwest::ClientBuilder`] via `resolve()`, so outgoing connections go
/// straight to the IP while the certificate is still checked against the
/// hostname.
#[derive(Default)]
pub struct HubDnsShim {
    mapping: RwLock<Option<(String, IpAddr)>>,
}

impl HubDnsShim {
    /// Creates an empty shim; `apply` is a no-op until `set` is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `hostname` should resolve to `ip` for future clients.
    pub fn set(&self, hostname: impl Into<String>, ip: IpAddr) {
        *self.mapping.write() = Some((hostname.into(), ip));
    }

    /// Clears the override, falling back to normal system DNS.
    pub fn clear(&self) {
        *self.mapping.write() = None;
    }

    /// Current override, if any.
    #[must_use]
    pub fn current(&self) -> Option<(String, IpAddr)> {
        self.mapping.read().clone()
    }

    /// Applies the recorded override (if any) to `builder`, pinning the
    /// hostname's connection target while leaving hostname-based TLS
    /// verification untouched.
    #[must_use]
    pub fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        match self.current() {
            Some((hostname, ip)) => {
                let port = 443;
                builder.resolve(&hostname, SocketAddr::new(ip, port))
            }
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_shim_leaves_builder_untouched() {
        let shim = HubDnsShim::new();
        // Just exercise that apply() doesn't panic and returns a builder.
        let _builder = shim.apply(reqwest::ClientBuilder::new());
        assert!(shim.current().is_none());
    }

    #[test]
    fn set_then_clear_round_trips() {
        let shim = HubDnsShim::new();
        let ip: IpAddr = "192.168.1.50".parse().unwrap();
        shim.set("abcd1234.hub.local", ip);
        assert_eq!(shim.current().unwrap().1, ip);
        shim.clear();
        assert!(shim.current().is_none());
    }
}
