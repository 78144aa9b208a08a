//! Public IPv6 detection from local network interfaces.
//!
//! The device is expected to hold a global unicast IPv6 address on one of its
//! interfaces; that address is what gets reported to the provider. No
//! external "what is my IP" service is consulted.

use crate::error::{DdnsError, Result};
use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;

/// One network interface and the addresses bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
    /// Alias/sub-interface such as `eth0:1`.
    pub is_virtual: bool,
    /// Addresses in the order the host reported them.
    pub addresses: Vec<IpAddr>,
}

/// Source of the host's interface list.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceSource: Send + Sync {
    /// Enumerate interfaces in host order.
    fn interfaces(&self) -> Result<Vec<NetworkInterface>>;
}

/// Interfaces as reported by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

#[cfg(unix)]
impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        use nix::net::if_::InterfaceFlags;

        let addrs = nix::ifaddrs::getifaddrs()
            .map_err(|e| DdnsError::InterfaceEnumeration(e.to_string()))?;

        let mut interfaces: Vec<NetworkInterface> = Vec::new();
        for ifaddr in addrs {
            let idx = match interfaces
                .iter()
                .position(|i| i.name == ifaddr.interface_name)
            {
                Some(idx) => idx,
                None => {
                    interfaces.push(NetworkInterface {
                        is_virtual: ifaddr.interface_name.contains(':'),
                        name: ifaddr.interface_name.clone(),
                        up: ifaddr.flags.contains(InterfaceFlags::IFF_UP),
                        loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                        addresses: Vec::new(),
                    });
                    interfaces.len() - 1
                }
            };

            let Some(address) = ifaddr.address else {
                continue;
            };
            if let Some(sin6) = address.as_sockaddr_in6() {
                interfaces[idx].addresses.push(IpAddr::V6(sin6.ip()));
            } else if let Some(sin) = address.as_sockaddr_in() {
                interfaces[idx].addresses.push(IpAddr::V4(sin.ip()));
            }
        }

        Ok(interfaces)
    }
}

#[cfg(not(unix))]
impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        Err(DdnsError::InterfaceEnumeration(
            "interface enumeration is not supported on this platform".to_string(),
        ))
    }
}

/// IPv6 address detector.
#[derive(Clone)]
pub struct IpDetector {
    source: Arc<dyn InterfaceSource>,
}

impl IpDetector {
    /// Create a detector reading the host's interfaces.
    pub fn new() -> Self {
        Self::with_source(Arc::new(SystemInterfaces))
    }

    /// Create a detector over a custom interface source.
    pub fn with_source(source: Arc<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// Detect the device's global IPv6 address.
    ///
    /// Returns [`DdnsError::NoGlobalAddress`] when enumeration worked but no
    /// address qualified, and [`DdnsError::InterfaceEnumeration`] when the
    /// host could not be queried at all.
    pub async fn detect_ipv6(&self) -> Result<Ipv6Addr> {
        let source = Arc::clone(&self.source);
        let interfaces = tokio::task::spawn_blocking(move || source.interfaces())
            .await
            .map_err(|e| DdnsError::InterfaceEnumeration(e.to_string()))??;

        tracing::debug!("Enumerated {} interfaces", interfaces.len());

        match select_global_ipv6(&interfaces) {
            Some(ip) => {
                tracing::debug!("Detected IPv6 {}", ip);
                Ok(ip)
            }
            None => {
                tracing::warn!("No global IPv6 address on any interface");
                Err(DdnsError::NoGlobalAddress)
            }
        }
    }
}

impl Default for IpDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the first global IPv6 address from usable interfaces.
///
/// Interfaces that are down, loopback or virtual are skipped. Order is the
/// order of `interfaces` and then of each interface's addresses.
pub fn select_global_ipv6(interfaces: &[NetworkInterface]) -> Option<Ipv6Addr> {
    interfaces
        .iter()
        .filter(|iface| iface.up && !iface.loopback && !iface.is_virtual)
        .flat_map(|iface| iface.addresses.iter())
        .find_map(|addr| match addr {
            IpAddr::V6(v6) if is_global_ipv6(v6) => Some(*v6),
            _ => None,
        })
}

/// Whether an address may be published as the device's public address.
pub fn is_global_ipv6(addr: &Ipv6Addr) -> bool {
    !(addr.is_loopback()
        || addr.is_unspecified()
        || addr.is_multicast()
        || is_link_local(addr)
        || is_unique_local(addr)
        || is_site_local(addr))
}

// fe80::/10
fn is_link_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

// fc00::/7
fn is_unique_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

// fec0::/10, deprecated but still reported by some stacks
fn is_site_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfec0
}

/// Drop a `%zone` suffix from a textual address.
pub fn strip_zone(text: &str) -> &str {
    match text.split_once('%') {
        Some((addr, _zone)) => addr,
        None => text,
    }
}

/// Parse a textual IPv6 address, ignoring any zone suffix.
pub fn parse_ipv6(text: &str) -> Result<Ipv6Addr> {
    let bare = strip_zone(text.trim());
    bare.parse()
        .map_err(|_| DdnsError::Validation(format!("invalid IPv6 address: {}", text)))
}
