// # getifaddrs Address Source
//
// This crate reads interface addresses with getifaddrs(3), which every
// supported Unix (OpenBSD, FreeBSD, Linux, macOS) provides.
//
// ## Behaviour
//
// Each call enumerates the system's address list afresh; nothing is cached.
// Addresses are reported in CIDR notation, `<address>/<prefix>`, with the
// prefix derived from the netmask when the kernel supplies one. Link and
// packet-level entries (AF_LINK, AF_PACKET) are skipped.
//
// ## Platform Support
//
// On non-Unix targets the source compiles but every lookup fails.

use std::net::IpAddr;

use ifdns_core::{AddressSource, Error, Result};

/// Address source backed by getifaddrs(3)
#[derive(Debug, Clone, Copy, Default)]
pub struct IfAddrsSource;

impl IfAddrsSource {
    /// Create a new source
    pub fn new() -> Self {
        Self
    }
}

/// Render an address with the prefix length of its netmask
///
/// Without a netmask (or with one of a different family) the bare address
/// is returned.
pub fn format_address(address: IpAddr, netmask: Option<IpAddr>) -> String {
    match (address, netmask) {
        (IpAddr::V4(_), Some(IpAddr::V4(mask))) => {
            format!("{}/{}", address, u32::from(mask).count_ones())
        }
        (IpAddr::V6(_), Some(IpAddr::V6(mask))) => {
            format!("{}/{}", address, u128::from(mask).count_ones())
        }
        _ => address.to_string(),
    }
}

#[cfg(unix)]
mod sys {
    use std::net::IpAddr;

    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::if_nametoindex;
    use nix::sys::socket::SockaddrStorage;

    pub fn interface_index(interface: &str) -> nix::Result<u32> {
        if_nametoindex(interface)
    }

    pub fn interface_addresses(interface: &str) -> nix::Result<Vec<(IpAddr, Option<IpAddr>)>> {
        let mut found = Vec::new();

        for ifaddr in getifaddrs()? {
            if ifaddr.interface_name != interface {
                continue;
            }
            let Some(address) = ifaddr.address.as_ref().and_then(to_ip) else {
                continue;
            };
            let netmask = ifaddr.netmask.as_ref().and_then(to_ip);
            found.push((address, netmask));
        }

        Ok(found)
    }

    fn to_ip(storage: &SockaddrStorage) -> Option<IpAddr> {
        if let Some(v4) = storage.as_sockaddr_in() {
            return Some(IpAddr::V4(v4.ip()));
        }
        storage.as_sockaddr_in6().map(|v6| IpAddr::V6(v6.ip()))
    }
}

#[cfg(unix)]
impl AddressSource for IfAddrsSource {
    fn interface_exists(&self, interface: &str) -> Result<bool> {
        // if_nametoindex(3) reports an unknown name as index 0.
        match sys::interface_index(interface) {
            Ok(index) => {
                tracing::trace!("{} has index {}", interface, index);
                Ok(true)
            }
            Err(e) => {
                tracing::trace!("{}: if_nametoindex: {}", interface, e);
                Ok(false)
            }
        }
    }

    fn addresses(&self, interface: &str) -> Result<Vec<String>> {
        if !self.interface_exists(interface)? {
            return Err(Error::interface_lookup(interface, "no such interface"));
        }

        let found = sys::interface_addresses(interface)
            .map_err(|e| Error::interface_lookup(interface, e.to_string()))?;

        tracing::trace!("{}: getifaddrs reported {} address(es)", interface, found.len());

        Ok(found
            .into_iter()
            .map(|(address, netmask)| format_address(address, netmask))
            .collect())
    }
}

#[cfg(not(unix))]
impl AddressSource for IfAddrsSource {
    fn interface_exists(&self, interface: &str) -> Result<bool> {
        Err(Error::interface_lookup(
            interface,
            "getifaddrs is not available on this platform",
        ))
    }

    fn addresses(&self, interface: &str) -> Result<Vec<String>> {
        Err(Error::interface_lookup(
            interface,
            "getifaddrs is not available on this platform",
        ))
    }
}
