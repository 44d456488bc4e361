//! Interface address snapshots
//!
//! An [`AddressSet`] remembers the publishable addresses of one interface for
//! one address family and, on every [`AddressSet::update`], reports what
//! appeared and what disappeared since the previous snapshot.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace};

use crate::config::AddressFamily;
use crate::error::{Error, Result};
use crate::traits::AddressSource;

/// IPv4 ranges that are never published: private, shared, loopback,
/// link-local, protocol assignments, relay, documentation, benchmarking,
/// multicast, reserved and broadcast.
const IGNORED_V4_BLOCKS: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
    (Ipv4Addr::new(100, 64, 0, 0), 10),
    (Ipv4Addr::new(127, 0, 0, 0), 8),
    (Ipv4Addr::new(169, 254, 0, 0), 16),
    (Ipv4Addr::new(192, 0, 0, 0), 24),
    (Ipv4Addr::new(192, 88, 99, 0), 24),
    (Ipv4Addr::new(192, 0, 2, 0), 24),
    (Ipv4Addr::new(198, 51, 100, 0), 24),
    (Ipv4Addr::new(203, 0, 113, 0), 24),
    (Ipv4Addr::new(198, 18, 0, 0), 15),
    (Ipv4Addr::new(224, 0, 0, 0), 4),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
    (Ipv4Addr::new(255, 255, 255, 255), 32),
];

/// IPv6 ranges that are never published: unspecified, loopback, unique
/// local, link-local and multicast. The documentation prefix 2001:db8::/32
/// stays publishable.
const IGNORED_V6_BLOCKS: &[(Ipv6Addr, u8)] = &[
    (Ipv6Addr::UNSPECIFIED, 128),
    (Ipv6Addr::LOCALHOST, 128),
    (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
    (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
    (Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0), 8),
];

/// Whether an address falls inside one of the ignored blocks
///
/// Each family is checked against its own list. Pass addresses through
/// [`parse_observed`] first so IPv4-mapped IPv6 addresses hit the IPv4 list.
pub fn is_ignored(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => IGNORED_V4_BLOCKS
            .iter()
            .any(|(network, prefix)| v4_block_contains(*network, *prefix, *v4)),
        IpAddr::V6(v6) => IGNORED_V6_BLOCKS
            .iter()
            .any(|(network, prefix)| v6_block_contains(*network, *prefix, *v6)),
    }
}

fn v4_block_contains(network: Ipv4Addr, prefix: u8, ip: Ipv4Addr) -> bool {
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    };
    u32::from(network) & mask == u32::from(ip) & mask
}

fn v6_block_contains(network: Ipv6Addr, prefix: u8, ip: Ipv6Addr) -> bool {
    let mask = if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    };
    u128::from(network) & mask == u128::from(ip) & mask
}

/// Parse an address as reported by an [`AddressSource`]
///
/// Accepts plain and CIDR notation and drops an IPv6 zone suffix.
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) come back as IPv4.
pub fn parse_observed(interface: &str, text: &str) -> Result<IpAddr> {
    let trimmed = text.trim();
    let without_prefix = trimmed.split_once('/').map_or(trimmed, |(addr, _)| addr);
    let without_zone = without_prefix
        .split_once('%')
        .map_or(without_prefix, |(addr, _)| addr);

    without_zone
        .parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| Error::address_parse(interface, text))
}

/// Addresses that appeared and disappeared in one update cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressDelta {
    /// Present now, absent before
    pub added: BTreeSet<IpAddr>,
    /// Present before, absent now
    pub removed: BTreeSet<IpAddr>,
}

impl AddressDelta {
    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Snapshot of the publishable addresses on one interface
///
/// ## Invariants
///
/// - `last_added` and `last_removed` are disjoint and describe only the most
///   recent update, never an accumulated history
/// - ignored addresses never enter `current`
/// - a failed update leaves the snapshot untouched
pub struct AddressSet {
    interface: String,
    family: AddressFamily,
    source: Box<dyn AddressSource>,
    current: BTreeSet<IpAddr>,
    last_added: BTreeSet<IpAddr>,
    last_removed: BTreeSet<IpAddr>,
}

impl AddressSet {
    /// Create an empty set for the interface and family
    pub fn new(
        interface: impl Into<String>,
        family: AddressFamily,
        source: Box<dyn AddressSource>,
    ) -> Self {
        Self {
            interface: interface.into(),
            family,
            source,
            current: BTreeSet::new(),
            last_added: BTreeSet::new(),
            last_removed: BTreeSet::new(),
        }
    }

    /// Interface name
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Watched address family
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Addresses seen on the last successful update
    pub fn current(&self) -> &BTreeSet<IpAddr> {
        &self.current
    }

    /// Addresses added by the last successful update
    pub fn last_added(&self) -> &BTreeSet<IpAddr> {
        &self.last_added
    }

    /// Addresses removed by the last successful update
    pub fn last_removed(&self) -> &BTreeSet<IpAddr> {
        &self.last_removed
    }

    /// Owned copy of the current addresses
    pub fn current_list(&self) -> Vec<IpAddr> {
        self.current.iter().copied().collect()
    }

    /// Check that the interface exists
    ///
    /// Used once at startup, where a missing interface is fatal.
    pub fn probe(&self) -> Result<()> {
        if self.source.interface_exists(&self.interface)? {
            Ok(())
        } else {
            Err(Error::interface_lookup(
                &self.interface,
                "no such interface",
            ))
        }
    }

    /// Re-read the interface and compute the delta against the last snapshot
    pub fn update(&mut self) -> Result<AddressDelta> {
        let observed = self.read_interface()?;

        let added: BTreeSet<IpAddr> = observed.difference(&self.current).copied().collect();
        let removed: BTreeSet<IpAddr> = self.current.difference(&observed).copied().collect();

        self.last_added = added.clone();
        self.last_removed = removed.clone();
        self.current = observed;

        Ok(AddressDelta { added, removed })
    }

    fn read_interface(&self) -> Result<BTreeSet<IpAddr>> {
        let raw = self.source.addresses(&self.interface)?;
        let mut addresses = BTreeSet::new();

        for text in &raw {
            let ip = parse_observed(&self.interface, text)?;
            if !self.family.matches(&ip) {
                trace!("{}: skipping {} (not {})", self.interface, ip, self.family);
                continue;
            }
            if is_ignored(&ip) {
                debug!("{}: ignoring non-routable address {}", self.interface, ip);
                continue;
            }
            addresses.insert(ip);
        }

        Ok(addresses)
    }
}

impl std::fmt::Debug for AddressSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSet")
            .field("interface", &self.interface)
            .field("family", &self.family)
            .field("current", &self.current)
            .field("last_added", &self.last_added)
            .field("last_removed", &self.last_removed)
            .finish()
    }
}
