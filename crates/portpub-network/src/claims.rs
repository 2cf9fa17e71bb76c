//! Per-request bookkeeping of claimed ports.
//!
//! Two tables are kept, keyed by protocol and host IP: one maps a claimed
//! container port to its host port, the other maps a claimed host port back
//! to its container port. [`ClaimTables::claim`] writes both, so they stay
//! mirrors of each other.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use crate::protocol::Protocol;

/// Host IP used when a mapping does not name one.
pub const WILDCARD_HOST_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Port-to-port table partitioned by protocol and host IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortTable {
    entries: HashMap<(Protocol, IpAddr), HashMap<u16, u16>>,
}

impl PortTable {
    /// Look up the port paired with `port`.
    #[must_use]
    pub fn get(&self, protocol: Protocol, host_ip: IpAddr, port: u16) -> Option<u16> {
        self.entries
            .get(&(protocol, host_ip))
            .and_then(|ports| ports.get(&port))
            .copied()
    }

    /// Whether `port` is claimed.
    #[must_use]
    pub fn contains(&self, protocol: Protocol, host_ip: IpAddr, port: u16) -> bool {
        self.get(protocol, host_ip, port).is_some()
    }

    /// Iterate over `(protocol, host_ip, port, paired_port)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (Protocol, IpAddr, u16, u16)> + '_ {
        self.entries.iter().flat_map(|(&(protocol, host_ip), ports)| {
            ports
                .iter()
                .map(move |(&port, &other)| (protocol, host_ip, port, other))
        })
    }

    fn insert(&mut self, protocol: Protocol, host_ip: IpAddr, port: u16, other: u16) {
        self.entries
            .entry((protocol, host_ip))
            .or_default()
            .insert(port, other);
    }
}

/// The container→host and host→container tables of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimTables {
    container_to_host: PortTable,
    host_to_container: PortTable,
}

impl ClaimTables {
    /// Create empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Host port bound to `container_port`, if claimed.
    #[must_use]
    pub fn host_port_for(
        &self,
        protocol: Protocol,
        host_ip: IpAddr,
        container_port: u16,
    ) -> Option<u16> {
        self.container_to_host
            .get(protocol, host_ip, container_port)
    }

    /// Container port reached through `host_port`, if claimed.
    #[must_use]
    pub fn container_port_for(
        &self,
        protocol: Protocol,
        host_ip: IpAddr,
        host_port: u16,
    ) -> Option<u16> {
        self.host_to_container.get(protocol, host_ip, host_port)
    }

    /// Record that `host_port` forwards to `container_port`.
    pub fn claim(
        &mut self,
        protocol: Protocol,
        host_ip: IpAddr,
        container_port: u16,
        host_port: u16,
    ) {
        self.container_to_host
            .insert(protocol, host_ip, container_port, host_port);
        self.host_to_container
            .insert(protocol, host_ip, host_port, container_port);
    }

    /// The container→host table.
    #[must_use]
    pub const fn container_to_host(&self) -> &PortTable {
        &self.container_to_host
    }

    /// The host→container table.
    #[must_use]
    pub const fn host_to_container(&self) -> &PortTable {
        &self.host_to_container
    }

    /// Whether every entry of each table leads back to itself through the other.
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        let leads_back = |from: &PortTable, to: &PortTable| {
            from.iter().all(|(protocol, host_ip, port, other)| {
                to.get(protocol, host_ip, other) == Some(port)
            })
        };
        leads_back(&self.container_to_host, &self.host_to_container)
            && leads_back(&self.host_to_container, &self.container_to_host)
    }
}
