//! Port mapping requests and finalized mappings.

use serde::{Deserialize, Serialize};

use crate::protocol::Protocol;

/// A user-requested port mapping, possibly covering a range of ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortMappingRequest {
    /// First container port. Must be non-zero.
    pub container_port: u16,
    /// First host port. 0 means the same as the container port.
    pub host_port: u16,
    /// Host IP to bind to. Empty means every address.
    pub host_ip: String,
    /// Comma-separated protocols. Empty means tcp.
    pub protocol: String,
    /// Number of consecutive ports. 0 is treated as 1.
    pub range: u16,
}

impl PortMappingRequest {
    /// Request publishing `container_port` on the same host port over tcp.
    #[must_use]
    pub fn new(container_port: u16) -> Self {
        Self {
            container_port,
            ..Self::default()
        }
    }

    /// Set the host port.
    #[must_use]
    pub const fn with_host_port(mut self, host_port: u16) -> Self {
        self.host_port = host_port;
        self
    }

    /// Set the host IP to bind to.
    #[must_use]
    pub fn with_host_ip(mut self, ip: &str) -> Self {
        self.host_ip = ip.to_string();
        self
    }

    /// Set the protocol specifier.
    #[must_use]
    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = protocol.to_string();
        self
    }

    /// Set the number of ports covered.
    #[must_use]
    pub const fn with_range(mut self, range: u16) -> Self {
        self.range = range;
        self
    }
}

/// A single host to container port binding handed to the network backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    /// Host port.
    pub host_port: u16,
    /// Container port.
    pub container_port: u16,
    /// Protocol.
    pub protocol: Protocol,
    /// Host IP as requested. Empty for wildcard bindings.
    pub host_ip: String,
}

impl PortMapping {
    /// Create a new TCP port mapping on every host address.
    #[must_use]
    pub const fn tcp(host_port: u16, container_port: u16) -> Self {
        Self {
            host_port,
            container_port,
            protocol: Protocol::Tcp,
            host_ip: String::new(),
        }
    }

    /// Create a new UDP port mapping on every host address.
    #[must_use]
    pub const fn udp(host_port: u16, container_port: u16) -> Self {
        Self {
            host_port,
            container_port,
            protocol: Protocol::Udp,
            host_ip: String::new(),
        }
    }
}
