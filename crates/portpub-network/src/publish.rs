//! Final port mapping table for a container.
//!
//! [`PortPublisher`] validates the explicit mappings of a [`PublishRequest`]
//! and, when exposed ports are to be published, picks a free host port for
//! every exposed port that no explicit mapping already covers.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use portpub_common::{PortpubError, PortpubResult, PublishConfig};
use serde::{Deserialize, Serialize};

use crate::claims::{ClaimTables, WILDCARD_HOST_IP};
use crate::expose::ExposeSet;
use crate::mapping::{PortMapping, PortMappingRequest};
use crate::probe::{OsPortSource, PortSource};
use crate::protocol::Protocol;
use crate::validate::{ValidatedMappings, parse_port_mappings};

/// Everything known about a container's ports at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishRequest {
    /// Explicit user mappings.
    pub port_mappings: Vec<PortMappingRequest>,
    /// Explicitly exposed ports, port to protocol specifier.
    pub expose: BTreeMap<u16, String>,
    /// Ports declared by the image, as `port[/protocol]`. `None` without an image.
    pub image_exposed_ports: Option<BTreeSet<String>>,
    /// Publish exposed ports on host ports chosen by the engine.
    pub publish_exposed_ports: bool,
}

impl PublishRequest {
    /// Parse from any supported format (auto-detected by extension).
    pub fn from_file(path: &Path) -> PortpubResult<Self> {
        let content = fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

        match ext.to_lowercase().as_str() {
            "json" => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse from YAML.
    pub fn from_yaml(content: &str) -> PortpubResult<Self> {
        serde_yaml::from_str(content).map_err(|e| PortpubError::Config {
            message: format!("Failed to parse YAML publish request: {e}"),
        })
    }

    /// Parse from JSON.
    pub fn from_json(content: &str) -> PortpubResult<Self> {
        serde_json::from_str(content).map_err(|e| PortpubError::Config {
            message: format!("Failed to parse JSON publish request: {e}"),
        })
    }

    fn has_exposed_ports(&self) -> bool {
        !self.expose.is_empty()
            || self
                .image_exposed_ports
                .as_ref()
                .is_some_and(|ports| !ports.is_empty())
    }
}

/// Computes port mapping tables.
#[derive(Debug)]
pub struct PortPublisher<S = OsPortSource> {
    config: PublishConfig,
    source: S,
}

impl PortPublisher<OsPortSource> {
    /// Create a publisher that probes the host for free ports.
    #[must_use]
    pub const fn new(config: PublishConfig) -> Self {
        Self {
            config,
            source: OsPortSource::new(),
        }
    }
}

impl<S: PortSource> PortPublisher<S> {
    /// Create a publisher drawing host ports from `source`.
    pub const fn with_source(config: PublishConfig, source: S) -> Self {
        Self { config, source }
    }

    /// The port source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Build the final mapping table for `request`.
    ///
    /// Explicit mappings come first, in request order, followed by the
    /// auto-published exposed ports in ascending port order. Auto-published
    /// entries have an empty host IP.
    pub fn publish(&mut self, request: &PublishRequest) -> PortpubResult<Vec<PortMapping>> {
        self.publish_with_claims(request)
            .map(|validated| validated.mappings)
    }

    /// Same as [`publish`](Self::publish), keeping the claimed ports.
    fn publish_with_claims(
        &mut self,
        request: &PublishRequest,
    ) -> PortpubResult<ValidatedMappings> {
        self.config.validate()?;

        let validated = parse_port_mappings(&request.port_mappings, &self.config)?;
        if !request.publish_exposed_ports || !request.has_exposed_ports() {
            return Ok(validated);
        }
        let ValidatedMappings {
            mut mappings,
            mut claims,
        } = validated;

        tracing::debug!("Adding exposed ports");

        let mut expose = ExposeSet::from_overrides(&request.expose)?;
        if let Some(image_ports) = &request.image_exposed_ports {
            expose.merge_image_ports(image_ports.iter().map(String::as_str))?;
        }

        // Explicit mappings on a specific host IP do not stop a port from
        // also being published on the wildcard address.
        let mut to_expose = Vec::new();
        for (port, protocols) in expose.resolve()? {
            for protocol in protocols {
                if claims
                    .host_port_for(protocol, WILDCARD_HOST_IP, port)
                    .is_none()
                {
                    to_expose.push((port, protocol));
                }
            }
        }

        for (container_port, protocol) in to_expose {
            let host_port = self.allocate_host_port(&claims, container_port, protocol)?;
            claims.claim(protocol, WILDCARD_HOST_IP, container_port, host_port);

            tracing::debug!(
                container_port,
                host_port,
                %protocol,
                "Mapping exposed port to host port"
            );
            mappings.push(PortMapping {
                host_port,
                container_port,
                protocol,
                host_ip: String::new(),
            });
        }

        Ok(ValidatedMappings { mappings, claims })
    }

    /// Find a host port not yet claimed on the wildcard address.
    fn allocate_host_port(
        &mut self,
        claims: &ClaimTables,
        container_port: u16,
        protocol: Protocol,
    ) -> PortpubResult<u16> {
        let attempts = self.config.probe_attempts;

        for attempt in 1..=attempts {
            let candidate = self.source.probe()?;
            if candidate != 0
                && !claims
                    .host_to_container()
                    .contains(protocol, WILDCARD_HOST_IP, candidate)
            {
                return Ok(candidate);
            }
            tracing::trace!(
                candidate,
                attempt,
                container_port,
                %protocol,
                "Host port already allocated, retrying"
            );
        }

        Err(PortpubError::PortAllocationExhausted {
            container_port,
            protocol: protocol.to_string(),
            attempts,
        })
    }
}

/// Compute the final mapping table for `request`, probing the host for free ports.
pub fn compute_mappings(
    request: &PublishRequest,
    config: &PublishConfig,
) -> PortpubResult<Vec<PortMapping>> {
    PortPublisher::new(config.clone()).publish(request)
}
