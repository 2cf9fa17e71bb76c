//! Validation of explicit port mappings.

use std::net::IpAddr;

use portpub_common::{PortpubError, PortpubResult, PublishConfig};

use crate::claims::{ClaimTables, WILDCARD_HOST_IP};
use crate::mapping::{PortMapping, PortMappingRequest};
use crate::protocol::resolve_protocols;

/// Explicit mappings after range expansion, with the ports they claim.
#[derive(Debug, Clone, Default)]
pub struct ValidatedMappings {
    /// One entry per bound (container port, protocol) pair, in request order.
    pub mappings: Vec<PortMapping>,
    /// Ports claimed by `mappings`.
    pub claims: ClaimTables,
}

/// Expand and check user-requested port mappings.
///
/// Requests are expanded over their range and protocols. A container port
/// may be bound to one host port and a host port to one container port, per
/// protocol and host IP. Repeating an identical pair is accepted and
/// produces a single mapping. Any violation fails the whole call.
pub fn parse_port_mappings(
    requests: &[PortMappingRequest],
    config: &PublishConfig,
) -> PortpubResult<ValidatedMappings> {
    let mut validated = ValidatedMappings::default();

    for request in requests {
        expand_request(request, config, &mut validated)?;
    }

    tracing::debug!(
        requests = requests.len(),
        mappings = validated.mappings.len(),
        "Validated explicit port mappings"
    );
    Ok(validated)
}

/// Parse a user-supplied host IP, empty meaning the wildcard address.
pub fn parse_host_ip(host_ip: &str) -> PortpubResult<IpAddr> {
    if host_ip.is_empty() {
        return Ok(WILDCARD_HOST_IP);
    }
    host_ip.parse().map_err(|_| PortpubError::InvalidHostIp {
        host_ip: host_ip.to_string(),
    })
}

fn expand_request(
    request: &PortMappingRequest,
    config: &PublishConfig,
    validated: &mut ValidatedMappings,
) -> PortpubResult<()> {
    let protocols = resolve_protocols(&request.protocol, true)?;
    let host_ip = parse_host_ip(&request.host_ip)?;

    let range = request.range.max(1);
    let container_port = request.container_port;
    if container_port == 0 {
        return Err(PortpubError::ZeroContainerPort);
    }
    let host_port = if request.host_port == 0 {
        container_port
    } else {
        request.host_port
    };

    let span = u32::from(range) - 1;
    if span + u32::from(container_port) > 65535 {
        return Err(PortpubError::ContainerPortRangeOverflow {
            container_port,
            range,
        });
    }
    if span + u32::from(host_port) > config.host_port_ceiling() {
        return Err(PortpubError::HostPortRangeOverflow { host_port, range });
    }

    for protocol in protocols {
        for offset in 0..range {
            let c_port = container_port.wrapping_add(offset);
            // Only reachable with the legacy bound, where the last host port wraps.
            let h_port = host_port.wrapping_add(offset);
            if c_port == 0 || h_port == 0 {
                return Err(PortpubError::ZeroPortInExpansion {
                    host_port,
                    container_port,
                    offset,
                });
            }

            let bound_host = validated.claims.host_port_for(protocol, host_ip, c_port);
            if bound_host.is_some_and(|existing| existing != h_port) {
                return Err(PortpubError::ConflictingContainerPort {
                    container_port: c_port,
                    protocol: protocol.to_string(),
                });
            }

            let bound_container = validated
                .claims
                .container_port_for(protocol, host_ip, h_port);
            if bound_container.is_some_and(|existing| existing != c_port) {
                return Err(PortpubError::ConflictingHostPort {
                    host_port: h_port,
                    protocol: protocol.to_string(),
                });
            }

            if bound_host == Some(h_port) && bound_container == Some(c_port) {
                tracing::debug!(
                    container_port = c_port,
                    host_port = h_port,
                    %protocol,
                    %host_ip,
                    "Skipping duplicate port mapping"
                );
                continue;
            }

            validated.claims.claim(protocol, host_ip, c_port, h_port);
            // Keep the requested host IP so unset stays unset downstream.
            validated.mappings.push(PortMapping {
                host_port: h_port,
                container_port: c_port,
                protocol,
                host_ip: request.host_ip.clone(),
            });
        }
    }

    Ok(())
}
