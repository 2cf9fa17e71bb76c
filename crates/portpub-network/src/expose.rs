//! Ports a container exposes without naming a host port.
//!
//! Exposed ports come from two places: an explicit override map set on the
//! container, and the `port[/protocol]` declarations of its image. Both are
//! folded into one [`ExposeSet`]. When the two name the same port, the
//! protocols of both are kept.

use std::collections::{BTreeMap, BTreeSet};

use portpub_common::{PortpubError, PortpubResult};

use crate::protocol::{Protocol, resolve_protocols};

/// Container ports to expose, each with a protocol specifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposeSet {
    ports: BTreeMap<u16, String>,
}

impl ExposeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit override map of port to protocol specifier.
    pub fn from_overrides(overrides: &BTreeMap<u16, String>) -> PortpubResult<Self> {
        let mut set = Self::new();
        for (&port, protocol) in overrides {
            if port == 0 {
                return Err(PortpubError::InvalidExposeSpec {
                    spec: format!("{port}/{protocol}"),
                    reason: "cannot expose 0 as it is not a valid port number".to_string(),
                });
            }
            set.add(port, protocol);
        }
        Ok(set)
    }

    /// Fold in image declarations of the form `port[/protocol]`.
    pub fn merge_image_ports<'a, I>(&mut self, declared: I) -> PortpubResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for spec in declared {
            let (port, protocol) = parse_exposed_port(spec)?;
            self.add(port, protocol);
        }
        Ok(())
    }

    /// Add `protocol` to the specifier of `port`.
    pub fn add(&mut self, port: u16, protocol: &str) {
        self.ports
            .entry(port)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(protocol);
            })
            .or_insert_with(|| protocol.to_string());
    }

    /// Resolve every specifier, in ascending port order.
    ///
    /// Exposed ports are auto-published, which SCTP does not support.
    pub fn resolve(&self) -> PortpubResult<Vec<(u16, BTreeSet<Protocol>)>> {
        self.ports
            .iter()
            .map(|(&port, spec)| Ok((port, resolve_protocols(spec, false)?)))
            .collect()
    }
}

/// Parse an image declaration such as `"80"`, `"53/udp"` or `"8080/tcp"`.
///
/// The protocol part is returned as written, `"tcp"` when absent, and is
/// checked later when the set is resolved.
pub fn parse_exposed_port(spec: &str) -> PortpubResult<(u16, &str)> {
    let (number, protocol) = spec.split_once('/').unwrap_or((spec, "tcp"));

    let port: u32 = number.parse().map_err(|_| PortpubError::InvalidExposeSpec {
        spec: spec.to_string(),
        reason: format!("unable to convert {number:?} to a port number"),
    })?;

    match u16::try_from(port) {
        Ok(port) if port != 0 => Ok((port, protocol)),
        _ => Err(PortpubError::InvalidExposeSpec {
            spec: spec.to_string(),
            reason: format!("{port} is not a valid port number"),
        }),
    }
}
