//! Transport protocols and protocol specifier parsing.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use portpub_common::{PortpubError, PortpubResult};
use serde::{Deserialize, Serialize};

/// Protocol for port mapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP protocol.
    #[default]
    Tcp,
    /// UDP protocol.
    Udp,
    /// SCTP protocol.
    Sctp,
}

impl Protocol {
    /// Get the protocol name as used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = PortpubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "sctp" => Ok(Self::Sctp),
            other => Err(PortpubError::InvalidProtocol {
                protocol: other.to_string(),
            }),
        }
    }
}

/// Resolve a comma-separated protocol specifier such as `"tcp,udp"`.
///
/// Empty components mean tcp and duplicates collapse. SCTP is rejected with
/// [`PortpubError::ProtocolNotAllowed`] unless `allow_sctp` is set. The
/// returned set is never empty and iterates tcp, udp, sctp in that order.
pub fn resolve_protocols(spec: &str, allow_sctp: bool) -> PortpubResult<BTreeSet<Protocol>> {
    let mut protocols = BTreeSet::new();

    for token in spec.split(',') {
        let protocol = if token.is_empty() {
            Protocol::Tcp
        } else {
            token.parse()?
        };
        if protocol == Protocol::Sctp && !allow_sctp {
            return Err(PortpubError::ProtocolNotAllowed {
                protocol: protocol.as_str().to_uppercase(),
            });
        }
        protocols.insert(protocol);
    }

    // split() always yields at least one token
    if protocols.is_empty() {
        return Err(PortpubError::InvalidProtocol {
            protocol: spec.to_string(),
        });
    }

    Ok(protocols)
}
