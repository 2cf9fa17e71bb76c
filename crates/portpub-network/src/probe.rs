//! Ephemeral host port probing.
//!
//! The operating system is asked for a free port by binding a TCP listener
//! to port 0 and closing it straight away. The answer is only a hint:
//!
//! - only TCP can be probed this way, so a port handed out for UDP or SCTP
//!   may in fact be taken for that protocol;
//! - another process may grab the port between the probe and the moment the
//!   network backend starts forwarding it.
//!
//! Two containers created at the same time may therefore be offered the same
//! port. Nothing here holds the port open.

use std::net::{Ipv4Addr, TcpListener};

use portpub_common::{PortpubError, PortpubResult};

/// A source of candidate host ports.
pub trait PortSource {
    /// Return one port number that is currently unused on the host.
    fn probe(&mut self) -> PortpubResult<u16>;
}

/// Port source backed by the host's ephemeral port range.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsPortSource;

impl OsPortSource {
    /// Create a new OS port source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PortSource for OsPortSource {
    fn probe(&mut self) -> PortpubResult<u16> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(|source| PortpubError::PortProbeFailed { source })?;
        let port = listener
            .local_addr()
            .map_err(|source| PortpubError::PortProbeFailed { source })?
            .port();

        tracing::trace!(port, "Probed ephemeral port");
        Ok(port)
    }
}

impl<S: PortSource + ?Sized> PortSource for &mut S {
    fn probe(&mut self) -> PortpubResult<u16> {
        (**self).probe()
    }
}
