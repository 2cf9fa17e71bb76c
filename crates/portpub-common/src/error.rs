//! Error types for port publishing.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`PortpubError`].
pub type PortpubResult<T> = Result<T, PortpubError>;

/// Errors raised while computing the port mapping table of a container.
#[derive(Error, Diagnostic, Debug)]
pub enum PortpubError {
    /// A protocol token is not one of tcp, udp or sctp.
    #[error("unrecognized protocol {protocol:?} in port mapping")]
    #[diagnostic(
        code(portpub::protocol::invalid),
        help("Valid protocols are tcp, udp and sctp, separated by commas")
    )]
    InvalidProtocol {
        /// The offending token.
        protocol: String,
    },

    /// The protocol is valid but not permitted in this context.
    #[error("protocol {protocol} is not allowed for exposed ports")]
    #[diagnostic(
        code(portpub::protocol::not_allowed),
        help("Publish the port with an explicit port mapping instead")
    )]
    ProtocolNotAllowed {
        /// The restricted protocol.
        protocol: String,
    },

    /// The host IP is not a valid IPv4 or IPv6 address.
    #[error("invalid IP address {host_ip:?} in port mapping")]
    #[diagnostic(code(portpub::mapping::invalid_host_ip))]
    InvalidHostIp {
        /// The host IP as given by the user.
        host_ip: String,
    },

    /// A mapping was requested for container port 0.
    #[error("container port number must be non-0")]
    #[diagnostic(code(portpub::mapping::zero_container_port))]
    ZeroContainerPort,

    /// Range expansion produced port 0.
    #[error(
        "host and container ports cannot be 0 (mapping {host_port}:{container_port}, offset {offset})"
    )]
    #[diagnostic(code(portpub::mapping::zero_port))]
    ZeroPortInExpansion {
        /// First host port of the range.
        host_port: u16,
        /// First container port of the range.
        container_port: u16,
        /// Offset into the range that produced port 0.
        offset: u16,
    },

    /// The container port range runs past the highest port number.
    #[error("container port range {container_port}+{range} exceeds maximum allowable port number")]
    #[diagnostic(code(portpub::mapping::container_range_overflow))]
    ContainerPortRangeOverflow {
        /// First container port of the range.
        container_port: u16,
        /// Number of ports in the range.
        range: u16,
    },

    /// The host port range runs past the highest port number.
    #[error("host port range {host_port}+{range} exceeds maximum allowable port number")]
    #[diagnostic(code(portpub::mapping::host_range_overflow))]
    HostPortRangeOverflow {
        /// First host port of the range.
        host_port: u16,
        /// Number of ports in the range.
        range: u16,
    },

    /// A container port is already bound to a different host port.
    #[error("conflicting port mappings for container port {container_port} (protocol {protocol})")]
    #[diagnostic(
        code(portpub::mapping::container_conflict),
        help("Each container port can be published to only one host port per host IP")
    )]
    ConflictingContainerPort {
        /// The contested container port.
        container_port: u16,
        /// Protocol of the conflicting mappings.
        protocol: String,
    },

    /// A host port is already bound to a different container port.
    #[error("conflicting port mappings for host port {host_port} (protocol {protocol})")]
    #[diagnostic(
        code(portpub::mapping::host_conflict),
        help("Each host port can forward to only one container port per host IP")
    )]
    ConflictingHostPort {
        /// The contested host port.
        host_port: u16,
        /// Protocol of the conflicting mappings.
        protocol: String,
    },

    /// An exposed port declaration is malformed.
    #[error("invalid exposed port {spec:?}: {reason}")]
    #[diagnostic(
        code(portpub::expose::invalid),
        help("Exposed ports use the form port[/protocol] with a port between 1 and 65535")
    )]
    InvalidExposeSpec {
        /// The declaration as written.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The operating system could not hand out an ephemeral port.
    #[error("unable to get free TCP port: {source}")]
    #[diagnostic(code(portpub::probe::failed))]
    PortProbeFailed {
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// No free host port was found within the retry budget.
    #[error(
        "failed to find an open port to expose container port {container_port}/{protocol} on the host after {attempts} attempts"
    )]
    #[diagnostic(
        code(portpub::allocation::exhausted),
        help("Publish the port explicitly or free up host ports")
    )]
    PortAllocationExhausted {
        /// Container port that needed a host port.
        container_port: u16,
        /// Protocol being published.
        protocol: String,
        /// Number of probes made.
        attempts: u32,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(portpub::config))]
    Config {
        /// The error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(portpub::io))]
    Io(#[from] std::io::Error),
}
