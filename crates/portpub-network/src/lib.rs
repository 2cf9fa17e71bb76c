//! # portpub-network
//!
//! Port publishing for containers.
//!
//! Given the explicit port mappings of a container, the ports its image
//! exposes and any exposed-port overrides, this crate produces the complete
//! list of host to container port bindings for the network backend:
//!
//! - explicit mappings are expanded over ranges and protocols and checked
//!   for conflicts ([`parse_port_mappings`]);
//! - exposed ports not covered by an explicit mapping are published on free
//!   host ports probed from the OS ([`PortPublisher`]).
//!
//! ```no_run
//! use portpub_common::PublishConfig;
//! use portpub_network::{PortMappingRequest, PublishRequest, compute_mappings};
//!
//! # fn example() -> portpub_common::PortpubResult<()> {
//! let request = PublishRequest {
//!     port_mappings: vec![PortMappingRequest::new(80).with_host_port(8080)],
//!     image_exposed_ports: Some(["443/tcp".to_string()].into()),
//!     publish_exposed_ports: true,
//!     ..PublishRequest::default()
//! };
//!
//! for mapping in compute_mappings(&request, &PublishConfig::default())? {
//!     println!("{} -> {}", mapping.host_port, mapping.container_port);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod claims;
pub mod expose;
pub mod mapping;
pub mod probe;
pub mod protocol;
pub mod publish;
pub mod validate;

pub use claims::{ClaimTables, PortTable, WILDCARD_HOST_IP};
pub use expose::{ExposeSet, parse_exposed_port};
pub use mapping::{PortMapping, PortMappingRequest};
pub use probe::{OsPortSource, PortSource};
pub use protocol::{Protocol, resolve_protocols};
pub use publish::{PortPublisher, PublishRequest, compute_mappings};
pub use validate::{ValidatedMappings, parse_host_ip, parse_port_mappings};
