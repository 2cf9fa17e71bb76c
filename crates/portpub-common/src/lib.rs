//! # portpub-common
//!
//! Shared types for the portpub crates.
//!
//! This crate provides:
//! - The error taxonomy for port publishing failures
//! - Publish configuration and its loading from TOML

#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{DEFAULT_PROBE_ATTEMPTS, PublishConfig};
pub use error::{PortpubError, PortpubResult};
