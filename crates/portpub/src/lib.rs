//! # portpub
//!
//! Command line driver for computing container port publishing tables.

#![warn(missing_docs)]

pub mod cli;

pub use cli::Cli;
