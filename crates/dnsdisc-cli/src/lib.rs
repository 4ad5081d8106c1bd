//! # dnsdisc-cli
//!
//! One-shot operator utility for generating and publishing DNS discovery
//! records: queries a Consul catalog for ENR-publishing service instances,
//! feeds them to the external tree-creator binary, and replaces the TXT
//! records in a CloudFlare zone with the generated tree.

pub mod cli;
pub mod telemetry;

pub use cli::run;
