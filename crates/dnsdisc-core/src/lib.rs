//! Core types and errors for the dnsdisc synchronizer.
//!
//! This crate provides the foundational types shared across the dnsdisc
//! workspace:
//!
//! - **Types**: Consul service instances, DNS records and zones
//! - **Errors**: The failure taxonomy of a sync run, as [`DnsdiscError`]

mod error;
pub mod types;

pub use error::{DnsdiscError, Result};
pub use types::*;
