//! Thin adapters around the three external collaborators of a sync run:
//!
//! - [`ConsulCatalog`]: queries the Consul service catalog across all
//!   datacenters for instances carrying discovery endpoints
//! - [`TreeGenerator`]: runs the external tree-creator binary and fetches
//!   the generated TXT record set over its local JSON-RPC endpoint
//! - [`CloudflareDns`]: record CRUD within one CloudFlare zone
//!
//! All adapters are stateless between calls and perform no retries; any
//! failure propagates as a [`dnsdisc_core::DnsdiscError`] and aborts the run.

pub mod cloudflare;
pub mod consul;
pub mod generator;

pub use cloudflare::{CloudflareDns, CloudflareDnsBuilder};
pub use consul::{ConsulCatalog, ConsulCatalogBuilder};
pub use generator::{TreeGenerator, TreeGeneratorBuilder};
