//! Synchronize ENR-style discovery records from a Consul service catalog
//! into a CloudFlare DNS zone as TXT records.
//!
//! The heavy lifting of building the Merkle tree of discovery records is
//! delegated to an external tree-creator binary; this crate queries the
//! registry, drives that binary, and swaps the TXT records at the provider.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dnsdisc::{sync, CloudflareDns, ConsulCatalog, TreeGenerator};
//!
//! #[tokio::main]
//! async fn main() -> dnsdisc::Result<()> {
//!     let catalog = ConsulCatalog::new("127.0.0.1", 8500);
//!     let generator = TreeGenerator::builder("/usr/local/bin/tree_creator", "aa..ff").build();
//!     let dns = CloudflareDns::new("ops@example.org", "api-key");
//!
//!     let params = sync::SyncParams {
//!         service: "nim-waku-v2-enr".into(),
//!         meta_filter: [("env".into(), "wakuv2".into())].into(),
//!         tree_domain: "nodes.example.org".into(),
//!         zone_domain: "example.org".into(),
//!     };
//!     let report = sync::run(&catalog, &generator, &dns, &params).await?;
//!     println!("created {} records", report.created);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

// Re-export core types
pub use dnsdisc_core::*;

// Re-export the adapters
pub use dnsdisc_client::{CloudflareDns, ConsulCatalog, TreeGenerator};

pub mod sync;
