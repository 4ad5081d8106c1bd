//! dnsdisc - DNS discovery record synchronizer
//!
//! Publishes ENR records from a Consul catalog as a DNS discovery tree.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dnsdisc_cli::run().await
}
