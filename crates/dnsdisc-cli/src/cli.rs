//! Command-line argument definitions and the entry point.

use anyhow::Result;
use clap::Parser;
use dnsdisc::sync::{self, SyncParams};
use dnsdisc::{CloudflareDns, ConsulCatalog, TreeGenerator};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Generate and publish DNS discovery records
///
/// Queries a Consul catalog for service instances carrying ENR records,
/// builds a DNS discovery tree with the external tree-creator binary, and
/// replaces the TXT records under the tree domain in a CloudFlare zone.
#[derive(Parser, Debug)]
#[command(name = "dnsdisc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CloudFlare account email
    #[arg(short = 'm', long)]
    pub cf_email: String,

    /// CloudFlare API token
    #[arg(short = 't', long, env = "CF_TOKEN", hide_env_values = true)]
    pub cf_token: String,

    /// CloudFlare zone domain
    #[arg(short = 'D', long)]
    pub cf_domain: String,

    /// RPC listen host for the tree creator
    #[arg(short = 'r', long, default_value = "127.0.0.1")]
    pub rpc_host: String,

    /// RPC listen port for the tree creator
    #[arg(short = 'c', long, default_value_t = 8545)]
    pub rpc_port: u16,

    /// Consul host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub consul_host: String,

    /// Consul port
    #[arg(short = 'P', long, default_value_t = 8500)]
    pub consul_port: u16,

    /// Consul API token
    #[arg(short = 'T', long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Name of the Consul service to query
    #[arg(short = 'n', long, default_value = "nim-waku-v2-enr")]
    pub service: String,

    /// Environment metadata filter for the service query
    #[arg(short = 'e', long = "env", default_value = "wakuv2")]
    pub query_env: String,

    /// Stage metadata filter for the service query
    #[arg(short = 's', long = "stage", default_value = "test")]
    pub query_stage: String,

    /// Fully qualified domain name for the tree root entry
    #[arg(short = 'd', long)]
    pub domain: String,

    /// Path to the tree_creator binary from nim-dnsdisc
    #[arg(short = 'C', long)]
    pub tree_creator: PathBuf,

    /// Tree creator private key as 64 char hex string
    #[arg(short = 'p', long)]
    pub private_key: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, default_value = "info")]
    pub log_level: String,
}

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    crate::telemetry::init(&cli.log_level)?;

    debug!(host = %cli.consul_host, port = cli.consul_port, "connecting to Consul");
    let mut catalog = ConsulCatalog::builder(&cli.consul_host, cli.consul_port);
    if let Some(ref token) = cli.consul_token {
        catalog = catalog.token(token);
    }
    let catalog = catalog.build();

    let generator = TreeGenerator::builder(&cli.tree_creator, &cli.private_key)
        .rpc_host(&cli.rpc_host)
        .rpc_port(cli.rpc_port)
        .build();

    debug!(email = %cli.cf_email, "connecting to CloudFlare");
    let dns = CloudflareDns::new(&cli.cf_email, &cli.cf_token);

    let params = SyncParams {
        service: cli.service,
        meta_filter: BTreeMap::from([
            ("env".to_string(), cli.query_env),
            ("stage".to_string(), cli.query_stage),
        ]),
        tree_domain: cli.domain,
        zone_domain: cli.cf_domain,
    };

    let report = sync::run(&catalog, &generator, &dns, &params).await?;
    info!(
        instances = report.instances,
        deleted = report.deleted,
        created = report.created,
        "sync complete"
    );

    Ok(())
}
