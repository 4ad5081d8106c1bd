//! The coordinating pipeline of a sync run.
//!
//! Strictly linear: query instances, extract endpoints, generate the record
//! tree, then replace the provider's TXT records wholesale. Deletion only
//! happens after generation has succeeded, so a generator failure leaves
//! the zone untouched. There is no rollback: a failure while creating the
//! new records leaves the zone partially updated until the next run.

use dnsdisc_client::{CloudflareDns, ConsulCatalog, TreeGenerator};
use dnsdisc_core::{DnsdiscError, Result, ServiceInstance};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Parameters of one synchronization run
#[derive(Debug, Clone)]
pub struct SyncParams {
    /// Consul service to query
    pub service: String,

    /// Exact-match node-metadata filter applied to the query
    pub meta_filter: BTreeMap<String, String>,

    /// Fully qualified domain of the record tree root
    /// (also the suffix old records are matched against)
    pub tree_domain: String,

    /// Domain of the CloudFlare zone holding the records
    pub zone_domain: String,
}

/// Counters from a completed run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    /// Service instances found in the registry
    pub instances: usize,

    /// Old TXT records deleted
    pub deleted: usize,

    /// New TXT records created
    pub created: usize,
}

/// Run the full pipeline once.
///
/// Any error aborts immediately and propagates to the caller; the only
/// guaranteed cleanup is termination of the generator process, which the
/// adapter itself takes care of.
pub async fn run(
    catalog: &ConsulCatalog,
    generator: &TreeGenerator,
    dns: &CloudflareDns,
    params: &SyncParams,
) -> Result<SyncReport> {
    debug!(service = %params.service, filter = ?params.meta_filter, "querying service instances");
    let instances = catalog
        .all_instances(&params.service, &params.meta_filter)
        .await?;
    for instance in &instances {
        info!(node = %instance.node, service_id = %instance.service_id, "service found");
        debug!(endpoint = ?instance.discovery_endpoint(), "service ENR");
    }

    let endpoints = extract_endpoints(&instances)?;

    debug!(binary = %generator.binary().display(), "generating DNS records");
    let new_records = generator.generate(&params.tree_domain, &endpoints).await?;
    for (name, content) in &new_records {
        debug!(name = %name, content = %content, "new DNS record");
    }

    let zone = dns.resolve_zone(&params.zone_domain).await?;
    debug!(zone = %zone.name, suffix = %params.tree_domain, "querying TXT records");
    let old_records = dns.txt_records(&zone, &params.tree_domain).await?;

    for record in &old_records {
        info!(name = %record.name, "deleting record");
        dns.delete_record(&zone, &record.id).await?;
    }

    for (name, content) in &new_records {
        info!(name = %name, "creating record");
        dns.create_record(&zone, name, content).await?;
    }

    Ok(SyncReport {
        instances: instances.len(),
        deleted: old_records.len(),
        created: new_records.len(),
    })
}

/// Collect the discovery endpoint of every instance, in instance order.
///
/// An instance without the endpoint metadata key aborts the run; silently
/// publishing a tree that is missing nodes would be worse.
fn extract_endpoints(instances: &[ServiceInstance]) -> Result<Vec<String>> {
    instances
        .iter()
        .map(|instance| {
            instance
                .discovery_endpoint()
                .map(str::to_string)
                .ok_or_else(|| DnsdiscError::MissingEndpoint {
                    node: instance.node.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn instance(node: &str, meta: &[(&str, &str)]) -> ServiceInstance {
        ServiceInstance {
            node: node.into(),
            service_id: "enr-service".into(),
            service_meta: meta
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn extract_endpoints_preserves_order() {
        let instances = vec![
            instance("node-a", &[("node_enode", "enr:aaa")]),
            instance("node-b", &[("node_enode", "enr:bbb")]),
        ];
        let endpoints = extract_endpoints(&instances).unwrap();
        assert_eq!(endpoints, vec!["enr:aaa", "enr:bbb"]);
    }

    #[test]
    fn extract_endpoints_empty_input() {
        assert!(extract_endpoints(&[]).unwrap().is_empty());
    }

    #[test]
    fn extract_endpoints_fails_on_missing_meta() {
        let instances = vec![
            instance("node-a", &[("node_enode", "enr:aaa")]),
            instance("node-b", &[("env", "wakuv2")]),
        ];
        let err = extract_endpoints(&instances).unwrap_err();
        assert!(matches!(err, DnsdiscError::MissingEndpoint { node } if node == "node-b"));
    }
}
