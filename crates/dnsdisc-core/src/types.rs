//! Transient data carried through one sync run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metadata key under which nodes publish their discovery endpoint
pub const ENDPOINT_META_KEY: &str = "node_enode";

/// Generated TXT record set: DNS record name to TXT payload.
///
/// Ordered so that record creation happens in a stable order run-to-run.
pub type TxtRecordSet = BTreeMap<String, String>;

/// One service instance as returned by the Consul catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Name of the node the instance runs on
    #[serde(rename = "Node")]
    pub node: String,

    /// Registered service identifier
    #[serde(rename = "ServiceID")]
    pub service_id: String,

    /// Service metadata, including the discovery endpoint
    #[serde(rename = "ServiceMeta", default)]
    pub service_meta: HashMap<String, String>,
}

impl ServiceInstance {
    /// The serialized peer-connection record published by this instance,
    /// if the instance carries one
    #[must_use]
    pub fn discovery_endpoint(&self) -> Option<&str> {
        self.service_meta.get(ENDPOINT_META_KEY).map(String::as_str)
    }
}

/// One TXT record as held by the DNS provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned record identifier
    pub id: String,

    /// Fully qualified record name
    pub name: String,

    /// TXT payload
    pub content: String,
}

/// A DNS zone, resolved once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-assigned zone identifier
    pub id: String,

    /// Zone domain name
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_endpoint_reads_node_enode() {
        let instance = ServiceInstance {
            node: "node-01.do-ams3".into(),
            service_id: "wakuv2-enr".into(),
            service_meta: HashMap::from([("node_enode".into(), "enr:aaa".into())]),
        };
        assert_eq!(instance.discovery_endpoint(), Some("enr:aaa"));
    }

    #[test]
    fn discovery_endpoint_missing_key() {
        let instance = ServiceInstance {
            node: "node-01.do-ams3".into(),
            service_id: "wakuv2-enr".into(),
            service_meta: HashMap::new(),
        };
        assert_eq!(instance.discovery_endpoint(), None);
    }

    #[test]
    fn instance_deserializes_consul_shape() {
        let raw = r#"{
            "Node": "node-01.ac-cn-hongkong-c",
            "ServiceID": "nim-waku-v2-enr",
            "ServiceMeta": {"node_enode": "enr:bbb", "env": "wakuv2"}
        }"#;
        let instance: ServiceInstance = serde_json::from_str(raw).unwrap();
        assert_eq!(instance.node, "node-01.ac-cn-hongkong-c");
        assert_eq!(instance.discovery_endpoint(), Some("enr:bbb"));
    }
}
