//! Consul catalog client.

use dnsdisc_core::{DnsdiscError, Result, ServiceInstance};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the Consul catalog API
pub struct ConsulCatalog {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl ConsulCatalog {
    /// Create a client for a Consul agent at the given host and port
    #[must_use]
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        ConsulCatalogBuilder::new(host, port).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(host: impl AsRef<str>, port: u16) -> ConsulCatalogBuilder {
        ConsulCatalogBuilder::new(host, port)
    }

    /// List all datacenters known to the registry, in registry order
    pub async fn datacenters(&self) -> Result<Vec<String>> {
        self.get("/v1/catalog/datacenters", &[]).await
    }

    /// List instances of `service` in one datacenter, filtered by exact
    /// match on every provided node-metadata key/value pair
    pub async fn instances(
        &self,
        service: &str,
        datacenter: &str,
        meta_filter: &BTreeMap<String, String>,
    ) -> Result<Vec<ServiceInstance>> {
        let mut params: Vec<(&str, String)> = vec![("dc", datacenter.to_string())];
        for (key, value) in meta_filter {
            params.push(("node-meta", format!("{key}:{value}")));
        }
        self.get(&format!("/v1/catalog/service/{service}"), &params)
            .await
    }

    /// List instances of `service` across every datacenter, concatenated in
    /// datacenter order.
    ///
    /// No deduplication: a node registered in more than one datacenter
    /// appears once per datacenter.
    pub async fn all_instances(
        &self,
        service: &str,
        meta_filter: &BTreeMap<String, String>,
    ) -> Result<Vec<ServiceInstance>> {
        let mut instances = Vec::new();
        for datacenter in self.datacenters().await? {
            instances.extend(self.instances(service, &datacenter, meta_filter).await?);
        }
        Ok(instances)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = self.build_url(path, params);
        debug!(url = %url, "GET request");

        let mut request = self.http.get(&url);
        if let Some(ref token) = self.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DnsdiscError::RegistryUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DnsdiscError::RegistryUnavailable(format!(
                "registry returned {status} for {path}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DnsdiscError::RegistryUnavailable(e.to_string()))?;
        serde_json::from_str(&body).map_err(DnsdiscError::Json)
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}

/// Builder for configuring a [`ConsulCatalog`]
pub struct ConsulCatalogBuilder {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl ConsulCatalogBuilder {
    /// Create a new builder targeting a Consul agent at host and port
    #[must_use]
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            base_url: format!("http://{}:{}", host.as_ref(), port),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the base URL entirely (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the ACL token sent with every request
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> ConsulCatalog {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .build()
            .expect("Failed to build HTTP client");

        ConsulCatalog {
            http,
            base_url: self.base_url,
            token: self.token,
        }
    }
}

// URL encoding helper
mod urlencoding {
    pub fn encode(s: &str) -> String {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}
