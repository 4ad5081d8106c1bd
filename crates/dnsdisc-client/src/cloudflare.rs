//! CloudFlare DNS zone manager.

use dnsdisc_core::{DnsRecord, DnsdiscError, Result, Zone};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// The CloudFlare v4 API base URL
const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Records fetched per page when listing zone records
const RECORDS_PER_PAGE: u32 = 1000;

/// CloudFlare v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Serialize)]
struct CreateRecordBody<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
}

/// Client for TXT record CRUD within CloudFlare zones
pub struct CloudflareDns {
    http: HttpClient,
    base_url: String,
    email: String,
    token: String,
}

impl CloudflareDns {
    /// Create a client with the given account email and API key
    #[must_use]
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        CloudflareDnsBuilder::new(email, token).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(email: impl Into<String>, token: impl Into<String>) -> CloudflareDnsBuilder {
        CloudflareDnsBuilder::new(email, token)
    }

    /// Resolve the zone whose name matches `domain` exactly
    pub async fn resolve_zone(&self, domain: &str) -> Result<Zone> {
        let zones: Vec<Zone> = self
            .get(&format!("/zones?name={}", urlencoding::encode(domain)))
            .await?
            .0;
        zones
            .into_iter()
            .find(|zone| zone.name == domain)
            .ok_or_else(|| DnsdiscError::ZoneNotFound {
                domain: domain.to_string(),
            })
    }

    /// List every TXT record in `zone` whose name ends with `suffix`.
    ///
    /// Drains all pages from the provider; zones holding more records than
    /// one page are handled correctly.
    pub async fn txt_records(&self, zone: &Zone, suffix: &str) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let (batch, info): (Vec<DnsRecord>, Option<ResultInfo>) = self
                .get(&format!(
                    "/zones/{}/dns_records?type=TXT&per_page={RECORDS_PER_PAGE}&page={page}",
                    zone.id
                ))
                .await?;

            records.extend(batch.into_iter().filter(|r| r.name.ends_with(suffix)));

            match info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => return Ok(records),
            }
        }
    }

    /// Delete one record by provider id
    pub async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records/{record_id}", self.base_url, zone.id);
        debug!(url = %url, "DELETE request");

        let response = self
            .authed(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| DnsdiscError::ProviderError {
                code: None,
                message: e.to_string(),
            })?;

        self.decode::<serde_json::Value>(response).await.map(|_| ())
    }

    /// Create one TXT record with the given name and content
    pub async fn create_record(&self, zone: &Zone, name: &str, content: &str) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone.id);
        debug!(url = %url, name = %name, "POST request");

        let body = CreateRecordBody {
            record_type: "TXT",
            name,
            content,
        };
        let response = self
            .authed(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| DnsdiscError::ProviderError {
                code: None,
                message: e.to_string(),
            })?;

        self.decode::<serde_json::Value>(response).await.map(|_| ())
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Key", &self.token)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<(T, Option<ResultInfo>)> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| DnsdiscError::ProviderError {
                code: None,
                message: e.to_string(),
            })?;

        let envelope = self.decode(response).await?;
        Ok(envelope)
    }

    /// Decode a v4 envelope, turning HTTP and API-level failures into
    /// [`DnsdiscError::ProviderError`]
    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<(T, Option<ResultInfo>)> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DnsdiscError::ProviderError {
                code: Some(status.as_u16()),
                message: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(DnsdiscError::ProviderError {
                code: Some(status.as_u16()),
                message: api_error_message(&body),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        if !envelope.success {
            return Err(DnsdiscError::ProviderError {
                code: Some(status.as_u16()),
                message: envelope
                    .errors
                    .first()
                    .map_or_else(|| "unknown API error".to_string(), |e| {
                        format!("{} (code {})", e.message, e.code)
                    }),
            });
        }

        match envelope.result {
            Some(result) => Ok((result, envelope.result_info)),
            None => Err(DnsdiscError::ProviderError {
                code: Some(status.as_u16()),
                message: "successful response with no result".to_string(),
            }),
        }
    }
}

/// Pull the first API error message out of a raw body, falling back to the
/// body itself
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| {
            envelope
                .errors
                .first()
                .map(|e| format!("{} (code {})", e.message, e.code))
        })
        .unwrap_or_else(|| body.to_string())
}

/// Builder for configuring a [`CloudflareDns`] client
pub struct CloudflareDnsBuilder {
    email: String,
    token: String,
    base_url: String,
    timeout: Duration,
}

impl CloudflareDnsBuilder {
    /// Create a new builder with account email and API key
    #[must_use]
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
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
    pub fn build(self) -> CloudflareDns {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .build()
            .expect("Failed to build HTTP client");

        CloudflareDns {
            http,
            base_url: self.base_url,
            email: self.email,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_prefers_envelope_errors() {
        let body = r#"{"success":false,"errors":[{"code":81044,"message":"Record does not exist."}],"result":null}"#;
        assert_eq!(api_error_message(body), "Record does not exist. (code 81044)");
    }

    #[test]
    fn api_error_message_falls_back_to_body() {
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }
}
