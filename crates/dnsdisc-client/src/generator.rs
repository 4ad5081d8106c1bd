//! Adapter around the external DNS tree-creator binary.
//!
//! The binary is spawned as a child process, serves the generated record
//! set over a local JSON-RPC endpoint, and is killed again on every exit
//! path out of [`TreeGenerator::generate`].

use dnsdisc_core::{DnsdiscError, Result, TxtRecordSet};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::debug;

/// How long the generator process gets to bind its RPC endpoint
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between readiness probes while the endpoint refuses connections
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<serde_json::Value>,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<TxtRecordSet>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Outcome of one RPC attempt: connection-level failures are retried until
/// the readiness deadline, everything else is final
enum RpcAttempt {
    Ready(Result<TxtRecordSet>),
    NotReady(String),
}

/// Runs the tree-creator binary and fetches generated TXT records from it
pub struct TreeGenerator {
    binary: PathBuf,
    rpc_host: String,
    rpc_port: u16,
    private_key: String,
    ready_timeout: Duration,
    poll_interval: Duration,
    http: HttpClient,
}

impl TreeGenerator {
    /// Create a builder for the generator adapter
    #[must_use]
    pub fn builder(binary: impl Into<PathBuf>, private_key: impl Into<String>) -> TreeGeneratorBuilder {
        TreeGeneratorBuilder::new(binary, private_key)
    }

    /// Path of the binary this adapter runs
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Generate the TXT record set for `domain` from the given discovery
    /// endpoints.
    ///
    /// Spawns the binary, polls its RPC endpoint until ready (bounded),
    /// issues a single `get_txt_records` call, and kills the process
    /// whether or not the call succeeded. An empty endpoint list is legal;
    /// the generator then typically returns only the tree root.
    pub async fn generate(&self, domain: &str, endpoints: &[String]) -> Result<TxtRecordSet> {
        let child = self.spawn(domain, endpoints)?;
        let guard = ProcessGuard::new(child);

        let result = self.fetch_records().await;
        guard.terminate().await;
        result
    }

    fn spawn(&self, domain: &str, endpoints: &[String]) -> Result<Child> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(format!("--private-key={}", self.private_key))
            .arg(format!("--rpc-address={}", self.rpc_host))
            .arg(format!("--rpc-port={}", self.rpc_port))
            .arg(format!("--domain={domain}"))
            .stdout(Stdio::null())
            .stdin(Stdio::null());
        for endpoint in endpoints {
            cmd.arg(format!("--enr-record={endpoint}"));
        }

        debug!(
            binary = %self.binary.display(),
            endpoints = endpoints.len(),
            "spawning tree generator"
        );
        cmd.spawn().map_err(|e| DnsdiscError::SpawnFailure {
            path: self.binary.display().to_string(),
            source: e,
        })
    }

    /// Poll the RPC endpoint until it answers or the readiness deadline
    /// passes, then return the decoded record set
    async fn fetch_records(&self) -> Result<TxtRecordSet> {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            match self.rpc_get_txt_records().await {
                RpcAttempt::Ready(result) => return result,
                RpcAttempt::NotReady(reason) => {
                    if Instant::now() >= deadline {
                        return Err(DnsdiscError::GenerationFailure(format!(
                            "generator RPC endpoint not ready within {:?}: {reason}",
                            self.ready_timeout
                        )));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn rpc_get_txt_records(&self) -> RpcAttempt {
        let url = format!("http://{}:{}/", self.rpc_host, self.rpc_port);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "get_txt_records",
            params: Vec::new(),
            id: 0,
        };

        let response = match self.http.post(&url).json(&request).send().await {
            Ok(response) => response,
            // Connection refused means the process has not bound yet.
            Err(e) if e.is_connect() => return RpcAttempt::NotReady(e.to_string()),
            Err(e) => {
                return RpcAttempt::Ready(Err(DnsdiscError::GenerationFailure(format!(
                    "generator RPC call failed: {e}"
                ))))
            }
        };

        RpcAttempt::Ready(decode_rpc_response(response).await)
    }
}

/// Decode a JSON-RPC response into the record set, treating an error
/// payload or a missing `result` field as fatal
async fn decode_rpc_response(response: reqwest::Response) -> Result<TxtRecordSet> {
    let status = response.status();
    if !status.is_success() {
        return Err(DnsdiscError::GenerationFailure(format!(
            "generator RPC endpoint returned {status}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| DnsdiscError::GenerationFailure(format!("generator RPC call failed: {e}")))?;

    let rpc: RpcResponse = serde_json::from_str(&body).map_err(|e| {
        DnsdiscError::GenerationFailure(format!("malformed generator response: {e}"))
    })?;

    if let Some(error) = rpc.error {
        return Err(DnsdiscError::GenerationFailure(format!(
            "generator returned error: {error}"
        )));
    }
    rpc.result.ok_or_else(|| {
        DnsdiscError::GenerationFailure("generator response has no result field".to_string())
    })
}

/// Scoped ownership of the generator child process.
///
/// The process is killed exactly once: explicitly via [`terminate`], or by
/// `Drop` if the enclosing future panics or is cancelled first.
///
/// [`terminate`]: ProcessGuard::terminate
struct ProcessGuard {
    child: Option<Child>,
}

impl ProcessGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Kill and reap the child
    async fn terminate(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                debug!(error = %e, "generator process already exited");
            }
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            // Errors only if the child already exited.
            let _ = child.start_kill();
        }
    }
}

/// Builder for configuring a [`TreeGenerator`]
pub struct TreeGeneratorBuilder {
    binary: PathBuf,
    rpc_host: String,
    rpc_port: u16,
    private_key: String,
    ready_timeout: Duration,
    poll_interval: Duration,
}

impl TreeGeneratorBuilder {
    /// Create a new builder from the binary path and signing key
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, private_key: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            rpc_host: "127.0.0.1".to_string(),
            rpc_port: 8545,
            private_key: private_key.into(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the host the generator binds its RPC endpoint on
    #[must_use]
    pub fn rpc_host(mut self, host: impl Into<String>) -> Self {
        self.rpc_host = host.into();
        self
    }

    /// Set the port the generator binds its RPC endpoint on
    #[must_use]
    pub fn rpc_port(mut self, port: u16) -> Self {
        self.rpc_port = port;
        self
    }

    /// Set how long to wait for the RPC endpoint to become ready
    #[must_use]
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Set the interval between readiness probes
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the adapter
    #[must_use]
    pub fn build(self) -> TreeGenerator {
        let http = HttpClient::builder()
            .build()
            .expect("Failed to build HTTP client");

        TreeGenerator {
            binary: self.binary,
            rpc_host: self.rpc_host,
            rpc_port: self.rpc_port,
            private_key: self.private_key,
            ready_timeout: self.ready_timeout,
            poll_interval: self.poll_interval,
            http,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn terminate_kills_long_running_child() {
        let child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let guard = ProcessGuard::new(child);

        let started = StdInstant::now();
        guard.terminate().await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn terminate_tolerates_exited_child() {
        let mut child = Command::new("true").spawn().unwrap();
        child.wait().await.unwrap();
        ProcessGuard::new(child).terminate().await;
    }
}
