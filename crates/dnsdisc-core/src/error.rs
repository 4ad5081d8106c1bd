use thiserror::Error;

/// Result type alias for dnsdisc operations
pub type Result<T> = std::result::Result<T, DnsdiscError>;

/// Errors that can abort a synchronization run
///
/// There is no local recovery anywhere in the pipeline: every variant
/// surfaces to the top level and terminates the run with a non-zero exit.
#[derive(Error, Debug)]
pub enum DnsdiscError {
    /// The Consul registry endpoint could not be reached or answered
    /// with a non-success status
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// The tree-generator binary could not be started
    #[error("failed to spawn generator binary {path}: {source}")]
    SpawnFailure {
        /// Path to the binary that failed to start
        path: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The generator process never became ready, its RPC endpoint was
    /// unreachable, or it returned a malformed or error response
    #[error("record generation failed: {0}")]
    GenerationFailure(String),

    /// No DNS zone in the provider account matches the requested domain
    #[error("no zone found for domain: {domain}")]
    ZoneNotFound {
        /// The domain name that matched no zone
        domain: String,
    },

    /// A DNS provider API call failed
    #[error("DNS provider error ({code:?}): {message}")]
    ProviderError {
        /// HTTP status code, when the request got that far
        code: Option<u16>,
        /// Error message from the provider
        message: String,
    },

    /// A registered instance is missing the discovery-endpoint metadata key
    #[error("instance on node {node} has no node_enode metadata")]
    MissingEndpoint {
        /// Node name of the offending instance
        node: String,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DnsdiscError {
    /// Returns true if the error originated in the DNS provider
    #[must_use]
    pub const fn is_provider_error(&self) -> bool {
        matches!(self, Self::ProviderError { .. } | Self::ZoneNotFound { .. })
    }

    /// Returns the provider HTTP status code if there is one
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderError { code, .. } => *code,
            _ => None,
        }
    }
}
