//! Error types for the Cribl auth layer.
//!
//! Every variant carries enough context (URL, status, variable name, path)
//! for a caller to diagnose the failure without knowing how the layer works.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while routing or authenticating a request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Unusable configuration, e.g. a workspace host with no domain part.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required environment override is not set.
    #[error("Missing required environment variable {var}: {context}")]
    MissingEnvVar { var: &'static str, context: String },

    /// No bearer token, client credentials, or on-prem login resolved.
    #[error(
        "Authentication required: set CRIBL_BEARER_TOKEN, CRIBL_CLIENT_ID/CRIBL_CLIENT_SECRET, or CRIBL_ONPREM_USERNAME/CRIBL_ONPREM_PASSWORD"
    )]
    AuthenticationRequired,

    /// On-prem request to a cloud-only API surface.
    #[error("Endpoint '{path}' is only available on Cribl.Cloud, not on on-prem deployments")]
    RestrictedEndpoint { path: String },

    /// Auth endpoint kept failing with network errors or 429s.
    #[error("Auth request to {url} failed after {attempts} attempts{}{}",
        .status.map(|s| format!(" (last status {s})")).unwrap_or_default(),
        if .body.is_empty() { String::new() } else { format!(": {}", .body) })]
    TransientUpstream {
        url: String,
        attempts: usize,
        status: Option<u16>,
        body: String,
    },

    /// Auth endpoint rejected the request.
    #[error("Auth request to {url} failed with status {status}: {body}")]
    UpstreamAuthFailure {
        url: String,
        status: u16,
        body: String,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection or body-read failure not surfaced as a `reqwest::Error`.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid response format from an auth endpoint.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Re-authentication already happened; the pipeline must not run further
    /// error handlers for this response.
    #[error("Request failed with status {status}; credentials refreshed, not retrying")]
    FailEarly { status: u16 },
}

impl ClientError {
    /// Check if this error is retryable by the auth transport.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport(_))
    }

    /// Check if this error indicates authentication failure.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::UpstreamAuthFailure { .. }
        )
    }

    /// Check if this error indicates a configuration problem.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::MissingEnvVar { .. } | Self::InvalidUrl(_)
        )
    }

    /// Check if the pipeline should stop running error handlers.
    pub fn is_fail_early(&self) -> bool {
        matches!(self, Self::FailEarly { .. })
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransientUpstream { status, .. } => *status,
            Self::UpstreamAuthFailure { status, .. } | Self::FailEarly { status } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
