//! Metrics collection for auth-endpoint traffic.
//!
//! This module records:
//! - Token fetches per flow
//! - Session cache hits
//! - Auth transport retries
//! - Errors by category
//!
//! # What this module does NOT handle:
//! - Metrics exposition/export (install any `metrics` recorder)
//! - Metrics for the API requests the hook decorates
//!
//! # Invariants
//! - Metric recording is infallible and never disrupts an auth call
//! - Zero-cost when no metrics recorder is installed

use crate::error::ClientError;

/// Metric name for token fetch counter.
pub const METRIC_TOKEN_FETCHES_TOTAL: &str = "cribl_auth_token_fetches_total";

/// Metric name for session cache hit counter.
pub const METRIC_CACHE_HITS: &str = "cribl_auth_cache_hits_total";

/// Metric name for retry counter.
pub const METRIC_RETRIES_TOTAL: &str = "cribl_auth_retries_total";

/// Metric name for error counter.
pub const METRIC_ERRORS_TOTAL: &str = "cribl_auth_errors_total";

/// Error categories for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed configuration
    Configuration,
    /// No credential resolved
    Unauthenticated,
    /// On-prem request to a cloud-only endpoint
    Restricted,
    /// Network errors and exhausted 429 retries
    Transient,
    /// Auth endpoint rejected the request
    Rejected,
    /// Caller cancelled
    Cancelled,
    /// Unknown/unclassified errors
    Unknown,
}

impl ErrorCategory {
    /// Returns the string label for this error category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Unauthenticated => "unauthenticated",
            ErrorCategory::Restricted => "restricted",
            ErrorCategory::Transient => "transient",
            ErrorCategory::Rejected => "rejected",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl From<&ClientError> for ErrorCategory {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::Configuration(_)
            | ClientError::MissingEnvVar { .. }
            | ClientError::InvalidUrl(_) => ErrorCategory::Configuration,
            ClientError::AuthenticationRequired => ErrorCategory::Unauthenticated,
            ClientError::RestrictedEndpoint { .. } => ErrorCategory::Restricted,
            ClientError::TransientUpstream { .. }
            | ClientError::Http(_)
            | ClientError::Transport(_) => ErrorCategory::Transient,
            ClientError::UpstreamAuthFailure { .. } | ClientError::InvalidResponse(_) => {
                ErrorCategory::Rejected
            }
            ClientError::Cancelled => ErrorCategory::Cancelled,
            ClientError::FailEarly { .. } => ErrorCategory::Unknown,
        }
    }
}

/// Metrics collector for auth-endpoint calls.
///
/// A thin wrapper around the `metrics` crate macros with consistent labels.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    /// Whether metrics collection is enabled.
    enabled: bool,
}

impl MetricsCollector {
    /// Create a new, enabled metrics collector.
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Create a disabled metrics collector.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Check if metrics collection is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a token fetch that reached the network.
    ///
    /// # Arguments
    /// * `flow` - The auth flow label (e.g., "client_credentials", "onprem_login")
    pub fn record_token_fetch(&self, flow: &'static str) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_TOKEN_FETCHES_TOTAL, "flow" => flow).increment(1);
    }

    /// Record a token served from the session cache.
    pub fn record_cache_hit(&self) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_CACHE_HITS).increment(1);
    }

    /// Record a retry attempt.
    ///
    /// # Arguments
    /// * `attempt` - The attempt number that is about to run (2-based)
    pub fn record_retry(&self, attempt: usize) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_RETRIES_TOTAL, "attempt" => attempt.to_string()).increment(1);
    }

    /// Record an error from a ClientError.
    pub fn record_error(&self, error: &ClientError) {
        if !self.enabled {
            return;
        }
        let category = ErrorCategory::from(error);
        metrics::counter!(METRIC_ERRORS_TOTAL, "error_category" => category.as_str()).increment(1);
    }
}
