//! Builder for [`CriblAuthHook`] instances.
//!
//! # What this module does NOT handle:
//! - Credential resolution (handled by `cribl_config::CredentialResolver`)
//! - Per-request behavior (handled by [`CriblAuthHook`] in `mod.rs`)
//!
//! # Invariants
//! - Without an explicit resolver, credentials come from the process environment
//!   and the profile file it points at
//! - Without an explicit HTTP client, one is built with the configured timeout

use std::sync::RwLock;
use std::time::Duration;

use cribl_config::CredentialResolver;
use cribl_config::constants::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS, MAX_AUTH_ATTEMPTS, RATE_LIMIT_PAUSE_MS,
};

use super::{CriblAuthHook, HookState};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::token::TokenManager;
use crate::transport::ResilientTransport;

/// Builder for creating a new [`CriblAuthHook`].
///
/// ```rust,ignore
/// use cribl_client::CriblAuthHook;
///
/// let hook = CriblAuthHook::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// let base_url = hook.init("https://example.com");
/// ```
pub struct CriblAuthHookBuilder {
    resolver: Option<CredentialResolver>,
    http: Option<reqwest::Client>,
    timeout: Duration,
    max_attempts: usize,
    rate_limit_pause: Duration,
    metrics: Option<MetricsCollector>,
}

impl Default for CriblAuthHookBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            http: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: MAX_AUTH_ATTEMPTS,
            rate_limit_pause: Duration::from_millis(RATE_LIMIT_PAUSE_MS),
            metrics: None,
        }
    }
}

impl CriblAuthHookBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific credential resolver.
    pub fn resolver(mut self, resolver: CredentialResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use an existing HTTP client for auth calls. `timeout` is then ignored.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Set the auth request timeout.
    ///
    /// Default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attempt budget of auth calls.
    ///
    /// Default is 3.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set how long `after_error` pauses on a 429.
    pub fn rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = pause;
        self
    }

    /// Set the metrics collector. Metrics are enabled by default.
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the hook.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client fails to build.
    pub fn build(self) -> Result<CriblAuthHook> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .redirect(reqwest::redirect::Policy::limited(DEFAULT_MAX_REDIRECTS))
                .build()?,
        };
        let metrics = self.metrics.unwrap_or_else(MetricsCollector::new);

        let transport = ResilientTransport::new(http)
            .with_max_attempts(self.max_attempts)
            .with_metrics(metrics.clone());

        Ok(CriblAuthHook {
            resolver: self.resolver.unwrap_or_default(),
            tokens: TokenManager::new(transport).with_metrics(metrics),
            state: RwLock::new(HookState::default()),
            rate_limit_pause: self.rate_limit_pause,
        })
    }
}
