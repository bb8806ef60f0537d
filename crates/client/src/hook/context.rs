//! Per-call context passed to the lifecycle hooks.

use cribl_config::ProviderConfig;
use tokio_util::sync::CancellationToken;

/// What the request pipeline knows about one call.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    security: Option<ProviderConfig>,
    cancel: CancellationToken,
    operation_id: Option<String>,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider-level security for this call.
    ///
    /// Accepts a `Security` value, a reference or `Arc` to one, or explicit
    /// `SecurityOverride`s.
    pub fn with_security(mut self, security: impl Into<ProviderConfig>) -> Self {
        self.security = Some(security.into());
        self
    }

    /// Token observed by auth retries and rate-limit pauses.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Operation name used in log events.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn security(&self) -> Option<&ProviderConfig> {
        self.security.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }
}
