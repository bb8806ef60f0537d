//! Tracing subscriber initialization.
//!
//! The auth layer only emits `tracing` events; binaries that embed it can call
//! [`TracingConfig::init`] to get the same `EnvFilter` + fmt setup everywhere.
//!
//! ```rust,ignore
//! use cribl_client::tracing::TracingConfig;
//!
//! TracingConfig::new().with_json(true).init()?;
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the fallback filter directive.
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Builder method to toggle JSON output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }

    /// Install the global subscriber.
    ///
    /// # Errors
    /// Returns an error if a global subscriber is already installed.
    pub fn init(&self) -> Result<(), TracingError> {
        use tracing_subscriber::fmt;

        let registry = tracing_subscriber::registry().with(self.env_filter());
        let result = if self.json {
            registry.with(fmt::layer().json()).try_init()
        } else {
            registry.with(fmt::layer()).try_init()
        };

        result.map_err(|e| TracingError::InitError(e.to_string()))
    }
}

/// Errors that can occur during tracing initialization.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    InitError(String),
}
