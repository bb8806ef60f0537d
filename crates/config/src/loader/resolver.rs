//! Credential resolution.
//!
//! Responsibilities:
//! - Load the profile, environment and provider `ConfigSource`s, lowest
//!   precedence first, and merge them into one `EffectiveConfig`.
//!
//! Does NOT handle:
//! - Token acquisition or URL rewriting (see the client crate).
//!
//! Invariants:
//! - Resolution happens per call; nothing is cached between calls.
//! - Resolution never fails. Unreadable sources contribute empty layers.

use super::env::EnvSource;
use super::profile::ProfileSource;
use super::source::ConfigSource;
use crate::types::{EffectiveConfig, ProviderConfig};

/// Merges profile, environment, and provider layers.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env: EnvSource,
    profile: ProfileSource,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::from_environment()
    }
}

impl CredentialResolver {
    pub fn new(env: EnvSource, profile: ProfileSource) -> Self {
        Self { env, profile }
    }

    /// Process environment plus the profile file it points at.
    pub fn from_environment() -> Self {
        let env = EnvSource::new();
        let profile = ProfileSource::discover(&env);
        Self { env, profile }
    }

    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    pub fn profile(&self) -> &ProfileSource {
        &self.profile
    }

    /// Produce the effective configuration for one call.
    pub fn resolve(&self, provider: Option<&ProviderConfig>) -> EffectiveConfig {
        let no_provider = ProviderConfig::default();
        let sources: [&dyn ConfigSource; 3] = [
            &self.profile,
            &self.env,
            provider.unwrap_or(&no_provider),
        ];
        let [profile, env, provider] = sources.map(|source| source.load());

        let config = EffectiveConfig::from_layers(profile, env, provider);
        tracing::debug!(
            mode = ?config.mode,
            sources = ?sources.map(|source| source.name()),
            has_credential = config.has_any_credential(),
            "Resolved credentials"
        );
        config
    }
}
