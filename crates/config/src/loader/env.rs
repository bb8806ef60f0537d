//! Environment variable source.
//!
//! Responsibilities:
//! - Name every `CRIBL_*` variable the auth layer consumes.
//! - Read them (from the process or from an explicit map) into a `PartialConfig`.
//! - Provide helper functions for reading env vars with empty/whitespace filtering.
//!
//! Does NOT handle:
//! - Loading from profile files (see profile.rs).
//! - Merging layers (see `types::EffectiveConfig`).
//! - .env file loading (see dotenv.rs).
//!
//! Invariants:
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).

use std::collections::HashMap;
use std::fmt;

use secrecy::SecretString;

use super::source::ConfigSource;
use crate::types::PartialConfig;

pub const CRIBL_CLIENT_ID: &str = "CRIBL_CLIENT_ID";
pub const CRIBL_CLIENT_SECRET: &str = "CRIBL_CLIENT_SECRET";
pub const CRIBL_ORGANIZATION_ID: &str = "CRIBL_ORGANIZATION_ID";
pub const CRIBL_WORKSPACE_ID: &str = "CRIBL_WORKSPACE_ID";
pub const CRIBL_CLOUD_DOMAIN: &str = "CRIBL_CLOUD_DOMAIN";
pub const CRIBL_BEARER_TOKEN: &str = "CRIBL_BEARER_TOKEN";
pub const CRIBL_AUDIENCE: &str = "CRIBL_AUDIENCE";
pub const CRIBL_ONPREM_SERVER_URL: &str = "CRIBL_ONPREM_SERVER_URL";
pub const CRIBL_ONPREM_USERNAME: &str = "CRIBL_ONPREM_USERNAME";
pub const CRIBL_ONPREM_PASSWORD: &str = "CRIBL_ONPREM_PASSWORD";
pub const CRIBL_OKTA_DOMAIN: &str = "CRIBL_OKTA_DOMAIN";
pub const CRIBL_OKTA_AUTH_SERVER_ID: &str = "CRIBL_OKTA_AUTH_SERVER_ID";
pub const CRIBL_OKTA_DEFAULT_AUTH_SERVER_ID: &str = "CRIBL_OKTA_DEFAULT_AUTH_SERVER_ID";
pub const CRIBL_CONFIG_PATH: &str = "CRIBL_CONFIG_PATH";
pub const CRIBL_PROFILE: &str = "CRIBL_PROFILE";

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        // No trimming needed, return original to avoid allocation
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(non_blank)
}

/// Configuration layer backed by environment variables.
///
/// `EnvSource::new()` reads the process environment at every `load()`;
/// `EnvSource::from_pairs` reads a fixed map instead.
#[derive(Clone, Default)]
pub struct EnvSource {
    vars: Option<HashMap<String, String>>,
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; only show which keys a fixed map carries.
        match &self.vars {
            None => f.write_str("EnvSource(process)"),
            Some(vars) => {
                let mut keys: Vec<_> = vars.keys().collect();
                keys.sort();
                f.debug_tuple("EnvSource").field(&keys).finish()
            }
        }
    }
}

impl EnvSource {
    /// Source reading the process environment.
    pub fn new() -> Self {
        Self { vars: None }
    }

    /// Source reading a fixed set of variables instead of the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Some(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up one variable with empty/whitespace filtering.
    pub fn get(&self, key: &str) -> Option<String> {
        match &self.vars {
            None => env_var_or_none(key),
            Some(vars) => vars.get(key).cloned().and_then(non_blank),
        }
    }

    fn get_secret(&self, key: &str) -> Option<SecretString> {
        self.get(key).map(|s| SecretString::new(s.into()))
    }

    /// On-prem server URL, if configured. Used for the init-time short-circuit.
    pub fn onprem_server_url(&self) -> Option<String> {
        self.get(CRIBL_ONPREM_SERVER_URL)
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn load(&self) -> PartialConfig {
        PartialConfig {
            client_id: self.get(CRIBL_CLIENT_ID),
            client_secret: self.get_secret(CRIBL_CLIENT_SECRET),
            organization_id: self.get(CRIBL_ORGANIZATION_ID),
            workspace_id: self.get(CRIBL_WORKSPACE_ID),
            cloud_domain: self.get(CRIBL_CLOUD_DOMAIN),
            onprem_server_url: self.get(CRIBL_ONPREM_SERVER_URL),
            onprem_username: self.get(CRIBL_ONPREM_USERNAME),
            onprem_password: self.get_secret(CRIBL_ONPREM_PASSWORD),
            bearer_token: self.get_secret(CRIBL_BEARER_TOKEN),
            audience: self.get(CRIBL_AUDIENCE),
            okta_domain: self.get(CRIBL_OKTA_DOMAIN),
            okta_auth_server_id: self.get(CRIBL_OKTA_AUTH_SERVER_ID),
            okta_default_auth_server_id: self.get(CRIBL_OKTA_DEFAULT_AUTH_SERVER_ID),
        }
    }
}
