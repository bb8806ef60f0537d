//! Per-call provider security overrides.
//!
//! Responsibilities:
//! - Model the security record a generated client passes with each call (`Security`).
//! - Turn it into a closed list of `SecurityOverride` variants (`ProviderConfig`).
//! - Produce the provider `PartialConfig` layer (`ConfigSource` for `ProviderConfig`).
//!
//! Does NOT handle:
//! - Precedence against other layers (see `types::effective`).
//!
//! Invariants:
//! - Only fields explicitly set (and non-blank) become overrides.
//! - A `Security` value, a reference to one, or a shared pointer to one all
//!   produce the same `ProviderConfig`.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::loader::ConfigSource;
use crate::types::effective::PartialConfig;

/// Security record supplied by the request pipeline.
#[derive(Debug, Clone, Default)]
pub struct Security {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub organization_id: Option<String>,
    pub workspace_id: Option<String>,
    pub cloud_domain: Option<String>,
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub bearer_token: Option<SecretString>,
}

/// A single override carried by the provider layer.
#[derive(Debug, Clone)]
pub enum SecurityOverride {
    /// OAuth client credentials (either half may be absent).
    OAuthCredentials {
        client_id: Option<String>,
        client_secret: Option<SecretString>,
    },
    /// Organization and/or workspace selection.
    OrgWorkspaceOverride {
        organization_id: Option<String>,
        workspace_id: Option<String>,
    },
    /// Cloud domain, e.g. `cribl-staging.cloud`.
    CloudDomainOverride(String),
    /// On-prem leader and optional login credentials.
    OnPremServer {
        server_url: String,
        username: Option<String>,
        password: Option<SecretString>,
    },
    /// Literal bearer token.
    BearerToken(SecretString),
}

/// Provider-level configuration for one call.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    overrides: Vec<SecurityOverride>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_blank_secret(value: Option<&SecretString>) -> Option<SecretString> {
    value
        .filter(|s| !s.expose_secret().trim().is_empty())
        .cloned()
}

impl ProviderConfig {
    /// Create a provider config from explicit overrides.
    pub fn new(overrides: Vec<SecurityOverride>) -> Self {
        Self { overrides }
    }

    /// Add one override. Later overrides win over earlier ones for the same field.
    pub fn with(mut self, value: SecurityOverride) -> Self {
        self.overrides.push(value);
        self
    }

    /// The overrides in application order.
    pub fn overrides(&self) -> &[SecurityOverride] {
        &self.overrides
    }

    /// Whether no override is present.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Build the provider layer.
    pub fn to_partial(&self) -> PartialConfig {
        self.overrides
            .iter()
            .fold(PartialConfig::default(), |layer, value| {
                layer.overlay(value.to_partial())
            })
    }
}

impl ConfigSource for ProviderConfig {
    fn name(&self) -> &'static str {
        "provider"
    }

    fn load(&self) -> PartialConfig {
        self.to_partial()
    }
}

impl SecurityOverride {
    fn to_partial(&self) -> PartialConfig {
        match self {
            Self::OAuthCredentials {
                client_id,
                client_secret,
            } => PartialConfig {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                ..PartialConfig::default()
            },
            Self::OrgWorkspaceOverride {
                organization_id,
                workspace_id,
            } => PartialConfig {
                organization_id: organization_id.clone(),
                workspace_id: workspace_id.clone(),
                ..PartialConfig::default()
            },
            Self::CloudDomainOverride(domain) => PartialConfig {
                cloud_domain: Some(domain.clone()),
                ..PartialConfig::default()
            },
            Self::OnPremServer {
                server_url,
                username,
                password,
            } => PartialConfig {
                onprem_server_url: Some(server_url.clone()),
                onprem_username: username.clone(),
                onprem_password: password.clone(),
                ..PartialConfig::default()
            },
            Self::BearerToken(token) => PartialConfig {
                bearer_token: Some(token.clone()),
                ..PartialConfig::default()
            },
        }
    }
}

impl From<&Security> for ProviderConfig {
    fn from(security: &Security) -> Self {
        let mut overrides = Vec::new();

        let client_id = non_blank(security.client_id.as_deref());
        let client_secret = non_blank_secret(security.client_secret.as_ref());
        if client_id.is_some() || client_secret.is_some() {
            overrides.push(SecurityOverride::OAuthCredentials {
                client_id,
                client_secret,
            });
        }

        let organization_id = non_blank(security.organization_id.as_deref());
        let workspace_id = non_blank(security.workspace_id.as_deref());
        if organization_id.is_some() || workspace_id.is_some() {
            overrides.push(SecurityOverride::OrgWorkspaceOverride {
                organization_id,
                workspace_id,
            });
        }

        if let Some(domain) = non_blank(security.cloud_domain.as_deref()) {
            overrides.push(SecurityOverride::CloudDomainOverride(domain));
        }

        if let Some(server_url) = non_blank(security.server_url.as_deref()) {
            overrides.push(SecurityOverride::OnPremServer {
                server_url,
                username: non_blank(security.username.as_deref()),
                password: non_blank_secret(security.password.as_ref()),
            });
        }

        if let Some(token) = non_blank_secret(security.bearer_token.as_ref()) {
            overrides.push(SecurityOverride::BearerToken(token));
        }

        Self { overrides }
    }
}

impl From<Security> for ProviderConfig {
    fn from(security: Security) -> Self {
        Self::from(&security)
    }
}

impl From<Arc<Security>> for ProviderConfig {
    fn from(security: Arc<Security>) -> Self {
        Self::from(security.as_ref())
    }
}

impl From<Vec<SecurityOverride>> for ProviderConfig {
    fn from(overrides: Vec<SecurityOverride>) -> Self {
        Self::new(overrides)
    }
}

impl FromIterator<SecurityOverride> for ProviderConfig {
    fn from_iter<I: IntoIterator<Item = SecurityOverride>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_string().into())
    }

    #[test]
    fn test_only_set_fields_become_overrides() {
        let security = Security {
            organization_id: Some("biz".to_string()),
            ..Default::default()
        };

        let provider = ProviderConfig::from(&security);
        assert_eq!(provider.overrides().len(), 1);
        assert!(matches!(
            provider.overrides()[0],
            SecurityOverride::OrgWorkspaceOverride { .. }
        ));

        let layer = provider.to_partial();
        assert_eq!(layer.organization_id.as_deref(), Some("biz"));
        assert!(layer.workspace_id.is_none());
        assert!(layer.client_id.is_none());
    }

    #[test]
    fn test_value_reference_and_arc_are_equivalent() {
        let security = Security {
            client_id: Some("id".to_string()),
            client_secret: Some(secret("secret")),
            cloud_domain: Some("cribl-staging.cloud".to_string()),
            ..Default::default()
        };

        let by_ref = ProviderConfig::from(&security).to_partial();
        let by_arc = ProviderConfig::from(Arc::new(security.clone())).to_partial();
        let by_value = ProviderConfig::from(security).to_partial();

        for layer in [by_ref, by_arc, by_value] {
            assert_eq!(layer.client_id.as_deref(), Some("id"));
            assert_eq!(
                layer.client_secret.as_ref().map(|s| s.expose_secret()),
                Some("secret")
            );
            assert_eq!(layer.cloud_domain.as_deref(), Some("cribl-staging.cloud"));
        }
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let security = Security {
            client_id: Some("".to_string()),
            client_secret: Some(secret("   ")),
            workspace_id: Some(" ".to_string()),
            ..Default::default()
        };

        let provider = ProviderConfig::from(security);
        assert!(provider.is_empty());
        assert!(provider.to_partial().is_empty());
    }

    #[test]
    fn test_later_overrides_win() {
        let provider: ProviderConfig = [
            SecurityOverride::CloudDomainOverride("first.cloud".to_string()),
            SecurityOverride::CloudDomainOverride("second.cloud".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            provider.to_partial().cloud_domain.as_deref(),
            Some("second.cloud")
        );
    }

    #[test]
    fn test_onprem_override_carries_login() {
        let provider = ProviderConfig::default().with(SecurityOverride::OnPremServer {
            server_url: "https://leader:9000".to_string(),
            username: Some("admin".to_string()),
            password: Some(secret("pw")),
        });

        let layer = provider.to_partial();
        assert!(layer.has_onprem_server());
        assert_eq!(layer.onprem_username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_provider_is_a_config_source() {
        let provider = ProviderConfig::default().with(SecurityOverride::BearerToken(secret("t")));
        let source: &dyn ConfigSource = &provider;

        assert_eq!(source.name(), "provider");
        let layer = source.load();
        assert_eq!(layer.bearer_token.as_ref().map(|s| s.expose_secret()), Some("t"));
        assert!(ProviderConfig::default().load().is_empty());
    }
}
