//! Merged configuration records.
//!
//! Responsibilities:
//! - Define `PartialConfig`, the per-layer record every configuration source yields.
//! - Define `EffectiveConfig`, the merged record handed to routing and token code.
//! - Merge layers per field and decide the deployment mode.
//!
//! Does NOT handle:
//! - Reading any source (see the `loader` module).
//! - URL composition or token acquisition (see the client crate).
//!
//! Invariants:
//! - Precedence is evaluated per field: provider > environment > profile.
//! - An effective config is either cloud or on-prem, never both. On-prem mode
//!   clears every cloud-only field.

use secrecy::SecretString;

use crate::constants::DEFAULT_CLOUD_DOMAIN;

/// Deployment flavor targeted by an effective configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Cribl.Cloud: workspace and gateway APIs, OAuth client credentials.
    #[default]
    Cloud,
    /// Self-hosted leader reachable at a single server URL.
    OnPrem,
}

/// One configuration layer. Every field is optional so layers can be stacked.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub organization_id: Option<String>,
    pub workspace_id: Option<String>,
    pub cloud_domain: Option<String>,
    pub onprem_server_url: Option<String>,
    pub onprem_username: Option<String>,
    pub onprem_password: Option<SecretString>,
    pub bearer_token: Option<SecretString>,
    pub audience: Option<String>,
    pub okta_domain: Option<String>,
    pub okta_auth_server_id: Option<String>,
    pub okta_default_auth_server_id: Option<String>,
}

impl PartialConfig {
    /// Stack `higher` on top of `self`. Fields set in `higher` win.
    pub fn overlay(self, higher: PartialConfig) -> PartialConfig {
        PartialConfig {
            client_id: higher.client_id.or(self.client_id),
            client_secret: higher.client_secret.or(self.client_secret),
            organization_id: higher.organization_id.or(self.organization_id),
            workspace_id: higher.workspace_id.or(self.workspace_id),
            cloud_domain: higher.cloud_domain.or(self.cloud_domain),
            onprem_server_url: higher.onprem_server_url.or(self.onprem_server_url),
            onprem_username: higher.onprem_username.or(self.onprem_username),
            onprem_password: higher.onprem_password.or(self.onprem_password),
            bearer_token: higher.bearer_token.or(self.bearer_token),
            audience: higher.audience.or(self.audience),
            okta_domain: higher.okta_domain.or(self.okta_domain),
            okta_auth_server_id: higher.okta_auth_server_id.or(self.okta_auth_server_id),
            okta_default_auth_server_id: higher
                .okta_default_auth_server_id
                .or(self.okta_default_auth_server_id),
        }
    }

    /// Whether this layer names an on-prem server.
    pub fn has_onprem_server(&self) -> bool {
        self.onprem_server_url.is_some()
    }

    /// Whether this layer carries any part of an OAuth client credential.
    pub fn has_client_credentials(&self) -> bool {
        self.client_id.is_some() || self.client_secret.is_some()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.client_secret.is_none()
            && self.organization_id.is_none()
            && self.workspace_id.is_none()
            && self.cloud_domain.is_none()
            && self.onprem_server_url.is_none()
            && self.onprem_username.is_none()
            && self.onprem_password.is_none()
            && self.bearer_token.is_none()
            && self.audience.is_none()
            && self.okta_domain.is_none()
            && self.okta_auth_server_id.is_none()
            && self.okta_default_auth_server_id.is_none()
    }
}

/// The configuration in force for a single request.
///
/// Recomputed on every call; never cached across requests.
#[derive(Debug, Clone, Default)]
pub struct EffectiveConfig {
    pub mode: DeploymentMode,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub organization_id: Option<String>,
    pub workspace_id: Option<String>,
    pub cloud_domain: Option<String>,
    pub onprem_server_url: Option<String>,
    pub onprem_username: Option<String>,
    pub onprem_password: Option<SecretString>,
    pub bearer_token: Option<SecretString>,
    pub audience: Option<String>,
    pub okta_domain: Option<String>,
    pub okta_auth_server_id: Option<String>,
    pub okta_default_auth_server_id: Option<String>,
}

impl EffectiveConfig {
    /// Merge the three layers, lowest precedence first.
    ///
    /// An on-prem server URL from the environment or the provider switches the
    /// result to on-prem mode. A profile-file server URL does so only when
    /// neither higher layer supplies cloud client credentials.
    pub fn from_layers(
        profile: PartialConfig,
        env: PartialConfig,
        provider: PartialConfig,
    ) -> Self {
        let onprem = env.has_onprem_server()
            || provider.has_onprem_server()
            || (profile.has_onprem_server()
                && !env.has_client_credentials()
                && !provider.has_client_credentials());

        let merged = profile.overlay(env).overlay(provider);

        if onprem {
            Self {
                mode: DeploymentMode::OnPrem,
                onprem_server_url: merged.onprem_server_url,
                onprem_username: merged.onprem_username,
                onprem_password: merged.onprem_password,
                bearer_token: merged.bearer_token,
                ..Self::default()
            }
        } else {
            Self {
                mode: DeploymentMode::Cloud,
                client_id: merged.client_id,
                client_secret: merged.client_secret,
                organization_id: merged.organization_id,
                workspace_id: merged.workspace_id,
                cloud_domain: merged.cloud_domain,
                onprem_server_url: None,
                onprem_username: None,
                onprem_password: None,
                bearer_token: merged.bearer_token,
                audience: merged.audience,
                okta_domain: merged.okta_domain,
                okta_auth_server_id: merged.okta_auth_server_id,
                okta_default_auth_server_id: merged.okta_default_auth_server_id,
            }
        }
    }

    /// Whether this config targets an on-prem deployment.
    pub fn is_onprem(&self) -> bool {
        self.mode == DeploymentMode::OnPrem
    }

    /// Cloud domain, falling back to `cribl.cloud`.
    pub fn cloud_domain(&self) -> &str {
        self.cloud_domain.as_deref().unwrap_or(DEFAULT_CLOUD_DOMAIN)
    }

    /// Organization and workspace IDs, when both are known.
    pub fn workspace_identity(&self) -> Option<(&str, &str)> {
        match (self.organization_id.as_deref(), self.workspace_id.as_deref()) {
            (Some(org), Some(workspace)) => Some((org, workspace)),
            _ => None,
        }
    }

    /// Whether any credential source resolved at all.
    pub fn has_any_credential(&self) -> bool {
        self.bearer_token.is_some()
            || (self.client_id.is_some() && self.client_secret.is_some())
            || (self.onprem_username.is_some() && self.onprem_password.is_some())
    }
}
