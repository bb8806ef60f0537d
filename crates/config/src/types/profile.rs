//! Profile file types.
//!
//! Responsibilities:
//! - Define `ProfileConfig`, one named credential profile on disk.
//! - Define `ProfileFile`, the JSON document holding named profiles.
//! - Convert a profile into a `PartialConfig` layer.
//!
//! Does NOT handle:
//! - Locating or reading the file (see `loader::profile`).
//! - Writing profiles back to disk.
//!
//! Invariants:
//! - All fields are optional to allow partial profile definitions.
//! - Secrets deserialize straight into `SecretString` so `Debug` stays redacted.
//! - Profiles never carry a literal bearer token.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

use crate::types::effective::PartialConfig;

/// Deserializes optional secrets without ever holding them in a plain `String` field.
mod opt_secret_string {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map(|s| SecretString::new(s.into())))
    }
}

/// A named credential profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// OAuth client ID for Cribl.Cloud
    pub client_id: Option<String>,
    /// OAuth client secret for Cribl.Cloud
    #[serde(deserialize_with = "opt_secret_string::deserialize")]
    pub client_secret: Option<SecretString>,
    /// Organization ID (the `{org}` part of `{workspace}-{org}.{domain}`)
    pub organization_id: Option<String>,
    /// Workspace ID
    pub workspace_id: Option<String>,
    /// Cloud domain, e.g. `cribl.cloud`
    pub cloud_domain: Option<String>,
    /// On-prem leader URL
    pub onprem_server_url: Option<String>,
    /// On-prem login username
    pub onprem_username: Option<String>,
    /// On-prem login password
    #[serde(deserialize_with = "opt_secret_string::deserialize")]
    pub onprem_password: Option<SecretString>,
}

/// Document stored in the credentials file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFile {
    pub profiles: BTreeMap<String, ProfileConfig>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<&ProfileConfig> for PartialConfig {
    fn from(profile: &ProfileConfig) -> Self {
        PartialConfig {
            client_id: non_blank(&profile.client_id),
            client_secret: profile.client_secret.clone(),
            organization_id: non_blank(&profile.organization_id),
            workspace_id: non_blank(&profile.workspace_id),
            cloud_domain: non_blank(&profile.cloud_domain),
            onprem_server_url: non_blank(&profile.onprem_server_url),
            onprem_username: non_blank(&profile.onprem_username),
            onprem_password: profile.onprem_password.clone(),
            ..PartialConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_profile_file_parses_named_profiles() {
        let json = r#"{
            "profiles": {
                "default": {
                    "client_id": "abc",
                    "client_secret": "shh",
                    "organization_id": "biz",
                    "workspace_id": "main"
                },
                "lab": { "onprem_server_url": "https://leader.lab:9000" }
            }
        }"#;

        let file: ProfileFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.profiles.len(), 2);

        let default = &file.profiles["default"];
        assert_eq!(default.client_id.as_deref(), Some("abc"));
        assert_eq!(
            default.client_secret.as_ref().map(|s| s.expose_secret()),
            Some("shh")
        );
        assert_eq!(
            file.profiles["lab"].onprem_server_url.as_deref(),
            Some("https://leader.lab:9000")
        );
    }

    #[test]
    fn test_profile_to_partial_drops_blank_values() {
        let profile = ProfileConfig {
            client_id: Some("  ".to_string()),
            organization_id: Some(" biz ".to_string()),
            ..Default::default()
        };

        let layer = PartialConfig::from(&profile);
        assert!(layer.client_id.is_none());
        assert_eq!(layer.organization_id.as_deref(), Some("biz"));
        assert!(layer.bearer_token.is_none());
    }

    #[test]
    fn test_profile_config_debug_does_not_expose_secrets() {
        let json = r#"{ "client_secret": "profile-secret-789", "onprem_password": "pw-000" }"#;
        let profile: ProfileConfig = serde_json::from_str(json).unwrap();

        let debug_output = format!("{:?}", profile);
        assert!(!debug_output.contains("profile-secret-789"));
        assert!(!debug_output.contains("pw-000"));
    }
}
