//! Profile file source.
//!
//! Responsibilities:
//! - Locate the credentials file (`CRIBL_CONFIG_PATH` or the platform default).
//! - Read the selected profile (`CRIBL_PROFILE`, default `default`).
//! - Turn it into the lowest-precedence `PartialConfig` layer.
//!
//! Does NOT handle:
//! - Environment variable parsing (see env.rs).
//! - Merging layers (see `types::EffectiveConfig`).
//!
//! Invariants:
//! - A missing home directory, file, or profile yields an empty layer.
//! - Unreadable or malformed files are logged and also yield an empty layer.

use std::path::{Path, PathBuf};

use super::env::{CRIBL_CONFIG_PATH, CRIBL_PROFILE, EnvSource};
use super::error::ConfigError;
use super::path::default_credentials_path;
use super::source::ConfigSource;
use crate::constants::DEFAULT_PROFILE_NAME;
use crate::types::{PartialConfig, ProfileConfig, ProfileFile};

/// Configuration layer backed by a named profile in the credentials file.
#[derive(Debug, Clone)]
pub struct ProfileSource {
    path: Option<PathBuf>,
    profile_name: String,
}

impl ProfileSource {
    /// Read `profile_name = "default"` from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            profile_name: DEFAULT_PROFILE_NAME.to_string(),
        }
    }

    /// Select a different profile.
    pub fn with_profile_name(mut self, name: impl Into<String>) -> Self {
        self.profile_name = name.into();
        self
    }

    /// Locate the file and profile from `CRIBL_CONFIG_PATH` / `CRIBL_PROFILE`.
    ///
    /// Falls back to the platform config directory. When no home directory
    /// can be determined the source is disabled.
    pub fn discover(env: &EnvSource) -> Self {
        let path = env.get(CRIBL_CONFIG_PATH).map(PathBuf::from).or_else(|| {
            default_credentials_path()
                .map_err(|e| tracing::debug!(error = %e, "No config directory; profile layer disabled"))
                .ok()
        });

        Self {
            path,
            profile_name: env
                .get(CRIBL_PROFILE)
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
        }
    }

    /// A source that never reads anything.
    pub fn disabled() -> Self {
        Self {
            path: None,
            profile_name: DEFAULT_PROFILE_NAME.to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// Read the selected profile.
    ///
    /// Returns `Ok(None)` when the source is disabled, the file does not exist,
    /// or the file has no profile by that name.
    pub fn read_profile(&self) -> Result<Option<ProfileConfig>, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::ProfileRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut file: ProfileFile =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ProfileParse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(file.profiles.remove(&self.profile_name))
    }
}

impl ConfigSource for ProfileSource {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn load(&self) -> PartialConfig {
        match self.read_profile() {
            Ok(Some(profile)) => PartialConfig::from(&profile),
            Ok(None) => PartialConfig::default(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    profile = %self.profile_name,
                    "Ignoring unreadable credentials file"
                );
                PartialConfig::default()
            }
        }
    }
}
