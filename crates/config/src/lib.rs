//! Credential configuration for the Cribl API auth layer.
//!
//! This crate resolves the credentials and deployment settings in force for a
//! request from three layers: a named profile in the credentials file, `CRIBL_*`
//! environment variables, and per-call provider overrides.

pub mod constants;
mod loader;
pub mod types;

pub use loader::env;
pub use loader::{
    ConfigError, ConfigSource, CredentialResolver, EnvSource, ProfileSource, env_var_or_none,
    load_dotenv,
};
pub use types::{
    DeploymentMode, EffectiveConfig, PartialConfig, ProfileConfig, ProfileFile, ProviderConfig,
    Security, SecurityOverride,
};
