//! Configuration loading.
//!
//! Submodules:
//! - `env`: environment variable layer.
//! - `profile`: credentials file layer.
//! - `resolver`: merges layers into an `EffectiveConfig`.
//! - `dotenv`: optional `.env` loading.

mod dotenv;
pub mod env;
mod error;
mod path;
mod profile;
mod resolver;
mod source;

pub use dotenv::load_dotenv;
pub use env::{EnvSource, env_var_or_none};
pub use error::ConfigError;
pub use profile::ProfileSource;
pub use resolver::CredentialResolver;
pub use source::ConfigSource;
