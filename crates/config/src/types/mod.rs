//! Configuration types for the Cribl auth layer.
//!
//! Submodules:
//! - `effective`: per-layer and merged configuration records.
//! - `profile`: profile file document and entries.
//! - `security`: per-call provider overrides.

mod effective;
mod profile;
mod security;

pub use effective::{DeploymentMode, EffectiveConfig, PartialConfig};
pub use profile::{ProfileConfig, ProfileFile};
pub use security::{ProviderConfig, Security, SecurityOverride};
