//! Error types for configuration loading.
//!
//! Responsibilities:
//! - Define error variants for profile file and `.env` loading failures.
//!
//! Does NOT handle:
//! - Request-time auth or routing errors (see the client crate).
//!
//! Invariants:
//! - All error variants include context for debugging (paths, positions).
//! - Dotenv errors NEVER include raw .env line contents to prevent secret leakage.
//! - Profile errors never abort resolution; callers log them and fall back to an
//!   empty layer.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to determine config directory: {0}")]
    ConfigDirUnavailable(String),

    #[error("Failed to read credentials file at {path}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse credentials file at {path}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse the `.env` file due to invalid syntax.
    ///
    /// SAFETY: This error only includes the byte index of the parse failure,
    /// NOT the offending line content, to prevent leaking secrets.
    #[error(
        "Failed to parse .env file at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env loading"
    )]
    DotenvParse { error_index: usize },

    /// Failed to read the `.env` file due to an I/O error.
    #[error("Failed to read .env file: {kind}")]
    DotenvIo { kind: ErrorKind },

    /// Unknown dotenv error (future variants from dotenvy crate).
    #[error("Failed to load .env file. Hint: set DOTENV_DISABLED=1 to skip .env loading")]
    DotenvUnknown,
}
