//! Path helpers for the credentials file location.
//!
//! Responsibilities:
//! - Determine the standard credentials file path.
//! - Use `directories` crate for platform-appropriate paths.
//!
//! Does NOT handle:
//! - File I/O operations.
//! - Profile selection.

use std::path::PathBuf;

use anyhow::Context;

use crate::constants::CREDENTIALS_FILE_NAME;

/// Returns the default path to the credentials file.
///
/// - Linux: `~/.config/cribl/credentials.json`
/// - macOS: `~/Library/Application Support/cribl/credentials.json`
/// - Windows: `%AppData%\cribl\credentials.json`
pub(crate) fn default_credentials_path() -> Result<PathBuf, anyhow::Error> {
    let proj_dirs = directories::ProjectDirs::from("", "", "cribl")
        .context("Failed to determine project directories")?;

    Ok(proj_dirs.config_dir().join(CREDENTIALS_FILE_NAME))
}
