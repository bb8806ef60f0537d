//! Centralized constants for the Cribl auth workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication and improve maintainability.

// =============================================================================
// Cloud Defaults
// =============================================================================

/// Cloud domain used when neither the provider, the environment, nor the
/// profile file names one.
pub const DEFAULT_CLOUD_DOMAIN: &str = "cribl.cloud";

/// Path prefix of the workspace-scoped and on-prem REST surfaces.
pub const API_PATH_PREFIX: &str = "api/v1";

/// Host label of the management gateway API.
pub const GATEWAY_HOST_LABEL: &str = "gateway";

// =============================================================================
// Token Lifetime Defaults
// =============================================================================

/// Refresh cloud tokens once they are within this many seconds of expiry (60 minutes).
pub const CLOUD_REFRESH_WINDOW_SECS: u64 = 60 * 60;

/// Refresh on-prem tokens once they are within this many seconds of expiry (30 minutes).
///
/// On-prem token lifetimes are typically shorter than cloud ones.
pub const ONPREM_REFRESH_WINDOW_SECS: u64 = 30 * 60;

/// TTL assumed for on-prem login tokens; the login endpoint does not return one.
pub const DEFAULT_ONPREM_TOKEN_TTL_SECS: u64 = 3600;

/// TTL assumed for OAuth tokens whose response omits `expires_in`.
pub const DEFAULT_OAUTH_TOKEN_TTL_SECS: u64 = 3600;

// =============================================================================
// Transport Defaults
// =============================================================================

/// Maximum number of attempts for an auth-endpoint call (initial try included).
pub const MAX_AUTH_ATTEMPTS: usize = 3;

/// Default HTTP request timeout in seconds for auth-endpoint calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of HTTP redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Pause applied by the error hook when the API answers 429, in milliseconds.
pub const RATE_LIMIT_PAUSE_MS: u64 = 1000;

// =============================================================================
// Profile File Defaults
// =============================================================================

/// Profile read from the credentials file when `CRIBL_PROFILE` is unset.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// File name of the credentials file inside the platform config directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";
