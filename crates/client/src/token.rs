//! Bearer token acquisition and caching.
//!
//! Responsibilities:
//! - Pick the auth flow for an effective configuration.
//! - Build client-credentials (standard and government/Okta) and on-prem login
//!   requests, and parse their responses.
//! - Cache tokens per credential identity and refresh them lazily.
//!
//! Does NOT handle:
//! - Retries (see `transport`).
//! - Attaching tokens to requests (see `hook`).
//!
//! Invariants:
//! - A literal bearer token always wins and is never cached.
//! - At most one live `TokenInfo` per session key; refresh replaces, never mutates.
//! - A cached token is reused until it is within the flow's refresh window of expiry.
//! - Concurrent cold fetches for one key are not deduplicated; the last write wins.

use std::fmt;
use std::time::Duration;

use cribl_config::EffectiveConfig;
use cribl_config::constants::{
    CLOUD_REFRESH_WINDOW_SECS, DEFAULT_OAUTH_TOKEN_TTL_SECS, DEFAULT_ONPREM_TOKEN_TTL_SECS,
    ONPREM_REFRESH_WINDOW_SECS,
};
use cribl_config::env::CRIBL_OKTA_AUTH_SERVER_ID;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoint::{normalize_base_url, onprem_base_url};
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::transport::{AuthRequest, ResilientTransport};

const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// A fetched bearer token and its expiry.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    token: SecretString,
    expires_at: Instant,
}

impl TokenInfo {
    /// Token valid for `ttl` from now.
    pub fn new(token: SecretString, ttl: Duration) -> Self {
        Self {
            token,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before expiry; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the token expires within `window`.
    pub fn needs_refresh(&self, window: Duration) -> bool {
        self.remaining() < window
    }
}

/// Collision-resistant identifier of a credential identity.
///
/// SHA-256 over a flow tag and length-prefixed parts, hex encoded. Secrets
/// never appear in the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    fn digest(flow: &str, parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(flow.as_bytes());
        for part in parts {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn cloud(client_id: &str, client_secret: &str) -> Self {
        Self::digest("cloud", &[client_id, client_secret])
    }

    pub fn onprem(server_url: &str, username: &str, password: &str) -> Self {
        Self::digest("onprem", &[server_url, username, password])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The credential that will produce the bearer token for a call.
#[derive(Clone, Copy)]
pub enum AuthFlow<'a> {
    /// Literal token, used verbatim.
    Bearer(&'a SecretString),
    /// `POST {server}/api/v1/auth/login`.
    OnPremLogin {
        server_url: &'a str,
        username: &'a str,
        password: &'a SecretString,
    },
    /// OAuth2 client credentials against Cribl.Cloud.
    ClientCredentials {
        client_id: &'a str,
        client_secret: &'a SecretString,
    },
}

impl fmt::Debug for AuthFlow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'a> AuthFlow<'a> {
    /// Choose the flow for `config`, or `None` when nothing usable is configured.
    pub fn select(config: &'a EffectiveConfig) -> Option<Self> {
        if let Some(token) = config.bearer_token.as_ref() {
            return Some(Self::Bearer(token));
        }

        if config.is_onprem() {
            return match (
                config.onprem_server_url.as_deref(),
                config.onprem_username.as_deref(),
                config.onprem_password.as_ref(),
            ) {
                (Some(server_url), Some(username), Some(password)) => Some(Self::OnPremLogin {
                    server_url,
                    username,
                    password,
                }),
                _ => None,
            };
        }

        match (config.client_id.as_deref(), config.client_secret.as_ref()) {
            (Some(client_id), Some(client_secret)) => Some(Self::ClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        }
    }

    /// Metrics and log label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::OnPremLogin { .. } => "onprem_login",
            Self::ClientCredentials { .. } => "client_credentials",
        }
    }

    /// How close to expiry a cached token may get before it is replaced.
    pub fn refresh_window(&self) -> Duration {
        match self {
            Self::OnPremLogin { .. } => Duration::from_secs(ONPREM_REFRESH_WINDOW_SECS),
            Self::Bearer(_) | Self::ClientCredentials { .. } => {
                Duration::from_secs(CLOUD_REFRESH_WINDOW_SECS)
            }
        }
    }

    /// Cache key, or `None` for literal tokens.
    pub fn session_key(&self) -> Option<SessionKey> {
        self.fetched().ok().map(|flow| flow.session_key())
    }

    /// The network flow to run, or the literal token when there is none.
    fn fetched(self) -> std::result::Result<FetchedFlow<'a>, &'a SecretString> {
        match self {
            Self::Bearer(token) => Err(token),
            Self::OnPremLogin {
                server_url,
                username,
                password,
            } => Ok(FetchedFlow::OnPremLogin {
                server_url,
                username,
                password,
            }),
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => Ok(FetchedFlow::ClientCredentials {
                client_id,
                client_secret,
            }),
        }
    }
}

/// A flow whose token comes from an auth endpoint and is cached.
#[derive(Clone, Copy)]
enum FetchedFlow<'a> {
    OnPremLogin {
        server_url: &'a str,
        username: &'a str,
        password: &'a SecretString,
    },
    ClientCredentials {
        client_id: &'a str,
        client_secret: &'a SecretString,
    },
}

impl FetchedFlow<'_> {
    fn session_key(&self) -> SessionKey {
        match self {
            Self::OnPremLogin {
                server_url,
                username,
                password,
            } => SessionKey::onprem(
                &normalize_base_url(server_url),
                username,
                password.expose_secret(),
            ),
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => SessionKey::cloud(client_id, client_secret.expose_secret()),
        }
    }
}

#[derive(Serialize)]
struct ClientCredentialsPayload<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    #[serde(default)]
    force_password_change: bool,
}

fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1")
}

/// Token request for the client-credentials flow.
///
/// The audience and token endpoint derive from the workspace host:
/// - `localhost`/`127.0.0.1`: audience is the base URL, endpoint `{origin}/oauth/token`.
/// - government domains (containing `gov`): Okta, form-encoded.
/// - everything else: `https://login.{domain}/oauth/token`, JSON.
///
/// # Errors
///
/// - `Configuration` when the workspace URL has no usable host.
/// - `MissingEnvVar` when a government domain has no Okta auth server ID.
pub fn client_credentials_request(
    config: &EffectiveConfig,
    workspace_base: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AuthRequest> {
    let base = Url::parse(workspace_base).map_err(|e| {
        ClientError::Configuration(format!("invalid workspace URL '{workspace_base}': {e}"))
    })?;
    let host = base.host_str().ok_or_else(|| {
        ClientError::Configuration(format!("workspace URL '{workspace_base}' has no host"))
    })?;

    if is_local_host(host) {
        let audience = config
            .audience
            .clone()
            .unwrap_or_else(|| normalize_base_url(workspace_base));
        let url = format!("{}/oauth/token", base.origin().ascii_serialization());
        return AuthRequest::json(
            url,
            &ClientCredentialsPayload {
                grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
                client_id,
                client_secret,
                audience: &audience,
            },
        );
    }

    let domain = host
        .split_once('.')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .ok_or_else(|| {
            ClientError::Configuration(format!(
                "cannot derive cloud domain from workspace host '{host}'"
            ))
        })?;
    let audience = config
        .audience
        .clone()
        .unwrap_or_else(|| format!("https://api.{domain}"));

    if domain.contains("gov") {
        let auth_server_id = config
            .okta_auth_server_id
            .as_deref()
            .or(config.okta_default_auth_server_id.as_deref())
            .ok_or_else(|| ClientError::MissingEnvVar {
                var: CRIBL_OKTA_AUTH_SERVER_ID,
                context: format!(
                    "government domain '{domain}' requires an Okta authorization server"
                ),
            })?;
        let okta_origin = match config.okta_domain.as_deref() {
            Some(okta) if okta.contains("://") => normalize_base_url(okta),
            Some(okta) => format!("https://{}", normalize_base_url(okta)),
            None => format!("https://login.{domain}"),
        };
        let url = format!("{okta_origin}/oauth2/{auth_server_id}/v1/token");
        debug!(url = %url, "Using Okta client-credentials flow");
        return Ok(AuthRequest::form(
            url,
            &[
                ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("audience", audience.as_str()),
            ],
        ));
    }

    AuthRequest::json(
        format!("https://login.{domain}/oauth/token"),
        &ClientCredentialsPayload {
            grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
            client_id,
            client_secret,
            audience: &audience,
        },
    )
}

/// Login request for on-prem deployments.
pub fn login_request(server_url: &str, username: &str, password: &str) -> Result<AuthRequest> {
    AuthRequest::json(
        format!("{}/auth/login", onprem_base_url(server_url)),
        &LoginPayload { username, password },
    )
}

fn secret(value: &str) -> SecretString {
    SecretString::new(value.to_string().into())
}

fn parse_oauth_response(body: &[u8]) -> Result<TokenInfo> {
    let response: OAuthTokenResponse = serde_json::from_slice(body)
        .map_err(|e| ClientError::InvalidResponse(format!("token response: {e}")))?;
    if response.access_token.trim().is_empty() {
        return Err(ClientError::InvalidResponse(
            "token response has an empty access_token".to_string(),
        ));
    }
    if let Some(token_type) = response.token_type.as_deref() {
        debug!(token_type, "Received OAuth token");
    }
    let ttl = response.expires_in.unwrap_or(DEFAULT_OAUTH_TOKEN_TTL_SECS);
    Ok(TokenInfo::new(
        secret(response.access_token.trim()),
        Duration::from_secs(ttl),
    ))
}

fn parse_login_response(body: &[u8]) -> Result<TokenInfo> {
    let response: LoginResponse = serde_json::from_slice(body)
        .map_err(|e| ClientError::InvalidResponse(format!("login response: {e}")))?;
    let token = response.token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    if token.is_empty() {
        return Err(ClientError::InvalidResponse(
            "login response has an empty token".to_string(),
        ));
    }
    if response.force_password_change {
        warn!("On-prem login succeeded but the server requires a password change");
    }
    Ok(TokenInfo::new(
        secret(token),
        Duration::from_secs(DEFAULT_ONPREM_TOKEN_TTL_SECS),
    ))
}

/// Obtains and caches bearer tokens.
#[derive(Clone)]
pub struct TokenManager {
    transport: ResilientTransport,
    sessions: Cache<SessionKey, TokenInfo>,
    metrics: MetricsCollector,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("transport", &self.transport)
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}

impl TokenManager {
    pub fn new(transport: ResilientTransport) -> Self {
        Self {
            transport,
            sessions: Cache::builder().build(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Bearer token for `config`, from the cache when still fresh.
    ///
    /// `workspace_base` is the workspace URL of the call; it determines the
    /// client-credentials audience and token endpoint.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` when `config` has no usable credential, plus
    /// any error from building or executing the auth request.
    pub async fn get_token(
        &self,
        config: &EffectiveConfig,
        workspace_base: &str,
        cancel: &CancellationToken,
    ) -> Result<SecretString> {
        self.token(config, workspace_base, cancel, false).await
    }

    /// Like [`get_token`](Self::get_token) but always fetches a new token.
    pub async fn refresh(
        &self,
        config: &EffectiveConfig,
        workspace_base: &str,
        cancel: &CancellationToken,
    ) -> Result<SecretString> {
        self.token(config, workspace_base, cancel, true).await
    }

    /// Drop the cached token for `config`, if any.
    pub async fn invalidate(&self, config: &EffectiveConfig) {
        if let Some(key) = AuthFlow::select(config).and_then(|flow| flow.session_key()) {
            self.sessions.invalidate(&key).await;
        }
    }

    async fn token(
        &self,
        config: &EffectiveConfig,
        workspace_base: &str,
        cancel: &CancellationToken,
        force: bool,
    ) -> Result<SecretString> {
        let Some(flow) = AuthFlow::select(config) else {
            let err = ClientError::AuthenticationRequired;
            self.metrics.record_error(&err);
            return Err(err);
        };

        let fetched = match flow.fetched() {
            Ok(fetched) => fetched,
            Err(literal) => return Ok(literal.clone()),
        };
        let key = fetched.session_key();
        let window = flow.refresh_window();

        if !force
            && let Some(cached) = self.sessions.get(&key).await
            && !cached.needs_refresh(window)
        {
            self.metrics.record_cache_hit();
            return Ok(cached.token().clone());
        }

        debug!(flow = flow.label(), force, "Fetching bearer token");
        let info = match self.fetch(fetched, config, workspace_base, cancel).await {
            Ok(info) => info,
            Err(e) => {
                self.metrics.record_error(&e);
                return Err(e);
            }
        };
        self.metrics.record_token_fetch(flow.label());
        info!(
            flow = flow.label(),
            expires_in_secs = info.remaining().as_secs(),
            "Acquired bearer token"
        );

        let token = info.token().clone();
        self.sessions.insert(key, info).await;
        Ok(token)
    }

    async fn fetch(
        &self,
        flow: FetchedFlow<'_>,
        config: &EffectiveConfig,
        workspace_base: &str,
        cancel: &CancellationToken,
    ) -> Result<TokenInfo> {
        match flow {
            FetchedFlow::OnPremLogin {
                server_url,
                username,
                password,
            } => {
                let request = login_request(server_url, username, password.expose_secret())?;
                let body = self.transport.execute(&request, cancel).await?;
                parse_login_response(&body)
            }
            FetchedFlow::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let request = client_credentials_request(
                    config,
                    workspace_base,
                    client_id,
                    client_secret.expose_secret(),
                )?;
                let body = self.transport.execute(&request, cancel).await?;
                parse_oauth_response(&body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
    use cribl_config::DeploymentMode;

    fn cloud_config() -> EffectiveConfig {
        EffectiveConfig {
            client_id: Some("id".to_string()),
            client_secret: Some(secret("secret")),
            ..Default::default()
        }
    }

    fn body_json(request: &AuthRequest) -> serde_json::Value {
        serde_json::from_slice(request.body()).unwrap()
    }

    #[test]
    fn test_session_keys_are_distinct_across_flows_and_splits() {
        assert_ne!(SessionKey::cloud("a:b", "c"), SessionKey::cloud("a", "b:c"));
        assert_ne!(
            SessionKey::cloud("server", "user"),
            SessionKey::onprem("server", "user", "")
        );
        assert_eq!(SessionKey::cloud("id", "s"), SessionKey::cloud("id", "s"));
        assert!(!SessionKey::cloud("id", "topsecret").as_str().contains("topsecret"));
        assert_eq!(SessionKey::cloud("id", "s").as_str().len(), 64);
    }

    #[test]
    fn test_flow_selection() {
        let mut config = cloud_config();
        assert!(matches!(
            AuthFlow::select(&config),
            Some(AuthFlow::ClientCredentials { .. })
        ));

        config.bearer_token = Some(secret("literal"));
        assert!(matches!(AuthFlow::select(&config), Some(AuthFlow::Bearer(_))));

        let onprem = EffectiveConfig {
            mode: DeploymentMode::OnPrem,
            onprem_server_url: Some("http://leader:9000".to_string()),
            onprem_username: Some("admin".to_string()),
            onprem_password: Some(secret("pw")),
            ..Default::default()
        };
        let flow = AuthFlow::select(&onprem).unwrap();
        assert_eq!(flow.label(), "onprem_login");
        assert_eq!(flow.refresh_window(), Duration::from_secs(30 * 60));

        let half = EffectiveConfig {
            client_id: Some("id".to_string()),
            ..Default::default()
        };
        assert!(AuthFlow::select(&half).is_none());
    }

    #[test]
    fn test_standard_cloud_request() {
        let request = client_credentials_request(
            &cloud_config(),
            "https://main-biz.cribl.cloud/api/v1",
            "id",
            "secret",
        )
        .unwrap();

        assert_eq!(request.url(), "https://login.cribl.cloud/oauth/token");
        assert_eq!(request.content_type(), CONTENT_TYPE_JSON);
        let body = body_json(&request);
        assert_eq!(body["grant_type"], "client_credentials");
        assert_eq!(body["client_id"], "id");
        assert_eq!(body["client_secret"], "secret");
        assert_eq!(body["audience"], "https://api.cribl.cloud");
    }

    #[test]
    fn test_audience_override() {
        let config = EffectiveConfig {
            audience: Some("https://custom.audience".to_string()),
            ..cloud_config()
        };
        let request = client_credentials_request(
            &config,
            "https://main-biz.cribl-staging.cloud/api/v1",
            "id",
            "secret",
        )
        .unwrap();
        assert_eq!(request.url(), "https://login.cribl-staging.cloud/oauth/token");
        assert_eq!(body_json(&request)["audience"], "https://custom.audience");
    }

    #[test]
    fn test_local_host_request() {
        let request = client_credentials_request(
            &cloud_config(),
            "http://127.0.0.1:4567/api/v1/",
            "id",
            "secret",
        )
        .unwrap();
        assert_eq!(request.url(), "http://127.0.0.1:4567/oauth/token");
        assert_eq!(
            body_json(&request)["audience"],
            "http://127.0.0.1:4567/api/v1"
        );
    }

    #[test]
    fn test_government_request_uses_okta_form() {
        let config = EffectiveConfig {
            okta_auth_server_id: Some("aus123".to_string()),
            ..cloud_config()
        };
        let request = client_credentials_request(
            &config,
            "https://main-biz.cribl-gov.cloud/api/v1",
            "id",
            "secret",
        )
        .unwrap();

        assert_eq!(
            request.url(),
            "https://login.cribl-gov.cloud/oauth2/aus123/v1/token"
        );
        assert_eq!(request.content_type(), CONTENT_TYPE_FORM);
        assert_eq!(
            std::str::from_utf8(request.body()).unwrap(),
            "grant_type=client_credentials&client_id=id&client_secret=secret&audience=https%3A%2F%2Fapi.cribl-gov.cloud"
        );
    }

    #[test]
    fn test_government_request_with_default_server_and_okta_domain() {
        let config = EffectiveConfig {
            okta_default_auth_server_id: Some("default".to_string()),
            okta_domain: Some("okta.example.gov/".to_string()),
            ..cloud_config()
        };
        let request = client_credentials_request(
            &config,
            "https://main-biz.cribl-gov.cloud/api/v1",
            "id",
            "secret",
        )
        .unwrap();
        assert_eq!(
            request.url(),
            "https://okta.example.gov/oauth2/default/v1/token"
        );
    }

    #[test]
    fn test_government_request_without_auth_server_fails() {
        let err = client_credentials_request(
            &cloud_config(),
            "https://main-biz.cribl-gov.cloud/api/v1",
            "id",
            "secret",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingEnvVar {
                var: CRIBL_OKTA_AUTH_SERVER_ID,
                ..
            }
        ));
    }

    #[test]
    fn test_unparseable_workspace_host() {
        let err = client_credentials_request(&cloud_config(), "https://nodots/api/v1", "id", "s")
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(ref m) if m.contains("nodots")));

        let err = client_credentials_request(&cloud_config(), "foobar", "id", "s").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_login_request() {
        let request = login_request("http://leader:9000/", "admin", "pw").unwrap();
        assert_eq!(request.url(), "http://leader:9000/api/v1/auth/login");
        let body = body_json(&request);
        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "pw");
    }

    #[test]
    fn test_login_response_strips_bearer_prefix() {
        let info =
            parse_login_response(br#"{"token":"Bearer abc.def","forcePasswordChange":true}"#)
                .unwrap();
        assert_eq!(info.token().expose_secret(), "abc.def");

        let info = parse_login_response(br#"{"token":"plain"}"#).unwrap();
        assert_eq!(info.token().expose_secret(), "plain");

        assert!(parse_login_response(br#"{"token":"Bearer "}"#).is_err());
    }

    #[test]
    fn test_oauth_response_defaults_ttl() {
        let info = parse_oauth_response(br#"{"access_token":"tok"}"#).unwrap();
        assert_eq!(info.token().expose_secret(), "tok");
        assert!(info.remaining() <= Duration::from_secs(DEFAULT_OAUTH_TOKEN_TTL_SECS));

        let err = parse_oauth_response(b"not json").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_info_refresh_window() {
        let info = TokenInfo::new(secret("t"), Duration::from_secs(3600));
        assert!(!info.needs_refresh(Duration::from_secs(1800)));

        tokio::time::advance(Duration::from_secs(1801)).await;
        assert!(info.needs_refresh(Duration::from_secs(1800)));
        assert!(!info.needs_refresh(Duration::ZERO));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(info.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_bearer_bypasses_cache_and_network() {
        let manager = TokenManager::new(ResilientTransport::new(reqwest::Client::new()))
            .with_metrics(MetricsCollector::disabled());
        let config = EffectiveConfig {
            bearer_token: Some(secret("Paradise City")),
            ..Default::default()
        };

        let token = manager
            .get_token(&config, "foobar", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "Paradise City");

        let token = manager
            .refresh(&config, "foobar", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "Paradise City");

        manager.sessions.run_pending_tasks().await;
        assert_eq!(manager.sessions.entry_count(), 0);
        assert!(AuthFlow::select(&config).unwrap().session_key().is_none());
    }

    #[tokio::test]
    async fn test_missing_credentials_require_authentication() {
        let manager = TokenManager::new(ResilientTransport::new(reqwest::Client::new()))
            .with_metrics(MetricsCollector::disabled());

        let err = manager
            .get_token(
                &EffectiveConfig::default(),
                "https://main-biz.cribl.cloud/api/v1",
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn test_invalidate_and_refresh_fetch_again() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "Bearer session",
                "forcePasswordChange": false,
            })))
            .expect(3)
            .mount(&server)
            .await;

        let manager = TokenManager::new(ResilientTransport::new(reqwest::Client::new()))
            .with_metrics(MetricsCollector::disabled());
        let config = EffectiveConfig {
            mode: DeploymentMode::OnPrem,
            onprem_server_url: Some(server.uri()),
            onprem_username: Some("admin".to_string()),
            onprem_password: Some(secret("pw")),
            ..Default::default()
        };
        let cancel = CancellationToken::new();

        // fetch, cache hit, invalidate, fetch, forced refresh
        manager.get_token(&config, "", &cancel).await.unwrap();
        manager.get_token(&config, "", &cancel).await.unwrap();
        manager.invalidate(&config).await;
        manager.get_token(&config, "", &cancel).await.unwrap();
        let token = manager.refresh(&config, "", &cancel).await.unwrap();
        assert_eq!(token.expose_secret(), "session");
    }
}
