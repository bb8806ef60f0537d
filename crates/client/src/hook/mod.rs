//! Lifecycle hook exposed to the request pipeline.
//!
//! Responsibilities:
//! - `init`: compute the effective base URL once at client construction.
//! - `before_request`: resolve credentials, route the URL, attach the bearer token.
//! - `after_error`: re-authenticate on 401 and pause on 429.
//!
//! Does NOT handle:
//! - Sending API requests or retrying them.
//! - Building or parsing API payloads.
//!
//! Invariants:
//! - Credentials are re-resolved on every call; per-call security wins.
//! - Restricted on-prem paths fail before any network call.
//! - Hook state (base URL, org and workspace IDs) is last-writer-wins and safe
//!   to share across concurrent requests.

mod builder;
mod context;

pub use builder::CriblAuthHookBuilder;
pub use context::HookContext;

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use cribl_config::{ConfigSource, CredentialResolver, EffectiveConfig};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HOST, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::endpoint::{compose_url, onprem_base_url, workspace_base_url};
use crate::error::{ClientError, Result};
use crate::token::{AuthFlow, TokenManager};

#[derive(Debug, Clone, Default)]
struct HookState {
    base_url: Option<String>,
    organization_id: Option<String>,
    workspace_id: Option<String>,
}

/// Auth and routing interceptor shared by every request of one client.
#[derive(Debug)]
pub struct CriblAuthHook {
    resolver: CredentialResolver,
    tokens: TokenManager,
    state: RwLock<HookState>,
    rate_limit_pause: Duration,
}

impl CriblAuthHook {
    /// Hook with default settings, reading credentials from the environment.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> CriblAuthHookBuilder {
        CriblAuthHookBuilder::new()
    }

    /// Base URL computed by the latest `init` or request.
    pub fn base_url(&self) -> Option<String> {
        self.read_state().base_url.clone()
    }

    pub fn organization_id(&self) -> Option<String> {
        self.read_state().organization_id.clone()
    }

    pub fn workspace_id(&self) -> Option<String> {
        self.read_state().workspace_id.clone()
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, HookState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self, state: HookState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Compute the effective base URL.
    ///
    /// Precedence: `CRIBL_ONPREM_SERVER_URL`, then the profile's on-prem server
    /// URL, then the workspace URL built from organization, workspace and cloud
    /// domain. When none of these resolve, `base_url` is returned unchanged.
    ///
    /// A profile server URL wins here even when cloud credentials are set
    /// elsewhere; per-call mode selection in `before_request` is unaffected.
    pub fn init(&self, base_url: &str) -> String {
        let onprem_server = self
            .resolver
            .env()
            .onprem_server_url()
            .map(|server| (server, self.resolver.env().name()))
            .or_else(|| {
                let profile = self.resolver.profile();
                profile
                    .load()
                    .onprem_server_url
                    .map(|server| (server, profile.name()))
            });

        if let Some((server, source)) = onprem_server {
            let base = onprem_base_url(&server);
            info!(base_url = %base, source, "Using on-prem server");
            self.write_state(HookState {
                base_url: Some(base.clone()),
                ..HookState::default()
            });
            return base;
        }

        let config = self.resolver.resolve(None);
        if let Some(base) = Self::derived_base(&config) {
            debug!(base_url = %base, mode = ?config.mode, "Computed base URL");
            self.remember(&config, base.clone());
            return base;
        }

        debug!("No credential-derived base URL; keeping caller-supplied base");
        self.write_state(HookState {
            base_url: Some(base_url.to_string()),
            ..HookState::default()
        });
        base_url.to_string()
    }

    fn derived_base(config: &EffectiveConfig) -> Option<String> {
        if config.is_onprem() {
            return config.onprem_server_url.as_deref().map(onprem_base_url);
        }
        config
            .workspace_identity()
            .map(|(org, workspace)| workspace_base_url(workspace, org, config.cloud_domain()))
    }

    fn call_base(&self, config: &EffectiveConfig) -> String {
        Self::derived_base(config)
            .or_else(|| self.base_url())
            .unwrap_or_default()
    }

    fn remember(&self, config: &EffectiveConfig, base_url: String) {
        self.write_state(HookState {
            base_url: Some(base_url),
            organization_id: config.organization_id.clone(),
            workspace_id: config.workspace_id.clone(),
        });
    }

    /// Route `request` and attach `Authorization: Bearer {token}`.
    ///
    /// # Errors
    ///
    /// - `AuthenticationRequired` when no credential resolves.
    /// - `RestrictedEndpoint` for cloud-only paths in on-prem mode.
    /// - Configuration and upstream errors from token acquisition.
    pub async fn before_request(
        &self,
        ctx: &HookContext,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Request> {
        let config = self.resolver.resolve(ctx.security());
        if AuthFlow::select(&config).is_none() {
            return Err(ClientError::AuthenticationRequired);
        }

        let base = self.call_base(&config);
        let route = compose_url(&config, request.url(), &base)?;
        let token = self
            .tokens
            .get_token(&config, &base, ctx.cancellation())
            .await?;

        debug!(
            operation = ctx.operation_id(),
            surface = ?route.surface,
            url = %route.url,
            "Routing request"
        );

        *request.url_mut() = route.url;
        if let Some(host) = route.host_override {
            let value = HeaderValue::from_str(&host)
                .map_err(|e| ClientError::InvalidUrl(format!("invalid host '{host}': {e}")))?;
            request.headers_mut().insert(HOST, value);
        }

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| {
                ClientError::Configuration(
                    "bearer token contains characters not allowed in an HTTP header".to_string(),
                )
            })?;
        authorization.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, authorization);

        self.remember(&config, base);
        Ok(request)
    }

    /// React to a failed request.
    ///
    /// `status` is the status of the failed response, when one was received.
    ///
    /// - 401: re-resolves credentials, fetches a fresh token and returns
    ///   `FailEarly` so the pipeline runs no further error handlers.
    /// - 429: pauses briefly (cut short by cancellation) and returns `error` unchanged.
    /// - anything else: returns `error` unchanged.
    pub async fn after_error(
        &self,
        ctx: &HookContext,
        status: Option<StatusCode>,
        error: Option<ClientError>,
    ) -> Option<ClientError> {
        match status {
            Some(StatusCode::UNAUTHORIZED) => {
                let config = self.resolver.resolve(ctx.security());
                let base = self.call_base(&config);
                if let Err(e) = self
                    .tokens
                    .refresh(&config, &base, ctx.cancellation())
                    .await
                {
                    debug!(operation = ctx.operation_id(), error = %e, "Re-authentication failed");
                    return Some(e);
                }
                self.remember(&config, base);
                info!(operation = ctx.operation_id(), "Re-authenticated after 401");
                Some(ClientError::FailEarly {
                    status: StatusCode::UNAUTHORIZED.as_u16(),
                })
            }
            Some(StatusCode::TOO_MANY_REQUESTS) => {
                warn!(
                    operation = ctx.operation_id(),
                    pause_ms = self.rate_limit_pause.as_millis() as u64,
                    "Rate limited; pausing"
                );
                tokio::select! {
                    biased;
                    _ = ctx.cancellation().cancelled() => {}
                    _ = tokio::time::sleep(self.rate_limit_pause) => {}
                }
                error
            }
            _ => error,
        }
    }
}
