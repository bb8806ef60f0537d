//! Endpoint composition.
//!
//! Responsibilities:
//! - Build the workspace, gateway, and on-prem base URLs.
//! - Classify request paths (gateway, cloud-only) and rewrite request URLs to
//!   the API surface the effective configuration targets.
//!
//! Does NOT handle:
//! - Credential resolution or token acquisition.
//! - Mutating the outgoing request (see `hook`).
//!
//! Invariants:
//! - Base URLs never end in `/`; resource paths never start with `/`; exactly one
//!   `/` joins them.
//! - Workspace and on-prem URLs carry exactly one `/api/v1` segment.
//! - Gateway URLs carry the resource path alone: leading `api` and `v1`
//!   segments are dropped, the same ones `is_gateway_path` ignores.
//! - Restricted on-prem paths are rejected before any URL is built.

use cribl_config::EffectiveConfig;
use cribl_config::constants::{API_PATH_PREFIX, GATEWAY_HOST_LABEL};
use url::Url;

use crate::error::{ClientError, Result};

/// Cloud-only API surfaces, matched as segment prefixes of the resource path.
const ONPREM_RESTRICTED_PREFIXES: &[&str] = &[
    "organizations",
    "products/search/jobs",
    "products/search/saved",
    "products/search/dashboards",
    "products/search/dashboard-categories",
    "products/search/usage-groups",
    "products/lake",
];

/// Which API surface a request was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    OnPrem,
    Gateway,
    Workspace,
}

/// A composed request target.
#[derive(Debug, Clone)]
pub struct Route {
    pub surface: Surface,
    pub url: Url,
    /// Value for an explicit `Host` header, set for gateway routes.
    pub host_override: Option<String>,
}

/// Strip trailing slashes from a base URL.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Strip leading slashes from a path.
pub fn trim_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

fn strip_segment<'a>(path: &'a str, segment: &str) -> &'a str {
    match path.strip_prefix(segment) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => trim_path(rest),
        _ => path,
    }
}

/// Resource path relative to `/api/v1`.
///
/// `/api/v1/sources`, `v1/sources` and `sources` all yield `sources`.
pub fn resource_path(path: &str) -> &str {
    strip_segment(strip_segment(trim_path(path), "api"), "v1")
}

/// Whether a path addresses the organization-management gateway API.
pub fn is_gateway_path(path: &str) -> bool {
    has_segment_prefix(resource_path(path), "organizations")
}

fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Whether a path addresses a cloud-only surface unavailable on-prem.
pub fn is_restricted_onprem_path(path: &str) -> bool {
    let resource = resource_path(path);
    ONPREM_RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| has_segment_prefix(resource, prefix))
}

/// `https://{workspace}-{org}.{domain}/api/v1`
pub fn workspace_base_url(workspace_id: &str, organization_id: &str, cloud_domain: &str) -> String {
    format!(
        "https://{}-{}.{}/{API_PATH_PREFIX}",
        workspace_id.trim(),
        organization_id.trim(),
        cloud_domain.trim().trim_matches('/')
    )
}

/// `{server}/api/v1`
pub fn onprem_base_url(server_url: &str) -> String {
    format!("{}/{API_PATH_PREFIX}", normalize_base_url(server_url))
}

/// `gateway.{domain}`
pub fn gateway_host(cloud_domain: &str) -> String {
    format!("{GATEWAY_HOST_LABEL}.{}", cloud_domain.trim().trim_matches('/'))
}

fn parse(target: &str, query: Option<&str>) -> Result<Url> {
    let mut url =
        Url::parse(target).map_err(|e| ClientError::InvalidUrl(format!("{target}: {e}")))?;
    url.set_query(query);
    Ok(url)
}

/// Rewrite `request_url` to the surface `config` targets.
///
/// `workspace_base` is the base computed for the current call (workspace or
/// on-prem); its trailing `/api/v1` is tolerated.
///
/// # Errors
///
/// - `RestrictedEndpoint` for cloud-only paths in on-prem mode.
/// - `Configuration` when on-prem mode has no server URL.
/// - `InvalidUrl` when the composed URL does not parse.
pub fn compose_url(config: &EffectiveConfig, request_url: &Url, workspace_base: &str) -> Result<Route> {
    let path = request_url.path();
    let query = request_url.query();

    if config.is_onprem() {
        if is_restricted_onprem_path(path) {
            return Err(ClientError::RestrictedEndpoint {
                path: resource_path(path).to_string(),
            });
        }
        let server = config.onprem_server_url.as_deref().ok_or_else(|| {
            ClientError::Configuration("on-prem mode requires CRIBL_ONPREM_SERVER_URL".to_string())
        })?;
        let target = format!("{}/{}", onprem_base_url(server), resource_path(path));
        return Ok(Route {
            surface: Surface::OnPrem,
            url: parse(&target, query)?,
            host_override: None,
        });
    }

    let on_gateway_host = request_url
        .host_str()
        .is_some_and(|host| host.contains("gateway."));

    if is_gateway_path(path) || on_gateway_host {
        let host = gateway_host(config.cloud_domain());
        let target = format!("https://{host}/{}", resource_path(path));
        return Ok(Route {
            surface: Surface::Gateway,
            url: parse(&target, query)?,
            host_override: Some(host),
        });
    }

    let base = normalize_base_url(workspace_base);
    let api_root = base
        .strip_suffix(&format!("/{API_PATH_PREFIX}"))
        .unwrap_or(&base);
    let target = format!("{api_root}/{API_PATH_PREFIX}/{}", resource_path(path));
    Ok(Route {
        surface: Surface::Workspace,
        url: parse(&target, query)?,
        host_override: None,
    })
}
