//! Authentication and routing layer for Cribl API clients.
//!
//! [`CriblAuthHook`] sits between a generated client's request pipeline and the
//! wire: it resolves credentials, rewrites request URLs to the workspace,
//! gateway, or on-prem API, and attaches a cached bearer token.

pub mod endpoint;
pub mod error;
pub mod hook;
pub mod metrics;
pub mod token;
pub mod tracing;
pub mod transport;

pub use endpoint::{Route, Surface, compose_url, is_gateway_path, is_restricted_onprem_path};
pub use error::{ClientError, Result};
pub use hook::{CriblAuthHook, CriblAuthHookBuilder, HookContext};
pub use metrics::MetricsCollector;
pub use token::{AuthFlow, SessionKey, TokenInfo, TokenManager};
pub use transport::{AuthRequest, ResilientTransport};

pub use cribl_config::{
    CredentialResolver, EffectiveConfig, EnvSource, ProfileSource, ProviderConfig, Security,
    SecurityOverride,
};
