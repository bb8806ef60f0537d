//! Common test utilities for integration tests.
//!
//! # Invariants
//! - Hooks built here never read the process environment, and read a profile
//!   file only when one is passed explicitly
//! - Metrics are disabled so no global recorder is needed
//!
//! # What this does NOT handle
//! - Mock server setup (use wiremock directly in tests)

use std::path::Path;
use std::time::Duration;

#[allow(unused_imports)]
pub use cribl_client::{ClientError, CriblAuthHook, HookContext};
use cribl_client::{CredentialResolver, EnvSource, MetricsCollector, ProfileSource};
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hook whose only credential source is `vars`.
#[allow(dead_code)]
pub fn hook_with_env(vars: &[(&str, &str)]) -> CriblAuthHook {
    CriblAuthHook::builder()
        .resolver(CredentialResolver::new(
            EnvSource::from_pairs(vars.iter().copied()),
            ProfileSource::disabled(),
        ))
        .metrics(MetricsCollector::disabled())
        .build()
        .unwrap()
}

/// Hook reading `vars` plus the `default` profile of the file at `profile_path`.
#[allow(dead_code)]
pub fn hook_with_profile(vars: &[(&str, &str)], profile_path: &Path) -> CriblAuthHook {
    CriblAuthHook::builder()
        .resolver(CredentialResolver::new(
            EnvSource::from_pairs(vars.iter().copied()),
            ProfileSource::new(profile_path),
        ))
        .metrics(MetricsCollector::disabled())
        .build()
        .unwrap()
}

/// A bare `GET` request as the pipeline would hand it to the hook.
#[allow(dead_code)]
pub fn get(url: &str) -> reqwest::Request {
    reqwest::Request::new(reqwest::Method::GET, url.parse().unwrap())
}

/// The `Authorization` header of a prepared request.
#[allow(dead_code)]
pub fn authorization(request: &reqwest::Request) -> &str {
    request
        .headers()
        .get(reqwest::header::AUTHORIZATION)
        .expect("authorization header")
        .to_str()
        .unwrap()
}

/// Advance Tokio's paused clock and yield so sleepers can observe the change.
#[allow(dead_code)]
pub async fn advance_and_yield(duration: Duration) {
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}

/// Assert that a task has not completed after yielding to the scheduler.
#[allow(dead_code)]
pub async fn assert_pending<T>(handle: &tokio::task::JoinHandle<T>, context: &str) {
    tokio::task::yield_now().await;
    assert!(!handle.is_finished(), "Expected pending task: {}", context);
}
