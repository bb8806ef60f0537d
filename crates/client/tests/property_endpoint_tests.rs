//! Property-based tests for URL composition helpers.
//!
//! Uses proptest to check that composed URLs stay well formed for arbitrary
//! identifiers and slash placement.

use cribl_client::endpoint::{
    is_gateway_path, is_restricted_onprem_path, resource_path, workspace_base_url,
};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,15}"
}

fn slashes() -> impl Strategy<Value = String> {
    "/{0,3}"
}

proptest! {
    #[test]
    fn prop_workspace_url_has_single_api_prefix(
        workspace in identifier(),
        org in identifier(),
        domain in "[a-z]{2,10}\\.cloud",
        trailing in slashes(),
    ) {
        let base = workspace_base_url(&workspace, &org, &format!("{domain}{trailing}"));
        prop_assert_eq!(base.matches("/api/v1").count(), 1);
        prop_assert!(base.ends_with("/api/v1"));
        let expected_prefix = format!("https://{}-{}.{}/", workspace, org, domain);
        prop_assert!(base.starts_with(&expected_prefix));
    }

    #[test]
    fn prop_resource_path_ignores_prefix_and_slashes(
        resource in "[a-z]{1,12}(/[a-z0-9]{1,8}){0,3}",
        lead in slashes(),
        prefix in prop::sample::select(vec!["", "api/v1/", "v1/"]),
    ) {
        prop_assume!(resource != "api" && !resource.starts_with("api/"));
        let path = format!("{lead}{prefix}{resource}");
        prop_assert_eq!(resource_path(&path), resource.as_str());
    }

    #[test]
    fn prop_organizations_paths_are_gateway_paths(
        tail in "(/[a-z0-9]{1,8}){0,3}",
        prefix in prop::sample::select(vec!["/", "/api/v1/", "/v1/", ""]),
    ) {
        let path = format!("{prefix}organizations{tail}");
        prop_assert!(is_gateway_path(&path));
    }

    #[test]
    fn prop_other_resources_are_not_gateway_paths(
        resource in "[a-z]{1,12}",
        prefix in prop::sample::select(vec!["/", "/api/v1/", "/v1/"]),
    ) {
        prop_assume!(resource != "organizations");
        let path = format!("{prefix}{resource}");
        prop_assert!(!is_gateway_path(&path));
        // A name that merely starts with the gateway segment is not a gateway path.
        let lookalike = format!("{prefix}organizations{resource}");
        prop_assert!(!is_gateway_path(&lookalike));
    }

    #[test]
    fn prop_gateway_paths_are_restricted_onprem(
        tail in "(/[a-z0-9]{1,8}){0,2}",
    ) {
        let path = format!("/api/v1/organizations{tail}");
        prop_assert!(is_restricted_onprem_path(&path));
    }
}
