//! Resource mapper tests for authz-gate-core.
// crates/authz-gate-core/tests/resource_mapping.rs
// ============================================================================
// Module: Resource Mapping Tests
// Description: Placeholder extraction and custom mapper validation.
// Purpose: Pin the resource context sent alongside each decision query.
// Dependencies: authz-gate-core, serde_json
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use authz_gate_core::AuthzRequest;
use authz_gate_core::MappingError;
use authz_gate_core::PatternRoutes;
use authz_gate_core::ResourceMapper;
use authz_gate_core::RouteMatch;
use authz_gate_core::RouteResolver;
use common::TestRequest;
use serde_json::json;

#[test]
fn placeholders_bind_request_params() {
    let request = TestRequest::new("GET", "/api/users/42").param("id", "from-param");
    let route = RouteMatch::new("/api/users/:id", "GET");
    let context = ResourceMapper::Default.execute(&request, Some(&route)).unwrap();
    assert_eq!(serde_json::Value::Object(context), json!({"id": "from-param"}));
}

#[test]
fn placeholders_fall_back_to_route_captures() {
    let routes = PatternRoutes::new().get("/orgs/:org/users/:id");
    let request = TestRequest::new("GET", "/orgs/acme/users/7");
    let route = routes.route(&request);
    let context = ResourceMapper::Default.execute(&request, route.as_ref()).unwrap();
    assert_eq!(serde_json::Value::Object(context), json!({"org": "acme", "id": "7"}));
}

#[test]
fn non_placeholder_params_are_ignored() {
    let request = TestRequest::new("GET", "/api/users/1").param("id", "1").param("page", "2");
    let route = RouteMatch::new("/api/users/:id", "GET");
    let context = ResourceMapper::Default.execute(&request, Some(&route)).unwrap();
    assert_eq!(context.len(), 1);
    assert!(!context.contains_key("page"));
}

#[test]
fn empty_without_route() {
    let request = TestRequest::new("GET", "/api/users/1").param("id", "1");
    assert!(ResourceMapper::Default.execute(&request, None).unwrap().is_empty());
}

#[test]
fn empty_without_params_or_captures() {
    let request = TestRequest::new("GET", "/api/users/1");
    let route = RouteMatch::new("/api/users/:id", "GET");
    assert!(ResourceMapper::Default.execute(&request, Some(&route)).unwrap().is_empty());
}

#[test]
fn empty_without_placeholders() {
    let request = TestRequest::new("GET", "/api/users").param("id", "1");
    let route = RouteMatch::new("/api/users", "GET");
    assert!(ResourceMapper::Default.execute(&request, Some(&route)).unwrap().is_empty());
}

#[test]
fn custom_mapper_object_is_accepted() {
    let mapper = ResourceMapper::custom(|request: &dyn AuthzRequest| {
        json!({"path": request.path(), "owner": true})
    });
    let context = mapper.execute(&TestRequest::new("GET", "/doc"), None).unwrap();
    assert_eq!(context.get("path"), Some(&json!("/doc")));
    assert_eq!(context.get("owner"), Some(&json!(true)));
}

#[test]
fn custom_mapper_non_object_is_rejected() {
    let mapper = ResourceMapper::custom(|_request: &dyn AuthzRequest| json!(["not", "a", "map"]));
    let err = mapper.execute(&TestRequest::new("GET", "/"), None).unwrap_err();
    assert_eq!(err, MappingError::InvalidResourceMapping("array"));
    assert!(err.to_string().contains("expected an object"));
}
