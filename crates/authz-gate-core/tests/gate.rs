//! Authorization gate tests for authz-gate-core.
// crates/authz-gate-core/tests/gate.rs
// ============================================================================
// Module: Authorization Gate Tests
// Description: Enabled checks, disable rules, and deny handling.
// Purpose: Ensure denied requests never reach the wrapped application.
// Dependencies: authz-gate-config, authz-gate-core, axum, reqwest, tokio
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use authz_gate_config::AuthzConfig;
use authz_gate_config::DisableRule;
use authz_gate_core::AuditEventKind;
use authz_gate_core::AuthzGate;
use authz_gate_core::AuthzRequest;
use authz_gate_core::DecisionClient;
use authz_gate_core::GateDecision;
use authz_gate_core::RouteTable;
use authz_gate_core::gate_middleware;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use common::CollectingSink;
use common::ScriptedAuthorizer;
use common::TestRequest;
use common::complete_config;
use tokio::sync::oneshot;

/// Builds a gate with a route table, scripted authorizer and sink.
fn gate(config: AuthzConfig, authorizer: Arc<ScriptedAuthorizer>) -> (AuthzGate, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::default());
    let routes = RouteTable::new()
        .add("GET", "/api/users(.:format)", "users#index")
        .add("GET", "/health", "health#show");
    let client = DecisionClient::builder(Arc::new(config))
        .authorizer(authorizer)
        .audit_sink(Arc::clone(&sink) as _)
        .resolver(Arc::new(routes))
        .build()
        .expect("client");
    (AuthzGate::new(Arc::new(client)), sink)
}

/// Runs a request through the gate, counting application invocations.
async fn run(gate: &AuthzGate, uri: &str, calls: &Arc<AtomicUsize>) -> Response {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    let calls = Arc::clone(calls);
    gate.handle(request, |_request| async move {
        calls.fetch_add(1, Ordering::SeqCst);
        (StatusCode::OK, "app").into_response()
    })
    .await
}

// ============================================================================
// SECTION: Skipping
// ============================================================================

#[tokio::test]
async fn disabled_gate_skips_authorizer() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", false)]);
    let config = AuthzConfig {
        enabled: false,
        ..complete_config()
    };
    let (gate, sink) = gate(config, Arc::clone(&authorizer));
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/api/users", &calls).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(authorizer.call_count(), 0);
    assert_eq!(sink.kinds(), vec![AuditEventKind::AuthzSkipped]);
}

#[tokio::test]
async fn matching_disable_rule_skips_authorizer() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", false)]);
    let config = AuthzConfig {
        disabled_for: vec![DisableRule::new("/health", ["health#show"])],
        ..complete_config()
    };
    let (gate, _sink) = gate(config, Arc::clone(&authorizer));
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/health", &calls).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(authorizer.call_count(), 0);
}

#[tokio::test]
async fn disable_rule_needs_path_and_action() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", true)]);
    let config = AuthzConfig {
        disabled_for: vec![DisableRule::new("/api/users", ["users#create"])],
        ..complete_config()
    };
    let (gate, _sink) = gate(config, Arc::clone(&authorizer));
    let request = TestRequest::new("GET", "/api/users.json");
    assert_eq!(gate.authorize(&request).await, GateDecision::Allowed);
    assert_eq!(authorizer.call_count(), 1);
}

// ============================================================================
// SECTION: Enforcement
// ============================================================================

#[tokio::test]
async fn allowed_request_reaches_application() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", true)]);
    let (gate, _sink) = gate(complete_config(), Arc::clone(&authorizer));
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/api/users", &calls).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(authorizer.last_call().policy_context.path, "peoplefinder.GET.api.users");
}

#[tokio::test]
async fn denied_request_gets_default_forbidden() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", false)]);
    let (gate, _sink) = gate(complete_config(), authorizer);
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/api/users", &calls).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn denied_request_uses_unauthorized_callback_verbatim() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", false)]);
    let (gate, _sink) = gate(complete_config(), authorizer);
    let gate = gate.with_unauthorized(|request: &dyn AuthzRequest| {
        (StatusCode::UNAUTHORIZED, format!("no access to {}", request.path())).into_response()
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/api/users", &calls).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"no access to /api/users");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authorizer_failure_denies() {
    let (gate, sink) = gate(complete_config(), ScriptedAuthorizer::failing());
    let calls = Arc::new(AtomicUsize::new(0));
    let response = run(&gate, "/api/users", &calls).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(sink.kinds(), vec![AuditEventKind::AuthorizerError]);
}

// ============================================================================
// SECTION: Axum Middleware
// ============================================================================

/// Serves a router behind the gate middleware on an ephemeral port.
async fn spawn_gated_app(gate: AuthzGate) -> (String, oneshot::Sender<()>) {
    let app = Router::new()
        .route("/api/users", get(|| async { "users" }))
        .route("/health", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(gate, gate_middleware));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    (format!("http://{addr}"), shutdown_tx)
}

#[tokio::test]
async fn middleware_enforces_decisions() {
    let authorizer = ScriptedAuthorizer::answering(&[("allowed", false)]);
    let config = AuthzConfig {
        disabled_for: vec![DisableRule::new("/health", ["health#show"])],
        ..complete_config()
    };
    let (gate, _sink) = gate(config, authorizer);
    let (base_url, shutdown_tx) = spawn_gated_app(gate).await;
    let http = reqwest::Client::new();

    let denied = http.get(format!("{base_url}/api/users")).send().await.expect("send");
    assert_eq!(denied.status().as_u16(), 403);
    assert_eq!(denied.text().await.expect("body"), "Forbidden");

    let skipped = http.get(format!("{base_url}/health")).send().await.expect("send");
    assert_eq!(skipped.status().as_u16(), 200);
    assert_eq!(skipped.text().await.expect("body"), "ok");

    let _ = shutdown_tx.send(());
}
