// crates/authz-gate-directory/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: In-process fake directory gateway and configs.
// Purpose: Exercise the directory client over real HTTP.
// Dependencies: authz-gate-directory, axum, tokio
// ============================================================================

//! ## Overview
//! [`FakeDirectory`] answers every request from a path-keyed reply table and
//! records what it received; unknown paths get `404`.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use authz_gate_directory::DirectoryClient;
use authz_gate_directory::DirectoryConfig;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::response::Response;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Fake Gateway
// ============================================================================

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Recorded {
    /// HTTP method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Raw query string.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: String,
}

impl Recorded {
    /// Returns a header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

/// Fake gateway state.
struct GatewayState {
    /// Replies keyed by path.
    replies: BTreeMap<String, (StatusCode, String)>,
    /// Received requests.
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// Running fake directory gateway.
pub struct FakeDirectory {
    /// Base URL with trailing slash.
    pub url: String,
    /// Received requests.
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Shutdown signal.
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeDirectory {
    /// Returns every recorded request.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Returns the single recorded request.
    pub fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().expect("request")
    }

    /// Builds a client with every service pointed at this gateway.
    pub fn client(&self) -> DirectoryClient {
        DirectoryClient::new(&config_for(&self.url)).expect("directory client")
    }
}

impl Drop for FakeDirectory {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Records the request and answers from the reply table.
async fn record(
    State(state): State<Arc<GatewayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().expect("requests lock").push(Recorded {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    match state.replies.get(&path) {
        Some((status, reply)) => (*status, reply.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Spawns a fake gateway answering `replies` as `(path, status, body)`.
pub async fn spawn_directory(replies: &[(&str, StatusCode, &str)]) -> FakeDirectory {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = Arc::new(GatewayState {
        replies: replies
            .iter()
            .map(|(path, status, body)| ((*path).to_string(), (*status, (*body).to_string())))
            .collect(),
        requests: Arc::clone(&requests),
    });
    let app = Router::new().fallback(record).with_state(state);
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
    FakeDirectory {
        url: format!("http://{addr}/"),
        requests,
        shutdown: Some(shutdown_tx),
    }
}

// ============================================================================
// SECTION: Configs
// ============================================================================

/// Complete base configuration for a gateway URL.
pub fn config_for(url: &str) -> DirectoryConfig {
    DirectoryConfig {
        url: url.to_string(),
        api_key: Some("directory-key".to_string()),
        tenant_id: Some("tenant-1".to_string()),
        ..DirectoryConfig::default()
    }
}
