// crates/authz-gate-core/src/gate.rs
// ============================================================================
// Module: Authorization Gate
// Description: Middleware entry point enforcing authorizer decisions.
// Purpose: Allow or deny each inbound request before it reaches the app.
// Dependencies: axum, decision, request
// ============================================================================

//! ## Overview
//! [`AuthzGate`] wraps an application handler. For each request it decides
//! whether authorization applies (the enabled flag plus the per-route disable
//! rules), queries the configured decision when it does, and then either
//! forwards the request untouched or answers with the unauthorized response.
//!
//! The gate is usable directly through [`AuthzGate::handle`] or as an axum
//! layer through [`gate_middleware`] with `middleware::from_fn_with_state`.
//!
//! # Invariants
//! - A denied request never reaches the wrapped handler.
//! - Authorizer errors surface only as a deny; details go to the audit sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::audit::AuditEventKind;
use crate::audit::AuthzAuditEvent;
use crate::decision::DecisionClient;
use crate::request::AuthzRequest;
use crate::request::RequestView;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Unauthorized response callback.
pub type UnauthorizedFn = dyn Fn(&dyn AuthzRequest) -> Response + Send + Sync;

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Authorization does not apply; the authorizer was not called.
    Skipped,
    /// Authorizer allowed the request.
    Allowed,
    /// Authorizer denied the request or failed.
    Denied,
}

impl GateDecision {
    /// Returns true when the request may proceed.
    #[must_use]
    pub const fn permits(self) -> bool {
        matches!(self, Self::Skipped | Self::Allowed)
    }
}

/// Shared gate state.
struct GateInner {
    /// Decision client.
    client: Arc<DecisionClient>,
    /// Unauthorized response callback.
    unauthorized: Arc<UnauthorizedFn>,
}

/// Authorization gate; cheap to clone.
#[derive(Clone)]
pub struct AuthzGate {
    /// Shared state.
    inner: Arc<GateInner>,
}

impl fmt::Debug for AuthzGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthzGate").finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

impl AuthzGate {
    /// Builds a gate answering denials with `403 Forbidden`.
    #[must_use]
    pub fn new(client: Arc<DecisionClient>) -> Self {
        Self {
            inner: Arc::new(GateInner {
                client,
                unauthorized: Arc::new(forbidden),
            }),
        }
    }

    /// Returns a gate using a custom unauthorized response.
    #[must_use]
    pub fn with_unauthorized<F>(self, handler: F) -> Self
    where
        F: Fn(&dyn AuthzRequest) -> Response + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(GateInner {
                client: Arc::clone(&self.inner.client),
                unauthorized: Arc::new(handler),
            }),
        }
    }

    /// Returns the decision client.
    #[must_use]
    pub fn client(&self) -> &DecisionClient {
        &self.inner.client
    }

    /// Decides whether a request may proceed.
    pub async fn authorize(&self, request: &dyn AuthzRequest) -> GateDecision {
        let client = self.client();
        let config = client.config();
        let route = client.resolve_route(request);
        let disabled = route.as_ref().is_some_and(|route| {
            config.is_disabled_for(&route.path, &route.action)
        });
        if !config.enabled || disabled {
            client.audit().record(&AuthzAuditEvent::new(
                AuditEventKind::AuthzSkipped,
                request.method(),
                request.path(),
            ));
            return GateDecision::Skipped;
        }
        if client.decide(request, route.as_ref(), &config.decision).await {
            GateDecision::Allowed
        } else {
            GateDecision::Denied
        }
    }

    /// Runs the gate around an application handler.
    ///
    /// The handler's response is returned verbatim when the request proceeds.
    pub async fn handle<B, F, Fut>(&self, request: Request<B>, app: F) -> Response
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let (parts, body) = request.into_parts();
        let denied = {
            let view = RequestView::from_parts(&parts);
            match self.authorize(&view).await {
                GateDecision::Denied => Some((self.inner.unauthorized)(&view)),
                GateDecision::Skipped | GateDecision::Allowed => None,
            }
        };
        match denied {
            Some(response) => response,
            None => app(Request::from_parts(parts, body)).await,
        }
    }
}

/// Axum middleware adapter for `middleware::from_fn_with_state`.
pub async fn gate_middleware(
    State(gate): State<AuthzGate>,
    request: Request<Body>,
    next: Next,
) -> Response {
    gate.handle(request, |request| next.run(request)).await
}

/// Default unauthorized response.
fn forbidden(_request: &dyn AuthzRequest) -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}
