// crates/authz-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared requests, configs, and fake transports for core tests.
// Purpose: Exercise the decision pipeline without a live authorizer.
// Dependencies: authz-gate-config, authz-gate-core
// ============================================================================

//! ## Overview
//! Fixtures shared across the core integration tests: an in-memory request,
//! a complete configuration, a scripted authorizer that records every query,
//! and an audit sink that collects events.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use authz_gate_config::AuthzConfig;
use authz_gate_core::AuditEventKind;
use authz_gate_core::AuditSink;
use authz_gate_core::Authorizer;
use authz_gate_core::AuthorizerError;
use authz_gate_core::AuthzAuditEvent;
use authz_gate_core::AuthzRequest;
use authz_gate_core::Decision;
use authz_gate_core::IsRequest;
use authz_gate_core::IsResponse;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// In-memory request fixture.
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    /// HTTP method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Headers keyed by lower-case name.
    pub headers: BTreeMap<String, String>,
    /// Request parameters.
    pub params: BTreeMap<String, String>,
}

impl TestRequest {
    /// Builds a request without headers or parameters.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Adds a parameter.
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }
}

impl AuthzRequest for TestRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Returns a config with every required option set.
pub fn complete_config() -> AuthzConfig {
    AuthzConfig {
        service_url: "http://127.0.0.1:1".to_string(),
        authorizer_api_key: "api-key".to_string(),
        tenant_id: "tenant-1".to_string(),
        policy_root: "peoplefinder".to_string(),
        ..AuthzConfig::default()
    }
}

// ============================================================================
// SECTION: Authorizer
// ============================================================================

/// Scripted authorizer recording every query.
pub struct ScriptedAuthorizer {
    /// Verdicts returned on success; `None` simulates a transport failure.
    decisions: Option<Vec<(String, bool)>>,
    /// Queries received.
    pub calls: Mutex<Vec<IsRequest>>,
}

impl ScriptedAuthorizer {
    /// Authorizer answering with the given verdicts.
    pub fn answering(decisions: &[(&str, bool)]) -> Arc<Self> {
        Arc::new(Self {
            decisions: Some(
                decisions.iter().map(|(name, is)| ((*name).to_string(), *is)).collect(),
            ),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Authorizer failing every call.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            decisions: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Number of queries received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Most recent query.
    pub fn last_call(&self) -> IsRequest {
        self.calls.lock().unwrap().last().cloned().expect("authorizer was called")
    }
}

#[async_trait]
impl Authorizer for ScriptedAuthorizer {
    async fn is(&self, request: &IsRequest) -> Result<IsResponse, AuthorizerError> {
        self.calls.lock().unwrap().push(request.clone());
        let decisions = self
            .decisions
            .as_ref()
            .ok_or_else(|| AuthorizerError::Transport("connection refused".to_string()))?;
        Ok(IsResponse {
            decisions: decisions
                .iter()
                .map(|(name, is)| Decision {
                    decision: name.clone(),
                    is: *is,
                })
                .collect(),
        })
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink collecting events.
#[derive(Default)]
pub struct CollectingSink {
    /// Recorded events.
    pub events: Mutex<Vec<AuthzAuditEvent>>,
}

impl CollectingSink {
    /// Returns the recorded event kinds.
    pub fn kinds(&self) -> Vec<AuditEventKind> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }
}

impl AuditSink for CollectingSink {
    fn record(&self, event: &AuthzAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
