// crates/authz-gate-core/src/authorizer.rs
// ============================================================================
// Module: Authorizer Transport
// Description: Decision query wire types and the HTTP authorizer client.
// Purpose: Send `is` queries to the remote policy-decision service.
// Dependencies: authz-gate-config, reqwest, serde
// ============================================================================

//! ## Overview
//! [`Authorizer`] is the transport seam between the decision client and the
//! remote policy-decision service. [`HttpAuthorizer`] speaks the JSON gateway
//! protocol: `POST {service_url}/api/v2/authz/is` carrying an [`IsRequest`]
//! and answering with an [`IsResponse`]. Every request carries the tenant in
//! `aserto-tenant-id` and the API key as `authorization: basic <key>`.
//! Security posture: the authorizer is the trust boundary; callers treat
//! every error as a deny.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use authz_gate_config::AuthzConfig;
use reqwest::Certificate;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identity::IdentityContext;
use crate::resource::ResourceContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tenant header name.
pub const TENANT_HEADER: &str = "aserto-tenant-id";
/// Decision endpoint relative to the service URL.
const IS_ENDPOINT: &str = "/api/v2/authz/is";
/// Maximum accepted certificate file size in bytes.
const MAX_CERT_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Policy selection for a decision query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyContext {
    /// Policy path.
    pub path: String,
    /// Requested decision names.
    pub decisions: Vec<String>,
}

/// Policy instance selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInstance {
    /// Policy name.
    pub name: String,
    /// Instance label.
    pub instance_label: String,
}

/// Decision query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsRequest {
    /// Caller identity.
    pub identity_context: IdentityContext,
    /// Policy selection.
    pub policy_context: PolicyContext,
    /// Policy instance when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_instance: Option<PolicyInstance>,
    /// Resource attributes.
    #[serde(default)]
    pub resource_context: ResourceContext,
}

/// One named verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Decision name.
    #[serde(alias = "name")]
    pub decision: String,
    /// Verdict.
    #[serde(default)]
    pub is: bool,
}

/// Decision query response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsResponse {
    /// Verdicts in authorizer order.
    #[serde(default)]
    pub decisions: Vec<Decision>,
}

impl IsResponse {
    /// Returns the verdict for a decision name; absent names are `false`.
    #[must_use]
    pub fn decision(&self, name: &str) -> bool {
        self.decisions.iter().find(|decision| decision.decision == name).is_some_and(|d| d.is)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authorizer transport failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Error)]
pub enum AuthorizerError {
    /// Client construction failed.
    #[error("authorizer init error: {0}")]
    Init(String),
    /// Header value could not be encoded.
    #[error("authorizer invalid header: {0}")]
    InvalidHeader(String),
    /// Request could not be sent or completed.
    #[error("authorizer transport error: {0}")]
    Transport(String),
    /// Authorizer returned a non-success status.
    #[error("authorizer returned status {0}")]
    Status(u16),
    /// Response body could not be decoded.
    #[error("authorizer decode error: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Authorizer Contract
// ============================================================================

/// Remote policy-decision service.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Evaluates a decision query.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] when the query cannot be answered.
    async fn is(&self, request: &IsRequest) -> Result<IsResponse, AuthorizerError>;
}

// ============================================================================
// SECTION: HTTP Authorizer
// ============================================================================

/// JSON gateway authorizer client.
///
/// # Invariants
/// - `endpoint` is absolute and never has a doubled slash before the path.
/// - Headers are validated once at construction.
pub struct HttpAuthorizer {
    /// Full decision endpoint URL.
    endpoint: String,
    /// Tenant and credential headers.
    headers: HeaderMap,
    /// Pooled HTTP client configured with timeouts.
    client: Client,
}

impl HttpAuthorizer {
    /// Builds an authorizer client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizerError`] when the certificate cannot be loaded,
    /// headers are not encodable, or the client cannot be built.
    pub fn new(config: &AuthzConfig) -> Result<Self, AuthorizerError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms));
        if let Some(cert_path) = &config.cert_path {
            builder = builder.add_root_certificate(load_certificate(cert_path)?);
        }
        let client = builder.build().map_err(|err| AuthorizerError::Init(err.to_string()))?;
        Ok(Self {
            endpoint: format!("{}{IS_ENDPOINT}", normalize_service_url(&config.service_url)),
            headers: auth_headers(&config.tenant_id, &config.authorizer_api_key)?,
            client,
        })
    }

    /// Returns the decision endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Authorizer for HttpAuthorizer {
    async fn is(&self, request: &IsRequest) -> Result<IsResponse, AuthorizerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| AuthorizerError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthorizerError::Status(status.as_u16()));
        }
        response.json::<IsResponse>().await.map_err(|err| AuthorizerError::Decode(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Trims trailing slashes and defaults the scheme to `https`.
#[must_use]
pub fn normalize_service_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") }
}

/// Builds the tenant and basic-credential headers.
fn auth_headers(tenant_id: &str, api_key: &str) -> Result<HeaderMap, AuthorizerError> {
    let mut headers = HeaderMap::new();
    let tenant = HeaderValue::from_str(tenant_id)
        .map_err(|_| AuthorizerError::InvalidHeader("invalid tenant id".to_string()))?;
    headers.insert(TENANT_HEADER, tenant);
    let mut credential = HeaderValue::from_str(&format!("basic {api_key}"))
        .map_err(|_| AuthorizerError::InvalidHeader("invalid api key".to_string()))?;
    credential.set_sensitive(true);
    headers.insert(AUTHORIZATION, credential);
    Ok(headers)
}

/// Loads a PEM root certificate.
fn load_certificate(path: &Path) -> Result<Certificate, AuthorizerError> {
    let metadata = fs::metadata(path).map_err(|err| AuthorizerError::Init(err.to_string()))?;
    if !metadata.is_file() {
        return Err(AuthorizerError::Init(format!("cert path is not a file: {}", path.display())));
    }
    if metadata.len() > MAX_CERT_BYTES {
        return Err(AuthorizerError::Init("cert file exceeds size limit".to_string()));
    }
    let pem = fs::read(path).map_err(|err| AuthorizerError::Init(err.to_string()))?;
    Certificate::from_pem(&pem).map_err(|err| AuthorizerError::Init(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions use unwrap/expect for clarity."
    )]

    use super::Decision;
    use super::IsResponse;
    use super::normalize_service_url;

    #[test]
    fn service_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(normalize_service_url("localhost:8383/"), "https://localhost:8383");
        assert_eq!(normalize_service_url("http://127.0.0.1:9/"), "http://127.0.0.1:9");
    }

    #[test]
    fn decision_lookup_is_by_name() {
        let response = IsResponse {
            decisions: vec![
                Decision {
                    decision: "allowed".to_string(),
                    is: false,
                },
                Decision {
                    decision: "visible".to_string(),
                    is: true,
                },
            ],
        };
        assert!(!response.decision("allowed"));
        assert!(response.decision("visible"));
        assert!(!response.decision("enabled"));
    }

    #[test]
    fn response_accepts_name_alias() {
        let response: IsResponse =
            serde_json::from_str(r#"{"decisions":[{"name":"allowed","is":true}]}"#).unwrap();
        assert!(response.decision("allowed"));
    }
}
