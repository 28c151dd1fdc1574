// crates/authz-gate-directory/src/client.rs
// ============================================================================
// Module: Directory Client
// Description: Per-service HTTP transports and the directory client facade.
// Purpose: Route directory calls to the configured service endpoints.
// Dependencies: authz-gate-config, reqwest, url
// ============================================================================

//! ## Overview
//! [`DirectoryClient`] holds one transport per configured directory service.
//! Services resolve their settings independently (see
//! [`DirectoryConfig::resolve`]); a call against a service that did not
//! resolve fails with [`DirectoryError::NotConfigured`] instead of reaching
//! the network.
//!
//! Directory errors propagate to the caller. Unlike the decision client there
//! is no fail-closed conversion here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use authz_gate_config::DirectoryConfig;
use authz_gate_config::DirectoryService;
use authz_gate_config::ResolvedServiceConfig;
use reqwest::Certificate;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tenant header name.
const TENANT_HEADER: &str = "aserto-tenant-id";
/// Path prefix of the directory gateway.
const API_PREFIX: [&str; 3] = ["api", "v3", "directory"];
/// Content type for newline-delimited JSON bodies.
const NDJSON: &str = "application/x-ndjson";
/// Maximum accepted certificate file size in bytes.
const MAX_CERT_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Directory client failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The service has no usable configuration.
    #[error("directory {0} client is not configured")]
    NotConfigured(DirectoryService),
    /// The requested object, relation or manifest does not exist.
    #[error("directory resource not found: {0}")]
    NotFound(String),
    /// Request could not be sent or completed.
    #[error("directory transport error: {0}")]
    Transport(String),
    /// Directory returned a non-success status.
    #[error("directory returned status {0}")]
    Status(u16),
    /// Response body could not be decoded.
    #[error("directory decode error: {0}")]
    Decode(String),
    /// Client construction failed.
    #[error("directory init error: {0}")]
    Init(String),
    /// Configuration or request input is invalid.
    #[error("directory invalid input: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Service Transport
// ============================================================================

/// HTTP transport bound to one directory service.
///
/// # Invariants
/// - `base_url` is absolute and can carry path segments.
#[derive(Debug)]
pub(crate) struct ServiceClient {
    /// Service base URL.
    base_url: Url,
    /// Tenant and credential headers.
    headers: HeaderMap,
    /// Pooled HTTP client configured with timeouts.
    client: Client,
}

impl ServiceClient {
    /// Builds a transport from resolved settings.
    fn new(
        resolved: &ResolvedServiceConfig,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let mut builder =
            Client::builder().connect_timeout(connect_timeout).timeout(request_timeout);
        if let Some(cert_path) = &resolved.cert_path {
            builder = builder.add_root_certificate(load_certificate(cert_path)?);
        }
        let client = builder.build().map_err(|err| DirectoryError::Init(err.to_string()))?;
        Ok(Self {
            base_url: parse_base_url(&resolved.url)?,
            headers: auth_headers(&resolved.tenant_id, &resolved.api_key)?,
            client,
        })
    }

    /// Builds an endpoint URL under the gateway prefix.
    ///
    /// Segments are percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DirectoryError::Init("directory url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Sends a `GET` and decodes the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, DirectoryError> {
        let response = self.send(self.client.get(url)).await?;
        decode_json(response).await
    }

    /// Sends a JSON `POST` and decodes the JSON response.
    pub(crate) async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, DirectoryError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.post(url).json(body)).await?;
        decode_json(response).await
    }

    /// Sends a `DELETE`, discarding the response body.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), DirectoryError> {
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    /// Sends a JSON `POST` and returns the raw response text.
    pub(crate) async fn post_for_text<B>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<String, DirectoryError>
    where
        B: Serialize + Sync,
    {
        let response = self.send(self.client.post(url).json(body)).await?;
        response.text().await.map_err(|err| DirectoryError::Transport(err.to_string()))
    }

    /// Sends a newline-delimited JSON body and returns the raw response text.
    pub(crate) async fn post_ndjson(&self, url: Url, body: String) -> Result<String, DirectoryError> {
        let request =
            self.client.post(url).header(CONTENT_TYPE, HeaderValue::from_static(NDJSON)).body(body);
        let response = self.send(request).await?;
        response.text().await.map_err(|err| DirectoryError::Transport(err.to_string()))
    }

    /// Attaches headers, sends, and maps the status.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|err| DirectoryError::Transport(err.to_string()))?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound(response.url().path().to_string())),
            status => Err(DirectoryError::Status(status.as_u16())),
        }
    }
}

// ============================================================================
// SECTION: Directory Client
// ============================================================================

/// Typed directory client.
///
/// Service operations live in the `reader`, `writer`, `importer`, `exporter`
/// and `model` modules.
#[derive(Debug)]
pub struct DirectoryClient {
    /// Transports for the services that resolved.
    services: BTreeMap<DirectoryService, ServiceClient>,
}

impl DirectoryClient {
    /// Builds a client, configuring every service that resolves.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the configuration is invalid or a
    /// resolved service cannot build its transport.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        config.validate().map_err(|err| DirectoryError::Invalid(err.to_string()))?;
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let mut services = BTreeMap::new();
        for service in DirectoryService::ALL {
            if let Some(resolved) = config.resolve(service) {
                services
                    .insert(service, ServiceClient::new(&resolved, connect_timeout, request_timeout)?);
            }
        }
        Ok(Self {
            services,
        })
    }

    /// Returns true when the service has a transport.
    #[must_use]
    pub fn is_configured(&self, service: DirectoryService) -> bool {
        self.services.contains_key(&service)
    }

    /// Returns the transport for a service.
    pub(crate) fn service(&self, service: DirectoryService) -> Result<&ServiceClient, DirectoryError> {
        self.services.get(&service).ok_or(DirectoryError::NotConfigured(service))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Appends query pairs, skipping empty values.
pub(crate) fn append_query(url: &mut Url, pairs: &[(&str, &str)]) {
    if pairs.iter().all(|(_, value)| value.is_empty()) {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (key, value) in pairs.iter().filter(|(_, value)| !value.is_empty()) {
        query.append_pair(key, value);
    }
}

/// Decodes a JSON response body.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    response.json::<T>().await.map_err(|err| DirectoryError::Decode(err.to_string()))
}

/// Parses the service URL, defaulting the scheme to `https`.
fn parse_base_url(raw: &str) -> Result<Url, DirectoryError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let absolute =
        if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    Url::parse(&absolute).map_err(|err| DirectoryError::Init(format!("invalid directory url: {err}")))
}

/// Builds the tenant and basic-credential headers.
fn auth_headers(tenant_id: &str, api_key: &str) -> Result<HeaderMap, DirectoryError> {
    let mut headers = HeaderMap::new();
    let tenant = HeaderValue::from_str(tenant_id)
        .map_err(|_| DirectoryError::Invalid("invalid tenant id".to_string()))?;
    headers.insert(TENANT_HEADER, tenant);
    let mut credential = HeaderValue::from_str(&format!("basic {api_key}"))
        .map_err(|_| DirectoryError::Invalid("invalid api key".to_string()))?;
    credential.set_sensitive(true);
    headers.insert(AUTHORIZATION, credential);
    Ok(headers)
}

/// Loads a PEM root certificate.
fn load_certificate(path: &Path) -> Result<Certificate, DirectoryError> {
    let metadata = fs::metadata(path).map_err(|err| DirectoryError::Init(err.to_string()))?;
    if !metadata.is_file() {
        return Err(DirectoryError::Init(format!("cert path is not a file: {}", path.display())));
    }
    if metadata.len() > MAX_CERT_BYTES {
        return Err(DirectoryError::Init("cert file exceeds size limit".to_string()));
    }
    let pem = fs::read(path).map_err(|err| DirectoryError::Init(err.to_string()))?;
    Certificate::from_pem(&pem).map_err(|err| DirectoryError::Init(err.to_string()))
}
