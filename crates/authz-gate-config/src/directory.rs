// crates/authz-gate-config/src/directory.rs
// ============================================================================
// Module: Directory Configuration
// Description: Connection settings for the directory service clients.
// Purpose: Resolve per-service settings with fallback to base settings.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The directory exposes five services (reader, writer, importer, exporter,
//! model). Each may carry its own connection settings; unset fields fall back
//! to the base settings. A service whose effective URL, API key or tenant is
//! empty is left unconfigured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::config::validate_path_string;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default directory endpoint.
pub const DEFAULT_DIRECTORY_URL: &str = "https://directory.prod.aserto.com:8443";
/// Default directory connect timeout in milliseconds.
const DEFAULT_DIRECTORY_CONNECT_TIMEOUT_MS: u64 = 2_000;
/// Default directory request timeout in milliseconds.
const DEFAULT_DIRECTORY_REQUEST_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Directory service selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DirectoryService {
    /// Object and relation queries.
    Reader,
    /// Object and relation mutations.
    Writer,
    /// Bulk import.
    Importer,
    /// Bulk export.
    Exporter,
    /// Manifest management.
    Model,
}

impl DirectoryService {
    /// All services in a stable order.
    pub const ALL: [Self; 5] =
        [Self::Reader, Self::Writer, Self::Importer, Self::Exporter, Self::Model];

    /// Returns a stable label for the service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Writer => "writer",
            Self::Importer => "importer",
            Self::Exporter => "exporter",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for DirectoryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base directory URL.
    #[serde(default = "default_directory_url")]
    pub url: String,
    /// Base API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base tenant identifier.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Base PEM root certificate path.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_directory_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_directory_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Reader overrides.
    #[serde(default)]
    pub reader: Option<DirectoryServiceConfig>,
    /// Writer overrides.
    #[serde(default)]
    pub writer: Option<DirectoryServiceConfig>,
    /// Importer overrides.
    #[serde(default)]
    pub importer: Option<DirectoryServiceConfig>,
    /// Exporter overrides.
    #[serde(default)]
    pub exporter: Option<DirectoryServiceConfig>,
    /// Model overrides.
    #[serde(default)]
    pub model: Option<DirectoryServiceConfig>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_directory_url(),
            api_key: None,
            tenant_id: None,
            cert_path: None,
            connect_timeout_ms: DEFAULT_DIRECTORY_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_DIRECTORY_REQUEST_TIMEOUT_MS,
            reader: None,
            writer: None,
            importer: None,
            exporter: None,
            model: None,
        }
    }
}

/// Per-service overrides. Unset fields inherit the base settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryServiceConfig {
    /// Service URL override.
    #[serde(default)]
    pub url: Option<String>,
    /// API key override.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Tenant override.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Root certificate override.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
}

/// Effective settings for one directory service.
///
/// # Invariants
/// - `url`, `api_key` and `tenant_id` are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServiceConfig {
    /// Service URL.
    pub url: String,
    /// API key.
    pub api_key: String,
    /// Tenant identifier.
    pub tenant_id: String,
    /// Optional PEM root certificate path.
    pub cert_path: Option<PathBuf>,
}

impl DirectoryConfig {
    /// Returns the overrides for a service, if any.
    #[must_use]
    pub const fn overrides(&self, service: DirectoryService) -> Option<&DirectoryServiceConfig> {
        match service {
            DirectoryService::Reader => self.reader.as_ref(),
            DirectoryService::Writer => self.writer.as_ref(),
            DirectoryService::Importer => self.importer.as_ref(),
            DirectoryService::Exporter => self.exporter.as_ref(),
            DirectoryService::Model => self.model.as_ref(),
        }
    }

    /// Resolves the effective settings for a service.
    ///
    /// Returns `None` when the effective URL, API key or tenant is empty.
    #[must_use]
    pub fn resolve(&self, service: DirectoryService) -> Option<ResolvedServiceConfig> {
        let overrides = self.overrides(service);
        let url = overrides.and_then(|o| o.url.clone()).unwrap_or_else(|| self.url.clone());
        let api_key = overrides.and_then(|o| o.api_key.clone()).or_else(|| self.api_key.clone());
        let tenant_id =
            overrides.and_then(|o| o.tenant_id.clone()).or_else(|| self.tenant_id.clone());
        let cert_path =
            overrides.and_then(|o| o.cert_path.clone()).or_else(|| self.cert_path.clone());
        let api_key = api_key.filter(|key| !key.trim().is_empty())?;
        let tenant_id = tenant_id.filter(|tenant| !tenant.trim().is_empty())?;
        if url.trim().is_empty() {
            return None;
        }
        Some(ResolvedServiceConfig {
            url,
            api_key,
            tenant_id,
            cert_path,
        })
    }

    /// Validates the directory configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a timeout or path is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "directory timeouts must be greater than zero".to_string(),
            ));
        }
        if let Some(cert_path) = &self.cert_path {
            validate_path_string("directory.cert_path", &cert_path.to_string_lossy())?;
        }
        for service in DirectoryService::ALL {
            if let Some(cert_path) = self.overrides(service).and_then(|o| o.cert_path.as_ref()) {
                validate_path_string(
                    &format!("directory.{service}.cert_path"),
                    &cert_path.to_string_lossy(),
                )?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default directory URL.
fn default_directory_url() -> String {
    DEFAULT_DIRECTORY_URL.to_string()
}

/// Default directory connect timeout.
const fn default_directory_connect_timeout_ms() -> u64 {
    DEFAULT_DIRECTORY_CONNECT_TIMEOUT_MS
}

/// Default directory request timeout.
const fn default_directory_request_timeout_ms() -> u64 {
    DEFAULT_DIRECTORY_REQUEST_TIMEOUT_MS
}
