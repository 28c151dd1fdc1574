// crates/authz-gate-directory/src/model.rs
// ============================================================================
// Module: Directory Model
// Description: Manifest retrieval and replacement.
// Purpose: Manage the schema document of the directory.
// Dependencies: client, base64
// ============================================================================

//! ## Overview
//! The gateway carries manifest bytes as standard base64 inside
//! `body.data`; [`Manifest::body`] holds the decoded UTF-8 document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use authz_gate_config::DirectoryService;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::client::DirectoryClient;
use crate::client::DirectoryError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Directory manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Manifest document.
    pub body: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
    /// Optimistic concurrency tag.
    pub etag: Option<String>,
}

/// Manifest metadata on the wire.
#[derive(Default, Deserialize)]
struct ManifestMetadata {
    /// Update timestamp.
    #[serde(default)]
    updated_at: Option<String>,
    /// Etag.
    #[serde(default)]
    etag: Option<String>,
}

/// Manifest body on the wire.
#[derive(Default, Serialize, Deserialize)]
struct ManifestBody {
    /// Base64 document bytes.
    #[serde(default)]
    data: String,
}

/// `get_manifest` response.
#[derive(Deserialize)]
struct GetManifestResponse {
    /// Metadata.
    #[serde(default)]
    metadata: ManifestMetadata,
    /// Body.
    #[serde(default)]
    body: ManifestBody,
}

/// `set_manifest` request.
#[derive(Serialize)]
struct SetManifestRequest {
    /// Body.
    body: ManifestBody,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl DirectoryClient {
    /// Fetches the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no manifest is stored and
    /// [`DirectoryError::Decode`] when the body is not base64 UTF-8.
    pub async fn get_manifest(&self) -> Result<Manifest, DirectoryError> {
        let model = self.service(DirectoryService::Model)?;
        let url = model.endpoint(&["manifest"])?;
        let response: GetManifestResponse = model.get(url).await?;
        let bytes = STANDARD
            .decode(response.body.data.as_bytes())
            .map_err(|err| DirectoryError::Decode(format!("manifest body: {err}")))?;
        let body = String::from_utf8(bytes)
            .map_err(|err| DirectoryError::Decode(format!("manifest body: {err}")))?;
        Ok(Manifest {
            body,
            updated_at: response.metadata.updated_at,
            etag: response.metadata.etag,
        })
    }

    /// Replaces the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn set_manifest(&self, body: &str) -> Result<(), DirectoryError> {
        let model = self.service(DirectoryService::Model)?;
        let url = model.endpoint(&["manifest"])?;
        let request = SetManifestRequest {
            body: ManifestBody {
                data: STANDARD.encode(body.as_bytes()),
            },
        };
        let _: Value = model.post(url, &request).await?;
        Ok(())
    }
}
