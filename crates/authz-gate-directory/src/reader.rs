// crates/authz-gate-directory/src/reader.rs
// ============================================================================
// Module: Directory Reader
// Description: Object, relation, check, and graph queries.
// Purpose: Read-side operations of the directory client.
// Dependencies: client, types
// ============================================================================

//! ## Overview
//! Reader operations issue `GET` requests for lookups and `POST` requests for
//! checks. Empty filter fields are omitted from query strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use authz_gate_config::DirectoryService;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::client::DirectoryClient;
use crate::client::DirectoryError;
use crate::client::append_query;
use crate::types::Object;
use crate::types::ObjectIdentifier;
use crate::types::PageRequest;
use crate::types::PageResponse;
use crate::types::Relation;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Relation lookup filter. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationQuery {
    /// Object type.
    pub object_type: String,
    /// Object identifier.
    pub object_id: String,
    /// Relation name.
    pub relation: String,
    /// Subject type.
    pub subject_type: String,
    /// Subject identifier.
    pub subject_id: String,
    /// Subject relation.
    pub subject_relation: String,
    /// Include the related objects in the response.
    pub with_objects: bool,
}

impl RelationQuery {
    /// Appends the filter to a URL query.
    pub(crate) fn append_to(&self, url: &mut Url) {
        let with_objects = if self.with_objects { "true" } else { "" };
        append_query(
            url,
            &[
                ("object_type", &self.object_type),
                ("object_id", &self.object_id),
                ("relation", &self.relation),
                ("subject_type", &self.subject_type),
                ("subject_id", &self.subject_id),
                ("subject_relation", &self.subject_relation),
                ("with_objects", with_objects),
            ],
        );
    }
}

/// Check request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    /// Object type.
    pub object_type: String,
    /// Object identifier.
    pub object_id: String,
    /// Relation or permission name.
    pub relation: String,
    /// Subject type.
    pub subject_type: String,
    /// Subject identifier.
    pub subject_id: String,
    /// Return an evaluation trace.
    pub trace: bool,
}

/// Permission check body; the relation travels as `permission`.
#[derive(Serialize)]
struct PermissionBody<'a> {
    /// Object type.
    object_type: &'a str,
    /// Object identifier.
    object_id: &'a str,
    /// Permission name.
    permission: &'a str,
    /// Subject type.
    subject_type: &'a str,
    /// Subject identifier.
    subject_id: &'a str,
    /// Return an evaluation trace.
    trace: bool,
}

/// Graph traversal request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphRequest {
    /// Object type.
    pub object_type: String,
    /// Object identifier; empty to search objects.
    pub object_id: String,
    /// Relation name.
    pub relation: String,
    /// Subject type.
    pub subject_type: String,
    /// Subject identifier; empty to search subjects.
    pub subject_id: String,
    /// Subject relation.
    pub subject_relation: String,
    /// Return an explanation of each result.
    pub explain: bool,
    /// Return an evaluation trace.
    pub trace: bool,
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Single object envelope.
#[derive(Deserialize)]
struct ObjectEnvelope {
    /// Object.
    result: Object,
}

/// Object list page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObjectsPage {
    /// Objects on this page.
    #[serde(default)]
    pub results: Vec<Object>,
    /// Page metadata.
    #[serde(default)]
    pub page: PageResponse,
}

/// Single relation result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationResult {
    /// Relation.
    pub result: Relation,
    /// Related objects keyed by `type:id` when requested.
    #[serde(default)]
    pub objects: BTreeMap<String, Object>,
}

/// Relation list page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelationsPage {
    /// Relations on this page.
    #[serde(default)]
    pub results: Vec<Relation>,
    /// Related objects keyed by `type:id` when requested.
    #[serde(default)]
    pub objects: BTreeMap<String, Object>,
    /// Page metadata.
    #[serde(default)]
    pub page: PageResponse,
}

/// Check outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckResult {
    /// Verdict.
    #[serde(default)]
    pub check: bool,
    /// Evaluation trace when requested.
    #[serde(default)]
    pub trace: Vec<String>,
    /// Additional context returned by the directory.
    #[serde(default)]
    pub context: Option<Value>,
}

/// Graph traversal outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphResult {
    /// Matching objects or subjects.
    #[serde(default)]
    pub results: Vec<ObjectIdentifier>,
    /// Explanation when requested.
    #[serde(default)]
    pub explanation: Option<Value>,
    /// Evaluation trace when requested.
    #[serde(default)]
    pub trace: Vec<String>,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl DirectoryClient {
    /// Fetches one object.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when the object does not exist.
    pub async fn get_object(
        &self,
        object_type: &str,
        object_id: &str,
    ) -> Result<Object, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let url = reader.endpoint(&["object", object_type, object_id])?;
        let envelope: ObjectEnvelope = reader.get(url).await?;
        Ok(envelope.result)
    }

    /// Lists objects of a type.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn get_objects(
        &self,
        object_type: &str,
        page: &PageRequest,
    ) -> Result<ObjectsPage, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let mut url = reader.endpoint(&["objects"])?;
        let size = page.size.to_string();
        append_query(
            &mut url,
            &[("object_type", object_type), ("page.size", &size), ("page.token", &page.token)],
        );
        reader.get(url).await
    }

    /// Fetches one relation.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no relation matches.
    pub async fn get_relation(
        &self,
        query: &RelationQuery,
    ) -> Result<RelationResult, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let mut url = reader.endpoint(&["relation"])?;
        query.append_to(&mut url);
        reader.get(url).await
    }

    /// Lists relations matching a filter.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn get_relations(
        &self,
        query: &RelationQuery,
        page: &PageRequest,
    ) -> Result<RelationsPage, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let mut url = reader.endpoint(&["relations"])?;
        query.append_to(&mut url);
        let size = page.size.to_string();
        append_query(&mut url, &[("page.size", &size), ("page.token", &page.token)]);
        reader.get(url).await
    }

    /// Checks a relation or permission.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResult, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let url = reader.endpoint(&["check"])?;
        reader.post(url, request).await
    }

    /// Checks a direct relation.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn check_relation(
        &self,
        request: &CheckRequest,
    ) -> Result<CheckResult, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let url = reader.endpoint(&["check", "relation"])?;
        reader.post(url, request).await
    }

    /// Checks a permission; `request.relation` names the permission.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn check_permission(
        &self,
        request: &CheckRequest,
    ) -> Result<CheckResult, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let url = reader.endpoint(&["check", "permission"])?;
        let body = PermissionBody {
            object_type: &request.object_type,
            object_id: &request.object_id,
            permission: &request.relation,
            subject_type: &request.subject_type,
            subject_id: &request.subject_id,
            trace: request.trace,
        };
        reader.post(url, &body).await
    }

    /// Traverses the relation graph.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn get_graph(&self, request: &GraphRequest) -> Result<GraphResult, DirectoryError> {
        let reader = self.service(DirectoryService::Reader)?;
        let mut url = reader.endpoint(&[
            "graph",
            &request.object_type,
            &request.relation,
            &request.subject_type,
        ])?;
        append_query(
            &mut url,
            &[
                ("object_id", &request.object_id),
                ("subject_id", &request.subject_id),
                ("subject_relation", &request.subject_relation),
                ("explain", if request.explain { "true" } else { "" }),
                ("trace", if request.trace { "true" } else { "" }),
            ],
        );
        reader.get(url).await
    }
}
