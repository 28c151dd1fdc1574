// crates/authz-gate-directory/src/types.rs
// ============================================================================
// Module: Directory Types
// Description: Objects, relations, and pagination shared by every service.
// Purpose: Typed JSON shapes of the directory gateway.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Wire types shared across services. Optional timestamps and etags are
//! populated by the directory and omitted from requests when empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ============================================================================
// SECTION: Objects and Relations
// ============================================================================

/// Directory object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object type.
    #[serde(rename = "type")]
    pub object_type: String,
    /// Object identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    /// Free-form properties.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Creation timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Update timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Optimistic concurrency tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
}

impl Object {
    /// Builds an object with only type and id set.
    #[must_use]
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Directory relation between an object and a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
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
    /// Subject relation for usersets.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject_relation: String,
    /// Creation timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Update timestamp (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Optimistic concurrency tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
}

impl Relation {
    /// Builds a relation between an object and a subject.
    #[must_use]
    pub fn new(
        object: (&str, &str),
        relation: impl Into<String>,
        subject: (&str, &str),
    ) -> Self {
        Self {
            object_type: object.0.to_string(),
            object_id: object.1.to_string(),
            relation: relation.into(),
            subject_type: subject.0.to_string(),
            subject_id: subject.1.to_string(),
            ..Self::default()
        }
    }
}

/// Object type and id pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    /// Object type.
    pub object_type: String,
    /// Object identifier.
    pub object_id: String,
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

/// Page selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum results per page.
    pub size: u32,
    /// Continuation token from a previous page.
    pub token: String,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            token: String::new(),
        }
    }
}

impl PageRequest {
    /// Returns the page following a continuation token.
    #[must_use]
    pub fn after(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }
}

/// Page metadata returned with list results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Token for the next page; empty on the last page.
    #[serde(default)]
    pub next_token: String,
}

impl PageResponse {
    /// Returns true when more results are available.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.next_token.is_empty()
    }
}
