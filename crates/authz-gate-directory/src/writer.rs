// crates/authz-gate-directory/src/writer.rs
// ============================================================================
// Module: Directory Writer
// Description: Object and relation mutations.
// Purpose: Write-side operations of the directory client.
// Dependencies: client, reader, types
// ============================================================================

//! ## Overview
//! Writes return the stored object or relation, including the etag assigned
//! by the directory. Passing a stored etag back makes the write conditional.

// ============================================================================
// SECTION: Imports
// ============================================================================

use authz_gate_config::DirectoryService;
use serde::Deserialize;
use serde::Serialize;

use crate::client::DirectoryClient;
use crate::client::DirectoryError;
use crate::client::append_query;
use crate::reader::RelationQuery;
use crate::types::Object;
use crate::types::Relation;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// `set_object` request body.
#[derive(Serialize)]
struct SetObjectBody<'a> {
    /// Object to store.
    object: &'a Object,
}

/// `set_relation` request body.
#[derive(Serialize)]
struct SetRelationBody<'a> {
    /// Relation to store.
    relation: &'a Relation,
}

/// Write response envelope.
#[derive(Deserialize)]
struct ResultEnvelope<T> {
    /// Stored value.
    result: T,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl DirectoryClient {
    /// Creates or updates an object.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails or the etag is stale.
    pub async fn set_object(&self, object: &Object) -> Result<Object, DirectoryError> {
        let writer = self.service(DirectoryService::Writer)?;
        let url = writer.endpoint(&["object"])?;
        let envelope: ResultEnvelope<Object> = writer
            .post(
                url,
                &SetObjectBody {
                    object,
                },
            )
            .await?;
        Ok(envelope.result)
    }

    /// Deletes an object, optionally with every relation that references it.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn delete_object(
        &self,
        object_type: &str,
        object_id: &str,
        with_relations: bool,
    ) -> Result<(), DirectoryError> {
        let writer = self.service(DirectoryService::Writer)?;
        let mut url = writer.endpoint(&["object", object_type, object_id])?;
        append_query(&mut url, &[("with_relations", if with_relations { "true" } else { "" })]);
        writer.delete(url).await
    }

    /// Creates or updates a relation.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails or the etag is stale.
    pub async fn set_relation(&self, relation: &Relation) -> Result<Relation, DirectoryError> {
        let writer = self.service(DirectoryService::Writer)?;
        let url = writer.endpoint(&["relation"])?;
        let envelope: ResultEnvelope<Relation> = writer
            .post(
                url,
                &SetRelationBody {
                    relation,
                },
            )
            .await?;
        Ok(envelope.result)
    }

    /// Deletes the relation identified by the query.
    ///
    /// `with_objects` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails.
    pub async fn delete_relation(&self, query: &RelationQuery) -> Result<(), DirectoryError> {
        let writer = self.service(DirectoryService::Writer)?;
        let mut url = writer.endpoint(&["relation"])?;
        RelationQuery {
            with_objects: false,
            ..query.clone()
        }
        .append_to(&mut url);
        writer.delete(url).await
    }
}
