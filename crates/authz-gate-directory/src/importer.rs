// crates/authz-gate-directory/src/importer.rs
// ============================================================================
// Module: Directory Importer
// Description: Bulk import of op-coded objects and relations.
// Purpose: Stream many writes to the directory in one request.
// Dependencies: client, types, serde_json
// ============================================================================

//! ## Overview
//! Each [`ImportRecord`] becomes one NDJSON line of the form
//! `{"op_code": N, "object": {...}}` or `{"op_code": N, "relation": {...}}`.
//! The importer answers with NDJSON progress lines; their counters are summed
//! into an [`ImportSummary`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use authz_gate_config::DirectoryService;
use serde::Deserialize;
use serde::Serialize;

use crate::client::DirectoryClient;
use crate::client::DirectoryError;
use crate::types::Object;
use crate::types::Relation;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOp {
    /// Create or update.
    Set,
    /// Delete.
    Delete,
    /// Delete an object together with its relations.
    DeleteWithRelations,
}

impl ImportOp {
    /// Returns the wire op code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Set => 1,
            Self::Delete => 2,
            Self::DeleteWithRelations => 3,
        }
    }
}

/// Payload of one import record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMessage {
    /// Object payload.
    Object(Object),
    /// Relation payload.
    Relation(Relation),
}

/// One op-coded import record.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    /// Operation.
    pub op: ImportOp,
    /// Payload.
    pub msg: ImportMessage,
}

impl ImportRecord {
    /// Sets an object.
    #[must_use]
    pub const fn set_object(object: Object) -> Self {
        Self {
            op: ImportOp::Set,
            msg: ImportMessage::Object(object),
        }
    }

    /// Sets a relation.
    #[must_use]
    pub const fn set_relation(relation: Relation) -> Self {
        Self {
            op: ImportOp::Set,
            msg: ImportMessage::Relation(relation),
        }
    }
}

/// Wire line for one record.
#[derive(Serialize)]
struct ImportLine<'a> {
    /// Operation code.
    op_code: u8,
    /// Payload keyed by kind.
    #[serde(flatten)]
    msg: &'a ImportMessage,
}

/// Per-kind import counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ImportCounter {
    /// Records received.
    #[serde(default)]
    pub recv: u64,
    /// Records set.
    #[serde(default)]
    pub set: u64,
    /// Records deleted.
    #[serde(default)]
    pub delete: u64,
    /// Records that failed.
    #[serde(default)]
    pub error: u64,
}

impl ImportCounter {
    /// Adds another counter into this one.
    fn add(&mut self, other: &Self) {
        self.recv += other.recv;
        self.set += other.set;
        self.delete += other.delete;
        self.error += other.error;
    }
}

/// Import totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ImportSummary {
    /// Object counters.
    #[serde(default)]
    pub objects: ImportCounter,
    /// Relation counters.
    #[serde(default)]
    pub relations: ImportCounter,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl DirectoryClient {
    /// Imports records in order.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails or a progress line
    /// cannot be decoded.
    pub async fn import(&self, records: &[ImportRecord]) -> Result<ImportSummary, DirectoryError> {
        let importer = self.service(DirectoryService::Importer)?;
        let url = importer.endpoint(&["import"])?;
        let body = encode_records(records)?;
        let response = importer.post_ndjson(url, body).await?;
        summarize(&response)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes records as NDJSON.
fn encode_records(records: &[ImportRecord]) -> Result<String, DirectoryError> {
    let mut body = String::new();
    for record in records {
        let line = serde_json::to_string(&ImportLine {
            op_code: record.op.code(),
            msg: &record.msg,
        })
        .map_err(|err| DirectoryError::Invalid(err.to_string()))?;
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

/// Sums NDJSON progress lines.
fn summarize(response: &str) -> Result<ImportSummary, DirectoryError> {
    let mut summary = ImportSummary::default();
    for line in response.lines().filter(|line| !line.trim().is_empty()) {
        let progress: ImportSummary =
            serde_json::from_str(line).map_err(|err| DirectoryError::Decode(err.to_string()))?;
        summary.objects.add(&progress.objects);
        summary.relations.add(&progress.relations);
    }
    Ok(summary)
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

    use serde_json::Value;
    use serde_json::json;

    use super::*;

    #[test]
    fn records_encode_with_op_codes() {
        let records = vec![
            ImportRecord::set_object(Object::new("user", "beth")),
            ImportRecord {
                op: ImportOp::DeleteWithRelations,
                msg: ImportMessage::Object(Object::new("group", "admins")),
            },
            ImportRecord {
                op: ImportOp::Delete,
                msg: ImportMessage::Relation(Relation::new(
                    ("group", "admins"),
                    "member",
                    ("user", "beth"),
                )),
            },
        ];
        let body = encode_records(&records).unwrap();
        let lines: Vec<Value> =
            body.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], json!({"op_code": 1, "object": {"type": "user", "id": "beth"}}));
        assert_eq!(lines[1]["op_code"], json!(3));
        assert_eq!(lines[2]["op_code"], json!(2));
        assert_eq!(lines[2]["relation"]["relation"], json!("member"));
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn progress_lines_are_summed() {
        let response = concat!(
            "{\"objects\":{\"recv\":2,\"set\":2}}\n",
            "\n",
            "{\"relations\":{\"recv\":1,\"delete\":1},\"objects\":{\"error\":1}}\n",
        );
        let summary = summarize(response).unwrap();
        assert_eq!(summary.objects.recv, 2);
        assert_eq!(summary.objects.set, 2);
        assert_eq!(summary.objects.error, 1);
        assert_eq!(summary.relations.recv, 1);
        assert_eq!(summary.relations.delete, 1);
    }

    #[test]
    fn malformed_progress_line_is_a_decode_error() {
        let err = summarize("not json\n").unwrap_err();
        assert!(matches!(err, DirectoryError::Decode(_)));
    }
}
