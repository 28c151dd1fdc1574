// crates/authz-gate-directory/src/exporter.rs
// ============================================================================
// Module: Directory Exporter
// Description: Bulk export of objects and relations.
// Purpose: Read the whole directory back as typed records.
// Dependencies: client, types, serde_json
// ============================================================================

//! ## Overview
//! The request is a single JSON object; the exporter answers with NDJSON
//! lines, each holding either an `object` or a `relation`. The requested data
//! type is a bitmask: objects `0x8`, relations `0x10`, both `0x18`.

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

/// Data selected for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDataType {
    /// Objects only.
    Objects,
    /// Relations only.
    Relations,
    /// Objects and relations.
    All,
}

impl ExportDataType {
    /// Returns the wire bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Objects => 0x8,
            Self::Relations => 0x10,
            Self::All => 0x18,
        }
    }
}

/// One exported record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportRecord {
    /// Exported object.
    Object(Object),
    /// Exported relation.
    Relation(Relation),
}

/// Export request body.
#[derive(Serialize)]
struct ExportBody {
    /// Data type bitmask.
    options: u32,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl DirectoryClient {
    /// Exports the selected data.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the request fails or a record cannot
    /// be decoded.
    pub async fn export(
        &self,
        data_type: ExportDataType,
    ) -> Result<Vec<ExportRecord>, DirectoryError> {
        let exporter = self.service(DirectoryService::Exporter)?;
        let url = exporter.endpoint(&["export"])?;
        let body = ExportBody {
            options: data_type.bits(),
        };
        let response = exporter.post_for_text(url, &body).await?;
        parse_records(&response)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses NDJSON export lines, skipping blanks.
fn parse_records(response: &str) -> Result<Vec<ExportRecord>, DirectoryError> {
    response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|err| DirectoryError::Decode(err.to_string()))
        })
        .collect()
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

    use super::*;

    #[test]
    fn bitmask_values() {
        assert_eq!(ExportDataType::Objects.bits(), 8);
        assert_eq!(ExportDataType::Relations.bits(), 16);
        assert_eq!(ExportDataType::All.bits(), ExportDataType::Objects.bits() | 0x10);
    }

    #[test]
    fn records_parse_by_kind() {
        let response = concat!(
            "{\"object\":{\"type\":\"user\",\"id\":\"beth\",\"display_name\":\"Beth\"}}\n",
            "\n",
            "{\"relation\":{\"object_type\":\"group\",\"object_id\":\"admins\",",
            "\"relation\":\"member\",\"subject_type\":\"user\",\"subject_id\":\"beth\"}}\n",
        );
        let records = parse_records(response).unwrap();
        assert_eq!(records.len(), 2);
        match &records[0] {
            ExportRecord::Object(object) => assert_eq!(object.display_name, "Beth"),
            ExportRecord::Relation(_) => panic!("expected object"),
        }
        assert_eq!(
            records[1],
            ExportRecord::Relation(Relation::new(("group", "admins"), "member", ("user", "beth")))
        );
    }

    #[test]
    fn unknown_record_kind_is_a_decode_error() {
        let err = parse_records("{\"manifest\":{}}\n").unwrap_err();
        assert!(matches!(err, DirectoryError::Decode(_)));
    }
}
