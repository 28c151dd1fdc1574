// crates/authz-gate-directory/src/lib.rs
// ============================================================================
// Module: Authz Gate Directory
// Description: Typed client for the directory service.
// Purpose: Query and maintain directory objects, relations and the manifest.
// Dependencies: authz-gate-config, reqwest, serde
// ============================================================================

//! ## Overview
//! The directory is split into five services (reader, writer, importer,
//! exporter, model), each configured independently with fallback to the base
//! settings. [`DirectoryClient`] exposes every operation as an async method;
//! failures propagate as [`DirectoryError`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod exporter;
pub mod importer;
pub mod model;
pub mod reader;
pub mod types;
pub mod writer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use authz_gate_config::DirectoryConfig;
pub use authz_gate_config::DirectoryService;
pub use client::DirectoryClient;
pub use client::DirectoryError;
pub use exporter::ExportDataType;
pub use exporter::ExportRecord;
pub use importer::ImportCounter;
pub use importer::ImportMessage;
pub use importer::ImportOp;
pub use importer::ImportRecord;
pub use importer::ImportSummary;
pub use model::Manifest;
pub use reader::CheckRequest;
pub use reader::CheckResult;
pub use reader::GraphRequest;
pub use reader::GraphResult;
pub use reader::ObjectsPage;
pub use reader::RelationQuery;
pub use reader::RelationResult;
pub use reader::RelationsPage;
pub use types::DEFAULT_PAGE_SIZE;
pub use types::Object;
pub use types::ObjectIdentifier;
pub use types::PageRequest;
pub use types::PageResponse;
pub use types::Relation;
