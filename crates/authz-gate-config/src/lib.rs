// crates/authz-gate-config/src/lib.rs
// ============================================================================
// Module: Authz Gate Config Library
// Description: Canonical config model and validation for Authz Gate.
// Purpose: Single source of truth for authz-gate.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `authz-gate-config` defines the configuration model shared by the
//! authorization gate and the directory client. Configuration is constructed
//! once at startup, validated fail-closed, and then shared read-only.
//!
//! Security posture: config inputs are untrusted and secrets (API keys) must
//! never be echoed back in error messages.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod directory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use directory::DirectoryConfig;
pub use directory::DirectoryService;
pub use directory::DirectoryServiceConfig;
pub use directory::ResolvedServiceConfig;
