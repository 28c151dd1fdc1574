// crates/authz-gate-core/src/audit.rs
// ============================================================================
// Module: Authorization Audit Logging
// Description: Structured audit events for gate and decision handling.
// Purpose: Emit JSON-line events without a hard logging dependency.
// Dependencies: authz-gate-config, serde
// ============================================================================

//! ## Overview
//! Every authorization outcome worth observing is reported as an
//! [`AuthzAuditEvent`] to an [`AuditSink`]. Sinks serialize events as JSON
//! lines; deployments route them to their own pipeline by implementing the
//! trait. [`LevelFilter`] drops events below a configured [`LogLevel`].
//!
//! Identity values are never recorded; events carry the identity type only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use authz_gate_config::LogLevel;
use serde::Serialize;

// ============================================================================
// SECTION: Event Kinds
// ============================================================================

/// Audit event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// Gate skipped the authorizer (disabled or disable rule matched).
    AuthzSkipped,
    /// Authorizer returned a decision.
    AuthzDecision,
    /// Authorizer call failed; the request was denied.
    AuthorizerError,
    /// Resource mapping failed; the request was denied.
    ResourceMappingError,
    /// Identity token could not be decoded.
    IdentityTokenInvalid,
}

impl AuditEventKind {
    /// Returns the level this kind is emitted at.
    #[must_use]
    pub const fn level(self) -> LogLevel {
        match self {
            Self::AuthzSkipped | Self::IdentityTokenInvalid => LogLevel::Debug,
            Self::AuthzDecision => LogLevel::Info,
            Self::ResourceMappingError => LogLevel::Warn,
            Self::AuthorizerError => LogLevel::Error,
        }
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Authorization audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthzAuditEvent {
    /// Event identifier.
    pub event: AuditEventKind,
    /// Event level.
    pub level: LogLevel,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// HTTP method of the request.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Policy path when one was derived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_path: Option<String>,
    /// Decision name when one was queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Decision outcome when one was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<bool>,
    /// Identity type transport code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_type: Option<&'static str>,
    /// Error message for failure events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthzAuditEvent {
    /// Creates an event for a request with a consistent timestamp.
    #[must_use]
    pub fn new(event: AuditEventKind, method: &str, path: &str) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            level: event.level(),
            timestamp_ms,
            method: method.to_string(),
            path: path.to_string(),
            policy_path: None,
            decision: None,
            allowed: None,
            identity_type: None,
            error: None,
        }
    }

    /// Attaches the policy path.
    #[must_use]
    pub fn with_policy_path(mut self, policy_path: impl Into<String>) -> Self {
        self.policy_path = Some(policy_path.into());
        self
    }

    /// Attaches the decision name and, when known, its outcome.
    #[must_use]
    pub fn with_decision(mut self, decision: impl Into<String>, allowed: Option<bool>) -> Self {
        self.decision = Some(decision.into());
        self.allowed = allowed;
        self
    }

    /// Attaches the identity type code.
    #[must_use]
    pub const fn with_identity_type(mut self, identity_type: &'static str) -> Self {
        self.identity_type = Some(identity_type);
        self
    }

    /// Attaches an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for authorization events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &AuthzAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuthzAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Open log file.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens a file-backed audit sink in append mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuthzAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthzAuditEvent) {}
}

/// Sink wrapper dropping events below a minimum level.
pub struct LevelFilter {
    /// Minimum level forwarded.
    min_level: LogLevel,
    /// Wrapped sink.
    inner: Arc<dyn AuditSink>,
}

impl LevelFilter {
    /// Wraps a sink with a minimum level.
    #[must_use]
    pub fn new(min_level: LogLevel, inner: Arc<dyn AuditSink>) -> Self {
        Self {
            min_level,
            inner,
        }
    }
}

impl AuditSink for LevelFilter {
    fn record(&self, event: &AuthzAuditEvent) {
        if event.level >= self.min_level {
            self.inner.record(event);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
