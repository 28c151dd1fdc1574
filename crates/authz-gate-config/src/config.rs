// crates/authz-gate-config/src/config.rs
// ============================================================================
// Module: Authz Gate Configuration
// Description: Configuration loading and validation for the authorization gate.
// Purpose: Provide strict, fail-closed config parsing with aggregated errors.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file (or built programmatically) and
//! validated once before the gate is constructed. Required options that are
//! missing are reported together so operators can fix them in one pass.
//! Security posture: config inputs are untrusted; validation fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::directory::DirectoryConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "authz-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "AUTHZ_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of per-route disable rules.
pub(crate) const MAX_DISABLE_RULES: usize = 1024;
/// Default authorizer endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://authorizer.prod.aserto.com:8443";
/// Default decision evaluated by the gate.
pub const DEFAULT_DECISION: &str = "allowed";
/// Default policy path used by relationship checks.
pub const DEFAULT_CHECK_POLICY_PATH: &str = "rebac.check";
/// Default authorizer connect timeout in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
/// Default authorizer request timeout in milliseconds.
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
/// Minimum connect timeout in milliseconds.
pub(crate) const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Authorization gate configuration.
///
/// # Invariants
/// - After [`AuthzConfig::validate`] succeeds, `service_url`, `policy_root`,
///   `tenant_id` and `authorizer_api_key` are non-empty.
/// - The struct is read-only once shared with the gate.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    /// Authorizer endpoint URL.
    #[serde(default = "default_service_url")]
    pub service_url: String,
    /// API key sent as `basic <key>` authorization.
    #[serde(default)]
    pub authorizer_api_key: String,
    /// Tenant identifier sent with every authorizer call.
    #[serde(default)]
    pub tenant_id: String,
    /// Root package prefixed to every derived policy path.
    #[serde(default)]
    pub policy_root: String,
    /// Optional policy instance name.
    #[serde(default)]
    pub policy_name: Option<String>,
    /// Optional policy instance label (defaults to `policy_name`).
    #[serde(default)]
    pub policy_instance_label: Option<String>,
    /// Decision evaluated by the gate.
    #[serde(default = "default_decision")]
    pub decision: String,
    /// Global enable flag.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-route rules that suppress authorization.
    #[serde(default)]
    pub disabled_for: Vec<DisableRule>,
    /// Identity extraction strategy.
    #[serde(default)]
    pub identity_mapping: IdentityMappingConfig,
    /// Optional PEM root certificate for the authorizer connection.
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    /// Policy path evaluated by relationship checks.
    #[serde(default = "default_check_policy_path")]
    pub check_policy_path: String,
    /// Minimum level emitted to the audit sink.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Authorizer connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Authorizer request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional directory client configuration.
    #[serde(default)]
    pub directory: Option<DirectoryConfig>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            authorizer_api_key: String::new(),
            tenant_id: String::new(),
            policy_root: String::new(),
            policy_name: None,
            policy_instance_label: None,
            decision: default_decision(),
            enabled: default_enabled(),
            disabled_for: Vec::new(),
            identity_mapping: IdentityMappingConfig::default(),
            cert_path: None,
            check_policy_path: default_check_policy_path(),
            log_level: LogLevel::default(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            directory: None,
        }
    }
}

impl AuthzConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Missing required options are collected and reported together before
    /// any other validation runs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] listing every missing required option,
    /// or [`ConfigError::Invalid`] for the first other violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = [
            ("service_url", &self.service_url),
            ("authorizer_api_key", &self.authorizer_api_key),
            ("tenant_id", &self.tenant_id),
            ("policy_root", &self.policy_root),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        if self.decision.trim().is_empty() {
            return Err(ConfigError::Invalid("decision must be non-empty".to_string()));
        }
        if self.check_policy_path.trim().is_empty() {
            return Err(ConfigError::Invalid("check_policy_path must be non-empty".to_string()));
        }
        if self.disabled_for.len() > MAX_DISABLE_RULES {
            return Err(ConfigError::Invalid("too many disabled_for rules".to_string()));
        }
        for rule in &self.disabled_for {
            rule.validate()?;
        }
        self.identity_mapping.validate()?;
        if let Some(cert_path) = &self.cert_path {
            validate_path_string("cert_path", &cert_path.to_string_lossy())?;
        }
        if !(MIN_CONNECT_TIMEOUT_MS..=MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "connect_timeout_ms must be between {MIN_CONNECT_TIMEOUT_MS} and \
                 {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if let Some(directory) = &self.directory {
            directory.validate()?;
        }
        Ok(())
    }

    /// Returns the policy instance label, falling back to the policy name.
    #[must_use]
    pub fn instance_label(&self) -> Option<&str> {
        self.policy_instance_label.as_deref().or(self.policy_name.as_deref())
    }

    /// Returns true when a disable rule matches the resolved route.
    #[must_use]
    pub fn is_disabled_for(&self, path: &str, action: &str) -> bool {
        self.disabled_for.iter().any(|rule| rule.matches(path, action))
    }
}

/// Per-route rule that suppresses authorization.
///
/// # Invariants
/// - `path` is compared verbatim against the resolved route template.
/// - `actions` are compared verbatim against the resolved route action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisableRule {
    /// Route template, e.g. `/api/users/:id`.
    pub path: String,
    /// Actions for which authorization is suppressed.
    #[serde(default)]
    pub actions: BTreeSet<String>,
}

impl DisableRule {
    /// Builds a rule for a path and a set of actions.
    #[must_use]
    pub fn new<I, S>(path: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true when the rule covers both the path and the action.
    #[must_use]
    pub fn matches(&self, path: &str, action: &str) -> bool {
        self.path == path && self.actions.contains(action)
    }

    /// Validates a single rule.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::Invalid("disabled_for.path must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// Identity extraction strategy selector.
///
/// # Invariants
/// - Unrecognized strings deserialize to [`IdentityMappingType::Unrecognized`]
///   and are treated as `none` by the identity mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMappingType {
    /// Anonymous caller.
    #[default]
    None,
    /// Claim extracted from a bearer JWT.
    Sub,
    /// Raw JWT forwarded to the authorizer.
    Jwt,
    /// Static identity from configuration.
    Manual,
    /// Any other value.
    #[serde(other)]
    Unrecognized,
}

/// Identity mapping descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdentityMappingConfig {
    /// Strategy selector.
    #[serde(rename = "type", default)]
    pub kind: IdentityMappingType,
    /// Claim name (`sub`) or header name (`jwt`).
    #[serde(default)]
    pub from: Option<String>,
    /// Static identity (`manual`).
    #[serde(default)]
    pub value: Option<String>,
}

impl IdentityMappingConfig {
    /// Builds a descriptor for the given strategy.
    #[must_use]
    pub const fn new(kind: IdentityMappingType) -> Self {
        Self {
            kind,
            from: None,
            value: None,
        }
    }

    /// Returns a copy with `from` set.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Returns a copy with `value` set.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Validates the descriptor.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(from) = &self.from
            && from.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "identity_mapping.from must be non-empty when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audit log level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Per-request diagnostics.
    Debug,
    /// Decision outcomes.
    #[default]
    Info,
    /// Degraded behavior.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Returns a stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// One or more required options are missing.
    #[error("{}", missing_message(.0))]
    Missing(Vec<String>),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders one line per missing option.
fn missing_message(options: &[String]) -> String {
    options
        .iter()
        .map(|option| format!("Missing required option: {option}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves the config path from an explicit path or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
pub(crate) fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default authorizer endpoint.
fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

/// Default decision name.
fn default_decision() -> String {
    DEFAULT_DECISION.to_string()
}

/// Authorization is enabled unless turned off.
const fn default_enabled() -> bool {
    true
}

/// Default check policy path.
fn default_check_policy_path() -> String {
    DEFAULT_CHECK_POLICY_PATH.to_string()
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
