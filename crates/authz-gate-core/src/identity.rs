// crates/authz-gate-core/src/identity.rs
// ============================================================================
// Module: Identity Mapper
// Description: Derive the caller identity context from a request.
// Purpose: Produce the `{type, identity}` pair sent to the authorizer.
// Dependencies: authz-gate-config, jwt, request, serde
// ============================================================================

//! ## Overview
//! The identity mapper turns a request into an optional [`IdentityContext`].
//! The strategy is chosen once from the `identity_mapping` configuration:
//!
//! | type      | result                                                        |
//! |-----------|---------------------------------------------------------------|
//! | `none`    | `{none, "null"}`                                              |
//! | `sub`     | claim `from` (default `sub`) of the bearer token              |
//! | `jwt`     | raw value of header `from` (default `Authorization`) if a JWT |
//! | `manual`  | configured `value`                                            |
//!
//! Unrecognized type strings use the `none` strategy. Malformed tokens never
//! raise from [`IdentityMapper::execute`]; they produce no identity, which the
//! decision client reports to the authorizer as `{unknown, "null"}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use authz_gate_config::IdentityMappingConfig;
use authz_gate_config::IdentityMappingType;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::jwt::TokenError;
use crate::jwt::decode_unverified;
use crate::request::AuthzRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Identity value used when no caller identity exists.
pub const NULL_IDENTITY: &str = "null";
/// Header consulted by the `sub` strategy and by default for `jwt`.
const AUTHORIZATION_HEADER: &str = "authorization";
/// Claim used by the `sub` strategy when `from` is unset.
const DEFAULT_SUB_CLAIM: &str = "sub";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Identity classification with fixed transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityType {
    /// No identity could be derived.
    #[serde(rename = "IDENTITY_TYPE_UNKNOWN")]
    Unknown,
    /// Anonymous caller.
    #[serde(rename = "IDENTITY_TYPE_NONE")]
    None,
    /// Subject claim.
    #[serde(rename = "IDENTITY_TYPE_SUB")]
    Sub,
    /// Raw JWT.
    #[serde(rename = "IDENTITY_TYPE_JWT")]
    Jwt,
    /// Manually configured identity.
    #[serde(rename = "IDENTITY_TYPE_MANUAL")]
    Manual,
}

impl IdentityType {
    /// Returns the transport code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unknown => "IDENTITY_TYPE_UNKNOWN",
            Self::None => "IDENTITY_TYPE_NONE",
            Self::Sub => "IDENTITY_TYPE_SUB",
            Self::Jwt => "IDENTITY_TYPE_JWT",
            Self::Manual => "IDENTITY_TYPE_MANUAL",
        }
    }
}

/// Caller identity and its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    /// Identity classification.
    #[serde(rename = "type")]
    pub kind: IdentityType,
    /// Identity value.
    pub identity: String,
}

impl IdentityContext {
    /// Builds an identity context.
    #[must_use]
    pub fn new(kind: IdentityType, identity: impl Into<String>) -> Self {
        Self {
            kind,
            identity: identity.into(),
        }
    }

    /// Identity sent when the mapper produced nothing.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(IdentityType::Unknown, NULL_IDENTITY)
    }

    /// Anonymous identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(IdentityType::None, NULL_IDENTITY)
    }
}

/// Custom identity function.
pub type IdentityFn = dyn Fn(&dyn AuthzRequest) -> Option<IdentityContext> + Send + Sync;

/// Identity strategy selected at construction.
#[derive(Clone, Default)]
pub enum IdentityMapper {
    /// Anonymous identity.
    #[default]
    None,
    /// Claim from the bearer token in the `Authorization` header.
    Sub {
        /// Claim name.
        claim: String,
    },
    /// Raw JWT from a header.
    Jwt {
        /// Header name.
        header: String,
    },
    /// Static identity.
    Manual {
        /// Configured identity value.
        value: String,
    },
    /// Integrator-supplied function.
    Custom(Arc<IdentityFn>),
}

impl fmt::Debug for IdentityMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("IdentityMapper::None"),
            Self::Sub {
                claim,
            } => f.debug_struct("IdentityMapper::Sub").field("claim", claim).finish(),
            Self::Jwt {
                header,
            } => f.debug_struct("IdentityMapper::Jwt").field("header", header).finish(),
            Self::Manual {
                ..
            } => f.write_str("IdentityMapper::Manual"),
            Self::Custom(_) => f.write_str("IdentityMapper::Custom"),
        }
    }
}

impl From<&IdentityMappingConfig> for IdentityMapper {
    fn from(config: &IdentityMappingConfig) -> Self {
        match config.kind {
            IdentityMappingType::None | IdentityMappingType::Unrecognized => Self::None,
            IdentityMappingType::Sub => Self::Sub {
                claim: config.from.clone().unwrap_or_else(|| DEFAULT_SUB_CLAIM.to_string()),
            },
            IdentityMappingType::Jwt => Self::Jwt {
                header: config.from.clone().unwrap_or_else(|| AUTHORIZATION_HEADER.to_string()),
            },
            IdentityMappingType::Manual => Self::Manual {
                value: config.value.clone().unwrap_or_default(),
            },
        }
    }
}

impl IdentityMapper {
    /// Wraps a custom identity function.
    #[must_use]
    pub fn custom<F>(mapper: F) -> Self
    where
        F: Fn(&dyn AuthzRequest) -> Option<IdentityContext> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(mapper))
    }

    /// Derives the identity, treating malformed tokens as no identity.
    #[must_use]
    pub fn execute(&self, request: &dyn AuthzRequest) -> Option<IdentityContext> {
        self.resolve(request).ok().flatten()
    }

    /// Derives the identity, surfacing token decode failures.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when a configured token header is present but
    /// does not hold a well-formed JWT.
    pub fn resolve(
        &self,
        request: &dyn AuthzRequest,
    ) -> Result<Option<IdentityContext>, TokenError> {
        match self {
            Self::None => Ok(Some(IdentityContext::anonymous())),
            Self::Sub {
                claim,
            } => {
                let Some(header) = request.header(AUTHORIZATION_HEADER) else {
                    return Ok(None);
                };
                let token = header.split_whitespace().last().unwrap_or_default();
                let claims = decode_unverified(token)?;
                Ok(claims.get(claim).and_then(claim_string).map(|value| {
                    IdentityContext::new(IdentityType::Sub, value)
                }))
            }
            Self::Jwt {
                header,
            } => {
                let Some(value) = request.header(header) else {
                    return Ok(None);
                };
                decode_unverified(value)?;
                Ok(Some(IdentityContext::new(IdentityType::Jwt, value)))
            }
            Self::Manual {
                value,
            } => Ok(Some(IdentityContext::new(IdentityType::Manual, value.clone()))),
            Self::Custom(mapper) => Ok(mapper(request)),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a scalar claim as a string; structured claims are rejected.
fn claim_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
