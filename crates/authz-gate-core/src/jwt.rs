// crates/authz-gate-core/src/jwt.rs
// ============================================================================
// Module: Unverified JWT Decoding
// Description: Structural JWT parsing without signature verification.
// Purpose: Extract claims for identity mapping; the authorizer verifies tokens.
// Dependencies: jsonwebtoken, serde_json
// ============================================================================

//! ## Overview
//! Identity mapping only needs to know whether a token is a well-formed JWT
//! and, for the `sub` strategy, read one claim. Signatures are NOT verified
//! here; the authorizer receives the identity and is the trust boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use jsonwebtoken::decode;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted token length in bytes.
const MAX_TOKEN_BYTES: usize = 16 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural token failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Token exceeds the size limit.
    #[error("token too large")]
    TooLarge,
    /// Token is not a well-formed JWT with an object payload.
    #[error("malformed token: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes the claims of a JWT without verifying its signature.
///
/// The header must name an algorithm known to `jsonwebtoken`; expiry,
/// audience and required claims are not checked.
///
/// # Errors
///
/// Returns [`TokenError`] when the token is not a well-formed JWT.
pub fn decode_unverified(token: &str) -> Result<Map<String, Value>, TokenError> {
    let token = token.trim();
    if token.len() > MAX_TOKEN_BYTES {
        return Err(TokenError::TooLarge);
    }
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| TokenError::Malformed(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
