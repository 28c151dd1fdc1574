// crates/authz-gate-core/src/policy_path.rs
// ============================================================================
// Module: Policy Path Mapper
// Description: Derive dotted policy-path identifiers from requests.
// Purpose: Locate the policy rule set governing a route/method pair.
// Dependencies: request, route
// ============================================================================

//! ## Overview
//! A policy path is `policy_root.METHOD.path` with the path normalized into an
//! identifier-safe dotted form. When a route resolver matches, the route
//! template replaces the raw path so `/api/users/42` and `/api/users/7` share
//! the policy `root.GET.api.users.__id`.
//!
//! Normalization runs in a fixed order:
//! 1. `/` becomes `.`
//! 2. `..` collapses to `.` (single left-to-right pass)
//! 3. `:` becomes `__`
//! 4. anything outside `[A-Za-z0-9._]` becomes `_`
//! 5. one trailing `.` is stripped

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::request::AuthzRequest;
use crate::route::RouteMatch;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Custom policy-path function: `(policy_root, request) -> policy path`.
pub type PolicyPathFn = dyn Fn(&str, &dyn AuthzRequest) -> String + Send + Sync;

/// Policy path strategy.
#[derive(Clone, Default)]
pub enum PolicyPathMapper {
    /// Route-aware normalization.
    #[default]
    Default,
    /// Integrator-supplied function.
    Custom(Arc<PolicyPathFn>),
}

impl fmt::Debug for PolicyPathMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("PolicyPathMapper::Default"),
            Self::Custom(_) => f.write_str("PolicyPathMapper::Custom"),
        }
    }
}

impl PolicyPathMapper {
    /// Wraps a custom policy-path function.
    #[must_use]
    pub fn custom<F>(mapper: F) -> Self
    where
        F: Fn(&str, &dyn AuthzRequest) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(mapper))
    }

    /// Derives the policy path for a request.
    ///
    /// `route` is the resolver's match for this request, when one exists.
    #[must_use]
    pub fn execute(
        &self,
        policy_root: &str,
        request: &dyn AuthzRequest,
        route: Option<&RouteMatch>,
    ) -> String {
        match self {
            Self::Default => {
                let path = route.map_or_else(|| request.path(), |route| route.path.as_str());
                policy_path(policy_root, request.method(), path)
            }
            Self::Custom(mapper) => mapper(policy_root, request),
        }
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Builds and normalizes `policy_root.method.path`.
#[must_use]
pub fn policy_path(policy_root: &str, method: &str, path: &str) -> String {
    normalize_policy_path(&format!("{policy_root}.{method}.{path}"))
}

/// Normalizes a raw dotted path into an identifier-safe policy path.
#[must_use]
pub fn normalize_policy_path(raw: &str) -> String {
    let mut normalized: String = raw
        .replace('/', ".")
        .replace("..", ".")
        .replace(':', "__")
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' { ch } else { '_' })
        .collect();
    if normalized.ends_with('.') {
        normalized.pop();
    }
    normalized
}
