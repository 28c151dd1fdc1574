// crates/authz-gate-core/src/resource.rs
// ============================================================================
// Module: Resource Mapper
// Description: Derive resource context attributes from a request.
// Purpose: Supply the authorizer with the values bound to route placeholders.
// Dependencies: request, route, serde_json
// ============================================================================

//! ## Overview
//! The default mapper reads the placeholders of the resolved route template
//! (`/api/users/:id` declares `id`) and binds each one to the request
//! parameter of the same name, falling back to the value captured by the
//! route resolver. The context is empty when the request has no parameters,
//! no route matched, or the template declares no placeholders.
//!
//! A custom mapper may return any JSON value; only objects are accepted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::request::AuthzRequest;
use crate::route::RouteMatch;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Structured attributes describing the target resource.
pub type ResourceContext = Map<String, Value>;

/// Custom resource function.
pub type ResourceFn = dyn Fn(&dyn AuthzRequest) -> Value + Send + Sync;

/// Resource strategy selected at construction.
#[derive(Clone, Default)]
pub enum ResourceMapper {
    /// Route placeholder extraction.
    #[default]
    Default,
    /// Integrator-supplied function.
    Custom(Arc<ResourceFn>),
}

impl fmt::Debug for ResourceMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("ResourceMapper::Default"),
            Self::Custom(_) => f.write_str("ResourceMapper::Custom"),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resource mapping failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// Custom mapper returned something other than a JSON object.
    #[error("invalid resource mapping: expected an object, got {0}")]
    InvalidResourceMapping(&'static str),
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

impl ResourceMapper {
    /// Wraps a custom resource function.
    #[must_use]
    pub fn custom<F>(mapper: F) -> Self
    where
        F: Fn(&dyn AuthzRequest) -> Value + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(mapper))
    }

    /// Derives the resource context.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidResourceMapping`] when a custom mapper
    /// returns a non-object value.
    pub fn execute(
        &self,
        request: &dyn AuthzRequest,
        route: Option<&RouteMatch>,
    ) -> Result<ResourceContext, MappingError> {
        match self {
            Self::Default => Ok(route_resource(request, route)),
            Self::Custom(mapper) => match mapper(request) {
                Value::Object(map) => Ok(map),
                other => Err(MappingError::InvalidResourceMapping(value_kind(&other))),
            },
        }
    }
}

/// Binds route placeholders to request parameters or captured values.
fn route_resource(request: &dyn AuthzRequest, route: Option<&RouteMatch>) -> ResourceContext {
    let mut context = ResourceContext::new();
    let Some(route) = route else {
        return context;
    };
    if !request.has_params() && route.params.is_empty() {
        return context;
    }
    for name in route.placeholders() {
        let value = request.param(name).or_else(|| route.params.get(name).map(String::as_str));
        if let Some(value) = value {
            context.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    context
}

/// Returns a label for a JSON value kind.
const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
