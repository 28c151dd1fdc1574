// crates/authz-gate-core/src/route.rs
// ============================================================================
// Module: Route Resolution
// Description: Map inbound requests to templatized route patterns.
// Purpose: Provide the `{path, action}` lookup consumed by mappers and the gate.
// Dependencies: request
// ============================================================================

//! ## Overview
//! A [`RouteResolver`] answers "which registered route does this request
//! hit?" with the route template (placeholders intact, e.g.
//! `/api/users/:id`), an action token, and the captured placeholder values.
//! Two interchangeable strategies ship with the crate:
//! - [`RouteTable`]: a compiled table of `{verb, spec, action}` entries where
//!   specs may end in an optional `(.:format)` suffix (stripped from the
//!   returned template) and the action is a handler name.
//! - [`PatternRoutes`]: path patterns registered per HTTP method; the action
//!   is the request method.
//!
//! Integrators with their own router implement [`RouteResolver`] directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::request::AuthzRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Optional format suffix recognized in table specs.
const FORMAT_SUFFIX: &str = "(.:format)";
/// Capture name used for the optional format.
const FORMAT_PARAM: &str = "format";

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Result of a successful route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Route template with placeholders intact.
    pub path: String,
    /// Action token (handler name or HTTP method).
    pub action: String,
    /// Values captured for each placeholder.
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    /// Builds a match without captured parameters.
    #[must_use]
    pub fn new(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    /// Returns the placeholder names declared in the template, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .filter(|name| !name.is_empty())
    }
}

/// Resolves a request to a registered route.
pub trait RouteResolver: Send + Sync {
    /// Returns the matching route, or `None` when no static route matches.
    fn route(&self, request: &dyn AuthzRequest) -> Option<RouteMatch>;
}

// ============================================================================
// SECTION: Path Patterns
// ============================================================================

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal text that must match exactly.
    Literal(String),
    /// Named placeholder matching one segment.
    Param(String),
    /// Named glob matching the remaining segments.
    Glob(String),
}

/// Compiled route pattern.
///
/// # Invariants
/// - `template` never carries the `(.:format)` suffix.
/// - Empty path segments are ignored on both sides, so `//a/` matches `/a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Route template returned to callers.
    template: String,
    /// Compiled segments.
    segments: Vec<Segment>,
    /// Whether the pattern accepts an optional `.format` extension.
    optional_format: bool,
}

impl PathPattern {
    /// Compiles a pattern spec such as `/api/users/:id(.:format)`.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let (template, optional_format) = spec
            .strip_suffix(FORMAT_SUFFIX)
            .map_or((spec, false), |stripped| (stripped, true));
        let template = if template.is_empty() { "/" } else { template };
        let segments = template
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                if let Some(name) = segment.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if let Some(name) = segment.strip_prefix('*') {
                    Segment::Glob(name.to_string())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        Self {
            template: template.to_string(),
            segments,
            optional_format,
        }
    }

    /// Returns the route template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Matches a request path, returning captured values on success.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if self.optional_format
            && let Some(captures) = self.match_with_format(&parts)
        {
            return Some(captures);
        }
        self.match_segments(&parts)
    }

    /// Matches after splitting a `.format` extension off the last segment.
    fn match_with_format(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let (last, rest) = parts.split_last()?;
        let (stem, extension) = last.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        let mut trimmed = rest.to_vec();
        trimmed.push(stem);
        let mut captures = self.match_segments(&trimmed)?;
        captures.insert(FORMAT_PARAM.to_string(), extension.to_string());
        Some(captures)
    }

    /// Matches compiled segments against path parts.
    fn match_segments(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut captures = BTreeMap::new();
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    if *parts.get(index)? != literal.as_str() {
                        return None;
                    }
                    index += 1;
                }
                Segment::Param(name) => {
                    let value = parts.get(index)?;
                    captures.insert(name.clone(), (*value).to_string());
                    index += 1;
                }
                Segment::Glob(name) => {
                    let remaining = parts.get(index..).filter(|rest| !rest.is_empty())?;
                    captures.insert(name.clone(), remaining.join("/"));
                    index = parts.len();
                }
            }
        }
        (index == parts.len()).then_some(captures)
    }
}

// ============================================================================
// SECTION: Route Table
// ============================================================================

/// One entry in a [`RouteTable`].
#[derive(Debug, Clone)]
struct TableRoute {
    /// HTTP verb (upper-case), or `None` for any verb.
    verb: Option<String>,
    /// Compiled pattern.
    pattern: PathPattern,
    /// Handler action name.
    action: String,
}

/// Compiled route table; the first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    /// Entries in registration order.
    routes: Vec<TableRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry for a verb, spec and action.
    #[must_use]
    pub fn add(mut self, verb: &str, spec: &str, action: impl Into<String>) -> Self {
        self.routes.push(TableRoute {
            verb: Some(verb.to_ascii_uppercase()),
            pattern: PathPattern::parse(spec),
            action: action.into(),
        });
        self
    }

    /// Adds an entry that matches every verb.
    #[must_use]
    pub fn any(mut self, spec: &str, action: impl Into<String>) -> Self {
        self.routes.push(TableRoute {
            verb: None,
            pattern: PathPattern::parse(spec),
            action: action.into(),
        });
        self
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteResolver for RouteTable {
    fn route(&self, request: &dyn AuthzRequest) -> Option<RouteMatch> {
        let method = request.method();
        self.routes
            .iter()
            .filter(|entry| {
                entry.verb.as_deref().is_none_or(|verb| verb.eq_ignore_ascii_case(method))
            })
            .find_map(|entry| {
                entry.pattern.captures(request.path()).map(|params| RouteMatch {
                    path: entry.pattern.template().to_string(),
                    action: entry.action.clone(),
                    params,
                })
            })
    }
}

// ============================================================================
// SECTION: Pattern Routes
// ============================================================================

/// Path patterns registered per HTTP method; the first match wins.
///
/// # Invariants
/// - Methods are stored upper-case.
/// - The returned action is the request method.
#[derive(Debug, Clone, Default)]
pub struct PatternRoutes {
    /// Patterns keyed by method.
    routes: BTreeMap<String, Vec<PathPattern>>,
}

impl PatternRoutes {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pattern for a method.
    #[must_use]
    pub fn add(mut self, method: &str, pattern: &str) -> Self {
        self.routes
            .entry(method.to_ascii_uppercase())
            .or_default()
            .push(PathPattern::parse(pattern));
        self
    }

    /// Registers a `GET` pattern.
    #[must_use]
    pub fn get(self, pattern: &str) -> Self {
        self.add("GET", pattern)
    }

    /// Registers a `POST` pattern.
    #[must_use]
    pub fn post(self, pattern: &str) -> Self {
        self.add("POST", pattern)
    }

    /// Registers a `PUT` pattern.
    #[must_use]
    pub fn put(self, pattern: &str) -> Self {
        self.add("PUT", pattern)
    }

    /// Registers a `PATCH` pattern.
    #[must_use]
    pub fn patch(self, pattern: &str) -> Self {
        self.add("PATCH", pattern)
    }

    /// Registers a `DELETE` pattern.
    #[must_use]
    pub fn delete(self, pattern: &str) -> Self {
        self.add("DELETE", pattern)
    }
}

impl RouteResolver for PatternRoutes {
    fn route(&self, request: &dyn AuthzRequest) -> Option<RouteMatch> {
        let method = request.method().to_ascii_uppercase();
        self.routes.get(&method)?.iter().find_map(|pattern| {
            pattern.captures(request.path()).map(|params| RouteMatch {
                path: pattern.template().to_string(),
                action: method.clone(),
                params,
            })
        })
    }
}
