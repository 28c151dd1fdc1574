// crates/authz-gate-core/src/request.rs
// ============================================================================
// Module: Request Contract
// Description: Narrow accessor contract over inbound HTTP requests.
// Purpose: Keep mappers independent of any specific web framework.
// Dependencies: axum (http types), url
// ============================================================================

//! ## Overview
//! The mapping pipeline only needs four things from a request: the method,
//! the path (without query string), header lookup, and parameters.
//! [`AuthzRequest`] captures that contract and [`RequestView`] implements it
//! over borrowed `http` request data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use axum::http::Request;
use axum::http::request::Parts;
use url::form_urlencoded;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Read-only view of an inbound request.
///
/// Implementations are `Sync` so a borrowed request can be held across the
/// authorizer await point inside `Send` futures.
pub trait AuthzRequest: Sync {
    /// HTTP method token, upper-case (e.g. `GET`).
    fn method(&self) -> &str;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// Header value by case-insensitive name.
    fn header(&self, name: &str) -> Option<&str>;

    /// Parameter value by name (query or path parameter).
    fn param(&self, name: &str) -> Option<&str>;

    /// Returns true when at least one parameter is present.
    fn has_params(&self) -> bool;
}

// ============================================================================
// SECTION: Request View
// ============================================================================

/// [`AuthzRequest`] over borrowed `http` request data.
///
/// # Invariants
/// - Query parameters are decoded once at construction; later duplicates win.
/// - Path parameters added via [`RequestView::with_params`] override query
///   parameters of the same name.
#[derive(Debug, Clone)]
pub struct RequestView<'a> {
    /// HTTP method token.
    method: &'a str,
    /// Request path.
    path: &'a str,
    /// Request headers.
    headers: &'a HeaderMap,
    /// Decoded parameters.
    params: BTreeMap<String, String>,
}

impl<'a> RequestView<'a> {
    /// Builds a view over a full request.
    #[must_use]
    pub fn new<B>(request: &'a Request<B>) -> Self {
        Self::build(
            request.method().as_str(),
            request.uri().path(),
            request.uri().query(),
            request.headers(),
        )
    }

    /// Builds a view over request parts.
    #[must_use]
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self::build(parts.method.as_str(), parts.uri.path(), parts.uri.query(), &parts.headers)
    }

    /// Returns a copy with additional parameters (e.g. router path captures).
    #[must_use]
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params.extend(params.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Shared constructor.
    fn build(
        method: &'a str,
        path: &'a str,
        query: Option<&str>,
        headers: &'a HeaderMap,
    ) -> Self {
        let params = query
            .map(|query| {
                form_urlencoded::parse(query.as_bytes())
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            method,
            path,
            headers,
            params,
        }
    }
}

impl AuthzRequest for RequestView<'_> {
    fn method(&self) -> &str {
        self.method
    }

    fn path(&self) -> &str {
        self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}
