// crates/authz-gate-core/src/lib.rs
// ============================================================================
// Module: Authz Gate Core
// Description: Request-to-decision pipeline and HTTP authorization gate.
// Purpose: Enforce remote authorizer decisions in front of HTTP handlers.
// Dependencies: authz-gate-config, axum, reqwest, serde
// ============================================================================

//! ## Overview
//! Authz Gate Core derives a policy path, identity context and resource
//! context from each inbound request, asks the remote authorizer for a named
//! decision, and lets the request through only when the decision is true.
//!
//! Leaves first: [`route`] resolves request templates, [`policy_path`],
//! [`identity`] and [`resource`] map requests, [`authorizer`] is the
//! transport, [`decision`] reduces responses, and [`gate`] is the middleware.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod authorizer;
pub mod decision;
pub mod gate;
pub mod identity;
pub mod jwt;
pub mod policy_path;
pub mod request;
pub mod resource;
pub mod route;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEventKind;
pub use audit::AuditSink;
pub use audit::AuthzAuditEvent;
pub use audit::FileAuditSink;
pub use audit::LevelFilter;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use authorizer::Authorizer;
pub use authorizer::AuthorizerError;
pub use authorizer::Decision;
pub use authorizer::HttpAuthorizer;
pub use authorizer::IsRequest;
pub use authorizer::IsResponse;
pub use authorizer::PolicyContext;
pub use authorizer::PolicyInstance;
pub use decision::BuildError;
pub use decision::CheckTarget;
pub use decision::DecisionClient;
pub use decision::DecisionClientBuilder;
pub use decision::DecisionError;
pub use gate::AuthzGate;
pub use gate::GateDecision;
pub use gate::gate_middleware;
pub use identity::IdentityContext;
pub use identity::IdentityMapper;
pub use identity::IdentityType;
pub use policy_path::PolicyPathMapper;
pub use policy_path::normalize_policy_path;
pub use policy_path::policy_path;
pub use request::AuthzRequest;
pub use request::RequestView;
pub use resource::MappingError;
pub use resource::ResourceContext;
pub use resource::ResourceMapper;
pub use route::PathPattern;
pub use route::PatternRoutes;
pub use route::RouteMatch;
pub use route::RouteResolver;
pub use route::RouteTable;
