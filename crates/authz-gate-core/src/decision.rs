// crates/authz-gate-core/src/decision.rs
// ============================================================================
// Module: Decision Client
// Description: Request-to-decision pipeline over the authorizer transport.
// Purpose: Answer "is this request allowed/visible/enabled?" fail-closed.
// Dependencies: authz-gate-config, authorizer, audit, mappers
// ============================================================================

//! ## Overview
//! [`DecisionClient`] assembles an [`IsRequest`] from the three mappers,
//! sends it through an [`Authorizer`], and reduces the response to a boolean
//! by scanning the decisions for the requested name.
//!
//! Security posture: the `is` family fails closed. Transport, status, decode
//! and resource mapping failures are reported to the audit sink and answer
//! `false`. The `try_` variants expose the typed error instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use authz_gate_config::AuthzConfig;
use authz_gate_config::ConfigError;
use serde_json::Value;
use thiserror::Error;

use crate::audit::AuditEventKind;
use crate::audit::AuditSink;
use crate::audit::AuthzAuditEvent;
use crate::audit::LevelFilter;
use crate::audit::StderrAuditSink;
use crate::authorizer::Authorizer;
use crate::authorizer::AuthorizerError;
use crate::authorizer::HttpAuthorizer;
use crate::authorizer::IsRequest;
use crate::authorizer::PolicyContext;
use crate::authorizer::PolicyInstance;
use crate::identity::IdentityContext;
use crate::identity::IdentityMapper;
use crate::policy_path::PolicyPathMapper;
use crate::request::AuthzRequest;
use crate::resource::MappingError;
use crate::resource::ResourceContext;
use crate::resource::ResourceMapper;
use crate::route::RouteMatch;
use crate::route::RouteResolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Access decision name.
pub const ALLOWED_DECISION: &str = "allowed";
/// Visibility decision name.
pub const VISIBLE_DECISION: &str = "visible";
/// Feature-enabled decision name.
pub const ENABLED_DECISION: &str = "enabled";
/// Decision evaluated by relationship checks.
const CHECK_DECISION: &str = ALLOWED_DECISION;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Decision client construction failures.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Authorizer transport could not be created.
    #[error(transparent)]
    Authorizer(#[from] AuthorizerError),
}

/// Decision evaluation failures.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// Resource context could not be derived.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// Authorizer call failed.
    #[error(transparent)]
    Authorizer(#[from] AuthorizerError),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Target of a relationship check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    /// Object type.
    pub object_type: String,
    /// Object identifier.
    pub object_id: String,
    /// Relation or permission name.
    pub relation: String,
}

impl CheckTarget {
    /// Builds a check target.
    #[must_use]
    pub fn new(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
            relation: relation.into(),
        }
    }

    /// Renders the target as a resource context.
    fn resource_context(&self) -> ResourceContext {
        let mut context = ResourceContext::new();
        context.insert("object_type".to_string(), Value::String(self.object_type.clone()));
        context.insert("object_id".to_string(), Value::String(self.object_id.clone()));
        context.insert("relation".to_string(), Value::String(self.relation.clone()));
        context
    }
}

/// Decision client.
///
/// # Invariants
/// - Configuration has passed validation.
/// - Mapper strategies are fixed for the client's lifetime.
pub struct DecisionClient {
    /// Shared configuration.
    config: Arc<AuthzConfig>,
    /// Optional route resolver.
    resolver: Option<Arc<dyn RouteResolver>>,
    /// Policy path strategy.
    policy_path: PolicyPathMapper,
    /// Identity strategy.
    identity: IdentityMapper,
    /// Resource strategy.
    resource: ResourceMapper,
    /// Authorizer transport.
    authorizer: Arc<dyn Authorizer>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

/// Builder for [`DecisionClient`].
pub struct DecisionClientBuilder {
    /// Shared configuration.
    config: Arc<AuthzConfig>,
    /// Optional route resolver.
    resolver: Option<Arc<dyn RouteResolver>>,
    /// Policy path strategy.
    policy_path: PolicyPathMapper,
    /// Identity override; defaults to the configured strategy.
    identity: Option<IdentityMapper>,
    /// Resource strategy.
    resource: ResourceMapper,
    /// Authorizer override; defaults to [`HttpAuthorizer`].
    authorizer: Option<Arc<dyn Authorizer>>,
    /// Audit sink override; defaults to level-filtered stderr.
    audit: Option<Arc<dyn AuditSink>>,
}

impl DecisionClientBuilder {
    /// Sets the route resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn RouteResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the policy path strategy.
    #[must_use]
    pub fn policy_path_mapper(mut self, mapper: PolicyPathMapper) -> Self {
        self.policy_path = mapper;
        self
    }

    /// Sets the identity strategy.
    #[must_use]
    pub fn identity_mapper(mut self, mapper: IdentityMapper) -> Self {
        self.identity = Some(mapper);
        self
    }

    /// Sets the resource strategy.
    #[must_use]
    pub fn resource_mapper(mut self, mapper: ResourceMapper) -> Self {
        self.resource = mapper;
        self
    }

    /// Sets the authorizer transport.
    #[must_use]
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Sets the audit sink. The sink receives every event; wrap it in
    /// [`LevelFilter`] to apply a level.
    #[must_use]
    pub fn audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validates configuration and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when configuration is invalid or the default
    /// HTTP authorizer cannot be created.
    pub fn build(self) -> Result<DecisionClient, BuildError> {
        self.config.validate()?;
        let authorizer = match self.authorizer {
            Some(authorizer) => authorizer,
            None => Arc::new(HttpAuthorizer::new(&self.config)?),
        };
        let audit = self.audit.unwrap_or_else(|| {
            Arc::new(LevelFilter::new(self.config.log_level, Arc::new(StderrAuditSink)))
        });
        let identity =
            self.identity.unwrap_or_else(|| IdentityMapper::from(&self.config.identity_mapping));
        Ok(DecisionClient {
            config: self.config,
            resolver: self.resolver,
            policy_path: self.policy_path,
            identity,
            resource: self.resource,
            authorizer,
            audit,
        })
    }
}

// ============================================================================
// SECTION: Decision Client
// ============================================================================

impl DecisionClient {
    /// Starts a builder over shared configuration.
    #[must_use]
    pub fn builder(config: Arc<AuthzConfig>) -> DecisionClientBuilder {
        DecisionClientBuilder {
            config,
            resolver: None,
            policy_path: PolicyPathMapper::default(),
            identity: None,
            resource: ResourceMapper::default(),
            authorizer: None,
            audit: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Returns the audit sink.
    #[must_use]
    pub fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    /// Resolves the request route when a resolver is installed.
    #[must_use]
    pub fn resolve_route(&self, request: &dyn AuthzRequest) -> Option<RouteMatch> {
        self.resolver.as_ref().and_then(|resolver| resolver.route(request))
    }

    /// Derives the policy path for a request.
    #[must_use]
    pub fn policy_path(&self, request: &dyn AuthzRequest, route: Option<&RouteMatch>) -> String {
        self.policy_path.execute(&self.config.policy_root, request, route)
    }

    /// Derives the identity context, substituting `{unknown, "null"}`.
    #[must_use]
    pub fn identity_context(&self, request: &dyn AuthzRequest) -> IdentityContext {
        match self.identity.resolve(request) {
            Ok(Some(identity)) => identity,
            Ok(None) => IdentityContext::unknown(),
            Err(err) => {
                self.audit.record(
                    &AuthzAuditEvent::new(
                        AuditEventKind::IdentityTokenInvalid,
                        request.method(),
                        request.path(),
                    )
                    .with_error(err.to_string()),
                );
                IdentityContext::unknown()
            }
        }
    }

    /// Builds the decision query for a request.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the resource mapper fails.
    pub fn build_request(
        &self,
        request: &dyn AuthzRequest,
        route: Option<&RouteMatch>,
        decision: &str,
    ) -> Result<IsRequest, MappingError> {
        let resource_context = self.resource.execute(request, route)?;
        Ok(self.query(self.policy_path(request, route), request, decision, resource_context))
    }

    /// Evaluates a decision, surfacing failures.
    ///
    /// `decision` defaults to the configured decision name.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] when mapping or the authorizer call fails.
    pub async fn try_is(
        &self,
        request: &dyn AuthzRequest,
        decision: Option<&str>,
    ) -> Result<bool, DecisionError> {
        let route = self.resolve_route(request);
        let decision = decision.unwrap_or(self.config.decision.as_str());
        let query = self.build_request(request, route.as_ref(), decision)?;
        let response = self.authorizer.is(&query).await?;
        Ok(response.decision(decision))
    }

    /// Evaluates a decision, failing closed.
    ///
    /// `decision` defaults to the configured decision name.
    pub async fn is(&self, request: &dyn AuthzRequest, decision: Option<&str>) -> bool {
        let route = self.resolve_route(request);
        let decision = decision.unwrap_or(self.config.decision.as_str());
        self.decide(request, route.as_ref(), decision).await
    }

    /// Evaluates a decision for an already resolved route, failing closed.
    pub async fn decide(
        &self,
        request: &dyn AuthzRequest,
        route: Option<&RouteMatch>,
        decision: &str,
    ) -> bool {
        let policy_path = self.policy_path(request, route);
        let resource_context = match self.resource.execute(request, route) {
            Ok(context) => context,
            Err(err) => {
                self.audit.record(
                    &AuthzAuditEvent::new(
                        AuditEventKind::ResourceMappingError,
                        request.method(),
                        request.path(),
                    )
                    .with_policy_path(policy_path)
                    .with_decision(decision, Some(false))
                    .with_error(err.to_string()),
                );
                return false;
            }
        };
        let query = self.query(policy_path, request, decision, resource_context);
        self.evaluate(request, &query, decision).await
    }

    /// Evaluates the `allowed` decision.
    pub async fn allowed(&self, request: &dyn AuthzRequest) -> bool {
        self.is(request, Some(ALLOWED_DECISION)).await
    }

    /// Evaluates the `visible` decision.
    pub async fn visible(&self, request: &dyn AuthzRequest) -> bool {
        self.is(request, Some(VISIBLE_DECISION)).await
    }

    /// Evaluates the `enabled` decision.
    pub async fn enabled(&self, request: &dyn AuthzRequest) -> bool {
        self.is(request, Some(ENABLED_DECISION)).await
    }

    /// Evaluates a relationship check through the check policy, failing closed.
    pub async fn check(&self, request: &dyn AuthzRequest, target: &CheckTarget) -> bool {
        let query = self.check_request(request, target);
        self.evaluate(request, &query, CHECK_DECISION).await
    }

    /// Evaluates a relationship check, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] when the authorizer call fails.
    pub async fn try_check(
        &self,
        request: &dyn AuthzRequest,
        target: &CheckTarget,
    ) -> Result<bool, DecisionError> {
        let query = self.check_request(request, target);
        let response = self.authorizer.is(&query).await?;
        Ok(response.decision(CHECK_DECISION))
    }

    /// Builds the check policy query.
    fn check_request(&self, request: &dyn AuthzRequest, target: &CheckTarget) -> IsRequest {
        self.query(
            self.config.check_policy_path.clone(),
            request,
            CHECK_DECISION,
            target.resource_context(),
        )
    }

    /// Assembles a decision query.
    fn query(
        &self,
        policy_path: String,
        request: &dyn AuthzRequest,
        decision: &str,
        resource_context: ResourceContext,
    ) -> IsRequest {
        let policy_instance = match (&self.config.policy_name, self.config.instance_label()) {
            (Some(name), Some(label)) => Some(PolicyInstance {
                name: name.clone(),
                instance_label: label.to_string(),
            }),
            _ => None,
        };
        IsRequest {
            identity_context: self.identity_context(request),
            policy_context: PolicyContext {
                path: policy_path,
                decisions: vec![decision.to_string()],
            },
            policy_instance,
            resource_context,
        }
    }

    /// Sends a query and reduces it, recording the outcome.
    async fn evaluate(&self, request: &dyn AuthzRequest, query: &IsRequest, decision: &str) -> bool {
        let (kind, allowed, error) = match self.authorizer.is(query).await {
            Ok(response) => (AuditEventKind::AuthzDecision, response.decision(decision), None),
            Err(err) => (AuditEventKind::AuthorizerError, false, Some(err.to_string())),
        };
        let mut event = AuthzAuditEvent::new(kind, request.method(), request.path())
            .with_policy_path(query.policy_context.path.clone())
            .with_identity_type(query.identity_context.kind.code())
            .with_decision(decision, Some(allowed));
        if let Some(error) = error {
            event = event.with_error(error);
        }
        self.audit.record(&event);
        allowed
    }
}
