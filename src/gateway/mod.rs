// ABOUTME: Query gateway registration: validates the cube set and mounts the API sub-router
// ABOUTME: Holds the shared state every gateway request runs against
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Query Gateway
//!
//! [`QueryGatewayRegistrar::register`] mounts the cube API at
//! [`BASE_PATH`](crate::constants::gateway::BASE_PATH). Each request resolves
//! its security context, validates the query against the [`CubeRegistry`] and
//! only then reaches the [`QueryEngine`].

use std::sync::Arc;

use axum::Router;
use cube_core::models::{Schema, SecurityContext};
use tracing::info;

use crate::constants::gateway::BASE_PATH;
use crate::database_plugins::{Database, DatabaseProvider};
use crate::engine::{EngineContext, EngineKind, QueryEngine};
use crate::errors::{AppError, AppResult};
use crate::routes::gateway::GatewayRoutes;
use crate::security::{InboundRequest, SecurityContextResolver};

/// Cube registry and member resolution
pub mod registry;
/// Query validation
pub mod validation;

pub use registry::{CubeRegistry, ResolvedMember};
pub use validation::{validate_query, ValidatedQuery};

/// Everything the registrar needs to mount the gateway
pub struct GatewayOptions {
    /// Registered cubes
    pub cubes: Arc<CubeRegistry>,
    /// Process-wide database handle
    pub database: Arc<Database>,
    /// Schema; must be the instance `database` is bound to
    pub schema: Arc<Schema>,
    /// Per-request security context hook
    pub security: Arc<dyn SecurityContextResolver>,
    /// Query translation and execution
    pub engine: Arc<dyn QueryEngine>,
    /// Dialect handed to the engine
    pub engine_kind: EngineKind,
}

/// Shared, read-only state of the mounted gateway
#[derive(Clone)]
pub struct GatewayState {
    cubes: Arc<CubeRegistry>,
    database: Arc<Database>,
    schema: Arc<Schema>,
    security: Arc<dyn SecurityContextResolver>,
    engine: Arc<dyn QueryEngine>,
    engine_kind: EngineKind,
}

impl GatewayState {
    /// Registered cubes
    #[must_use]
    pub fn cubes(&self) -> &CubeRegistry {
        &self.cubes
    }

    /// Query engine
    #[must_use]
    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    /// Resolve the caller's identity; called once per request
    ///
    /// # Errors
    ///
    /// Propagates the resolver's authentication error.
    pub async fn resolve_security_context(
        &self,
        request: &InboundRequest,
    ) -> AppResult<SecurityContext> {
        self.security.resolve(request).await
    }

    /// Engine context scoped to `security_context`
    #[must_use]
    pub fn engine_context<'a>(&'a self, security_context: &'a SecurityContext) -> EngineContext<'a> {
        EngineContext {
            engine_kind: self.engine_kind,
            cubes: &self.cubes,
            schema: &self.schema,
            database: &self.database,
            security_context,
        }
    }
}

/// Mounts the query gateway onto an application router
pub struct QueryGatewayRegistrar;

impl QueryGatewayRegistrar {
    /// Validate `options` and nest the gateway routes under the base path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the schema is not the instance the
    /// database handle is bound to, or the engine does not support
    /// `engine_kind`.
    pub fn register(app: Router, options: GatewayOptions) -> AppResult<Router> {
        if !Arc::ptr_eq(&options.schema, options.database.schema()) {
            return Err(AppError::config(
                "Gateway schema must be the same instance the database handle is bound to",
            ));
        }
        if !options.engine.supports(options.engine_kind) {
            return Err(AppError::config(format!(
                "Query engine does not support engine kind '{}'",
                options.engine_kind
            )));
        }

        info!(
            base_path = BASE_PATH,
            engine_kind = %options.engine_kind,
            backend = %options.database.backend_kind(),
            cubes = options.cubes.cubes().len(),
            "Mounting query gateway"
        );

        let state = GatewayState {
            cubes: options.cubes,
            database: options.database,
            schema: options.schema,
            security: options.security,
            engine: options.engine,
            engine_kind: options.engine_kind,
        };

        Ok(app.nest(BASE_PATH, GatewayRoutes::routes(state)))
    }
}
