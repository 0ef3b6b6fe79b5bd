// ABOUTME: Service lifecycle: builds the router, binds the listener and shuts down gracefully
// ABOUTME: Every startup failure is returned before the socket starts accepting connections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Gateway Server
//!
//! Startup runs in a fixed order: base router with CORS and static assets,
//! database handle, cube registration, `/health`, `/api/info`, then bind.
//! [`GatewayServer::build`] does everything up to binding so that tests can
//! drive the router in-process; [`GatewayServer::bind`] and
//! [`BoundServer::serve_with_shutdown`] finish the job on a real socket.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, middleware, Router};
use cube_core::models::{CubeDefinition, Schema};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, warn, Level};

use crate::catalog;
use crate::config::environment::ServerConfig;
use crate::constants::gateway::{BASE_PATH, MAX_BODY_BYTES};
use crate::database_plugins::{Database, DatabaseProvider};
use crate::engine::{EngineKind, QueryEngine, SqlQueryEngine};
use crate::errors::{AppError, AppResult};
use crate::gateway::{CubeRegistry, GatewayOptions, QueryGatewayRegistrar};
use crate::middleware::{
    json_error_middleware, request_id_middleware, route_not_found, setup_cors,
};
use crate::routes::{HealthRoutes, ServiceInfo};
use crate::security::{SecurityContextResolver, StaticSecurityContextResolver};

/// Integrator-supplied pieces of the service
pub struct ServiceComponents {
    /// Schema shared by the database handle and the gateway
    pub schema: Arc<Schema>,
    /// Cubes to register, in order
    pub cubes: Vec<CubeDefinition>,
    /// Query engine
    pub engine: Arc<dyn QueryEngine>,
    /// Dialect handed to the engine
    pub engine_kind: EngineKind,
    /// Per-request identity hook
    pub security: Arc<dyn SecurityContextResolver>,
}

impl ServiceComponents {
    /// Demo catalog, reference SQL engine and the unauthenticated demo resolver
    #[must_use]
    pub fn demo() -> Self {
        Self {
            schema: Arc::new(catalog::demo_schema()),
            cubes: catalog::demo_cubes(),
            engine: Arc::new(SqlQueryEngine::new()),
            engine_kind: EngineKind::Postgres,
            security: Arc::new(StaticSecurityContextResolver::demo()),
        }
    }
}

/// Fully assembled, not yet listening server
pub struct GatewayServer {
    config: ServerConfig,
    router: Router,
    database: Arc<Database>,
}

impl GatewayServer {
    /// Assemble the application.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the database handle cannot be created, or
    /// a configuration error if cube registration fails.
    pub fn build(config: ServerConfig, components: ServiceComponents) -> AppResult<Self> {
        let static_root = &config.static_assets.root;
        if !static_root.is_dir() {
            warn!(
                "Static asset directory {} does not exist; {} will return 404",
                static_root.display(),
                config.static_assets.prefix
            );
        }
        let app = Router::new().nest_service(
            &config.static_assets.prefix,
            ServeDir::new(static_root),
        );

        let database = Arc::new(Database::connect(
            &config.database.url,
            components.schema.clone(),
            &config.database.pool,
        )?);

        let cubes = Arc::new(CubeRegistry::new(components.cubes, &components.schema)?);
        let info = ServiceInfo::new(cubes.names());

        let app = QueryGatewayRegistrar::register(
            app,
            GatewayOptions {
                cubes,
                database: database.clone(),
                schema: components.schema,
                security: components.security,
                engine: components.engine,
                engine_kind: components.engine_kind,
            },
        )?;

        let router = app
            .merge(HealthRoutes::routes(info))
            .fallback(route_not_found)
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(middleware::from_fn_with_state(
                config.request_timeout,
                json_error_middleware,
            ))
            .layer(setup_cors(&config.cors))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(
                        DefaultMakeSpan::new()
                            .level(Level::INFO)
                            .include_headers(false),
                    )
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            );

        Ok(Self {
            config,
            router,
            database,
        })
    }

    /// The assembled router, for in-process testing
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared database handle
    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.database
    }

    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the address cannot be bound.
    pub async fn bind(self) -> AppResult<BoundServer> {
        let addr = SocketAddr::new(self.config.host, self.config.http_port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        Ok(BoundServer {
            listener,
            router: self.router,
            database: self.database,
        })
    }

    /// Build, bind and serve until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns any startup error, or a transport error while serving.
    pub async fn start(config: ServerConfig, components: ServiceComponents) -> AppResult<()> {
        Self::build(config, components)?
            .bind()
            .await?
            .serve_with_shutdown(shutdown_signal())
            .await
    }
}

/// Server holding a bound listener
pub struct BoundServer {
    listener: TcpListener,
    router: Router,
    database: Arc<Database>,
}

impl BoundServer {
    /// Address actually bound (useful with port 0)
    ///
    /// # Errors
    ///
    /// Returns an internal error if the OS cannot report the address.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::internal(format!("Failed to read local address: {e}")))
    }

    /// Serve until `signal` completes, drain in-flight requests, then close the
    /// database handle.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP transport fails.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!("Cube Gateway listening on http://{addr}");
        info!("Cube API available at http://{addr}{BASE_PATH}/meta");

        let served = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| AppError::internal(format!("Transport error: {e}")));

        self.database.close().await;
        info!("Server shutdown complete");
        served
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
