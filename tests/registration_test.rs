// ABOUTME: Integration tests for gateway registration and startup assembly
// ABOUTME: Schema identity, engine support and cube validation fail before listening
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::Router;
use common::{components, test_config, FixtureEngine, HeaderResolver};
use cube_gateway::catalog::{demo_cubes, demo_schema, TENANT_COLUMN};
use cube_gateway::database_plugins::{Database, DatabaseProvider};
use cube_gateway::engine::{EngineKind, SqlQueryEngine};
use cube_gateway::errors::{ErrorCode, ErrorKind};
use cube_gateway::gateway::{CubeRegistry, GatewayOptions, QueryGatewayRegistrar};
use cube_gateway::models::{CubeDefinition, MeasureType, Schema};
use cube_gateway::server::{GatewayServer, ServiceComponents};

fn options(schema: Arc<Schema>, database: Arc<Database>, engine_kind: EngineKind) -> GatewayOptions {
    GatewayOptions {
        cubes: Arc::new(CubeRegistry::new(demo_cubes(), &schema).unwrap()),
        database,
        schema,
        security: Arc::new(HeaderResolver::default()),
        engine: Arc::new(SqlQueryEngine::new()),
        engine_kind,
    }
}

fn database(schema: Arc<Schema>) -> Arc<Database> {
    let config = test_config();
    Arc::new(Database::connect(&config.database.url, schema, &config.database.pool).unwrap())
}

#[tokio::test]
async fn test_register_accepts_shared_schema() {
    let schema = Arc::new(demo_schema());
    let database = database(schema.clone());

    let result = QueryGatewayRegistrar::register(
        Router::new(),
        options(schema, database, EngineKind::Postgres),
    );
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_register_rejects_a_different_schema_instance() {
    let database = database(Arc::new(demo_schema()));
    // Structurally equal but not the instance the handle is bound to
    let other = Arc::new(demo_schema());
    assert!(!Arc::ptr_eq(&other, database.schema()));

    let err = QueryGatewayRegistrar::register(
        Router::new(),
        options(other, database, EngineKind::Postgres),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);
    assert_eq!(err.code.kind(), ErrorKind::ConfigurationError);
}

#[tokio::test]
async fn test_register_rejects_unsupported_engine_kind() {
    let schema = Arc::new(demo_schema());
    let database = database(schema.clone());

    for kind in [EngineKind::Mysql, EngineKind::Sqlite] {
        let err = QueryGatewayRegistrar::register(
            Router::new(),
            options(schema.clone(), database.clone(), kind),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert!(err.message.contains(&kind.to_string()));
    }
}

#[tokio::test]
async fn test_build_rejects_cube_over_missing_table() {
    let mut components = components(
        Arc::new(FixtureEngine::default()),
        Arc::new(HeaderResolver::default()),
    );
    components.cubes.push(
        CubeDefinition::new("Invoices", "invoices", TENANT_COLUMN).measure(
            "count",
            MeasureType::Count,
            None,
        ),
    );

    let err = GatewayServer::build(test_config(), components).err().unwrap();
    assert_eq!(err.code, ErrorCode::ConfigError);
    assert!(err.message.contains("invoices"));
}

#[tokio::test]
async fn test_build_rejects_duplicate_cube_names() {
    let mut components = components(
        Arc::new(FixtureEngine::default()),
        Arc::new(HeaderResolver::default()),
    );
    let duplicate = components.cubes[0].clone();
    components.cubes.push(duplicate);

    let err = GatewayServer::build(test_config(), components).err().unwrap();
    assert_eq!(err.code, ErrorCode::ConfigError);
}

#[tokio::test]
async fn test_demo_components_build() {
    let server = GatewayServer::build(test_config(), ServiceComponents::demo()).unwrap();
    assert_eq!(
        server.database().backend_kind(),
        cube_gateway::database_plugins::BackendKind::DirectPostgres
    );
}
