// ABOUTME: Query engine contract the gateway delegates translation and execution to
// ABOUTME: Engines receive validated queries plus the request's security context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Query Engine
//!
//! The gateway never builds SQL itself. It validates a query against the
//! registered cubes and hands it to a [`QueryEngine`] together with an
//! [`EngineContext`] carrying the engine kind (passed through unopened), the
//! cube registry, the schema, the shared database handle and the request's
//! security context.

use std::fmt;

use async_trait::async_trait;
use cube_core::models::{Schema, SecurityContext};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database_plugins::{Database, JsonRow, SqlParam};
use crate::errors::AppResult;
use crate::gateway::{CubeRegistry, ValidatedQuery};

/// Reference SQL engine for `PostgreSQL`
pub mod sql;

pub use sql::SqlQueryEngine;

/// SQL dialect discriminator handed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// `PostgreSQL` dialect
    Postgres,
    /// `MySQL` dialect
    Mysql,
    /// `SQLite` dialect
    Sqlite,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        })
    }
}

/// Everything an engine may use to answer one request
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    /// Dialect selected at registration
    pub engine_kind: EngineKind,
    /// Registered cubes
    pub cubes: &'a CubeRegistry,
    /// Schema shared with the database handle
    pub schema: &'a Schema,
    /// Process-wide database handle
    pub database: &'a Database,
    /// Identity scoping this request
    pub security_context: &'a SecurityContext,
}

/// Generated statement with positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// SQL text using `$n` placeholders
    pub sql: String,
    /// Values for the placeholders, in order
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    /// JSON rendering for the `/sql` endpoint
    #[must_use]
    pub fn to_json(&self) -> Value {
        let params: Vec<Value> = self.params.iter().map(SqlParam::to_json).collect();
        json!({ "sql": self.sql, "params": params })
    }
}

/// Pluggable query translation and execution.
///
/// Implementations must restrict every statement they run to
/// `ctx.security_context` and must not keep per-request state between calls.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Whether this engine can serve `engine_kind`; checked once at registration
    fn supports(&self, engine_kind: EngineKind) -> bool;

    /// Translate a validated query without executing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be expressed for this engine.
    fn generate_sql(
        &self,
        ctx: &EngineContext<'_>,
        query: &ValidatedQuery,
    ) -> AppResult<SqlStatement>;

    /// Translate and execute a validated query.
    ///
    /// # Errors
    ///
    /// Returns an error if translation or execution fails.
    async fn load(&self, ctx: &EngineContext<'_>, query: &ValidatedQuery)
        -> AppResult<Vec<JsonRow>>;
}
