// ABOUTME: PostgreSQL database implementation over a lazily connecting sqlx pool
// ABOUTME: Executes tenant-scoped statements and returns rows as JSON objects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors
//! `PostgreSQL` database implementation
//!
//! The pool is created with `connect_lazy_with`: building the handle validates
//! the descriptor but does not open a socket. Connections are opened on first
//! use and shared by all requests through the pool.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cube_core::models::Schema;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

use super::{json_array_into_rows, wrap_as_json_rows, JsonRow, SqlParam};
use crate::config::environment::{DatabaseUrl, PostgresPoolConfig};
use crate::errors::{AppError, AppResult};

/// `PostgreSQL` database implementation
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
    schema: Arc<Schema>,
}

impl PostgresDatabase {
    /// Build a lazily connecting pool for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the descriptor is not a valid `PostgreSQL`
    /// connection string.
    pub fn new(
        descriptor: &DatabaseUrl,
        schema: Arc<Schema>,
        pool_config: &PostgresPoolConfig,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(descriptor.expose()).map_err(|e| {
            AppError::connection(format!(
                "Invalid PostgreSQL connection descriptor {descriptor}: {e}"
            ))
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout_secs))
            .connect_lazy_with(options);

        info!(
            max_connections = pool_config.max_connections,
            "PostgreSQL pool configured (lazy connect)"
        );

        Ok(Self { pool, schema })
    }

    /// Schema this handle is bound to
    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Run a statement and return its rows.
    ///
    /// # Errors
    ///
    /// Returns a database error if acquiring a connection or executing fails.
    pub async fn query_rows(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<JsonRow>> {
        let wrapped = wrap_as_json_rows(sql);
        debug!(param_count = params.len(), "Executing PostgreSQL statement");

        let mut query = sqlx::query_scalar::<Postgres, Value>(&wrapped);
        for param in params {
            query = match param {
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::Float(v) => query.bind(*v),
                SqlParam::Text(v) => query.bind(v.clone()),
                SqlParam::Bool(v) => query.bind(*v),
            };
        }

        let rows = query.fetch_one(&self.pool).await?;
        json_array_into_rows(rows)
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[tokio::test]
    async fn malformed_descriptor_is_a_connection_error() {
        let descriptor = DatabaseUrl::parse("postgresql://user:pw@host:notaport/db").unwrap();
        let result = PostgresDatabase::new(
            &descriptor,
            Arc::new(Schema::new()),
            &PostgresPoolConfig::default(),
        );
        let err = result.err().map(|e| e.code);
        assert_eq!(err, Some(ErrorCode::ConnectionFailed));
    }

    #[tokio::test]
    async fn valid_descriptor_builds_without_connecting() {
        let descriptor = DatabaseUrl::parse("postgresql://user:pw@127.0.0.1:1/db").unwrap();
        let db = PostgresDatabase::new(
            &descriptor,
            Arc::new(Schema::new()),
            &PostgresPoolConfig::default(),
        );
        assert!(db.is_ok());
    }
}
