// ABOUTME: Database factory and backend selection for serverless and pooled PostgreSQL
// ABOUTME: Detects the backend kind from the connection descriptor and builds the handle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors
//! Database factory for creating database handles
//!
//! This module provides automatic backend detection and handle creation
//! based on connection descriptors. Detection runs once at startup; after that
//! every call dispatches on the [`Database`] enum.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cube_core::models::Schema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::postgres::PostgresDatabase;
use super::serverless::ServerlessDatabase;
use super::{DatabaseProvider, JsonRow, SqlParam};
use crate::config::environment::{DatabaseUrl, PostgresPoolConfig};
use crate::errors::AppResult;

/// Descriptor fragments identifying the managed serverless service
const MANAGED_SERVERLESS_PATTERNS: [&str; 2] = [".neon.tech", "neon.database"];

/// Supported backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Managed serverless `PostgreSQL` reached over HTTP
    ManagedServerless,
    /// Direct `PostgreSQL` connection pool
    DirectPostgres,
}

impl BackendKind {
    /// Stable identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManagedServerless => "managed-serverless",
            Self::DirectPostgres => "direct-postgres",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the backend kind from a connection descriptor.
///
/// Total and side-effect free: descriptors that match no managed pattern fall
/// back to [`BackendKind::DirectPostgres`]; a wrong guess surfaces as a
/// connection error downstream. Managed patterns are checked first, so they
/// win when a descriptor matches both.
#[must_use]
pub fn detect_backend_kind(descriptor: &DatabaseUrl) -> BackendKind {
    let raw = descriptor.expose().to_ascii_lowercase();
    if MANAGED_SERVERLESS_PATTERNS
        .iter()
        .any(|pattern| raw.contains(pattern))
    {
        BackendKind::ManagedServerless
    } else {
        BackendKind::DirectPostgres
    }
}

/// Database handle wrapper that delegates to the selected implementation
#[derive(Clone)]
pub enum Database {
    /// Serverless HTTP backend
    Serverless(ServerlessDatabase),
    /// Pooled `PostgreSQL` backend
    Postgres(PostgresDatabase),
}

impl Database {
    /// Create a handle for an already selected backend kind.
    ///
    /// Drivers connect lazily, so an unreachable host is reported by the first
    /// query rather than here.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the descriptor cannot be parsed by the
    /// selected driver or the transport cannot be constructed.
    pub fn new(
        kind: BackendKind,
        descriptor: &DatabaseUrl,
        schema: Arc<Schema>,
        pool_config: &PostgresPoolConfig,
    ) -> AppResult<Self> {
        let database = match kind {
            BackendKind::ManagedServerless => {
                Self::Serverless(ServerlessDatabase::new(descriptor, schema)?)
            }
            BackendKind::DirectPostgres => {
                Self::Postgres(PostgresDatabase::new(descriptor, schema, pool_config)?)
            }
        };
        info!(
            backend = %kind,
            descriptor = %descriptor,
            "Connected database backend: {}",
            database.backend_info()
        );
        Ok(database)
    }

    /// Detect the backend kind and create the handle.
    ///
    /// # Errors
    ///
    /// See [`Database::new`].
    pub fn connect(
        descriptor: &DatabaseUrl,
        schema: Arc<Schema>,
        pool_config: &PostgresPoolConfig,
    ) -> AppResult<Self> {
        debug!("Detecting database backend from descriptor: {}", descriptor);
        let kind = detect_backend_kind(descriptor);
        info!("Detected database backend: {}", kind);
        Self::new(kind, descriptor, schema, pool_config)
    }

    /// Human-readable backend description
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Serverless(_) => "Neon serverless (HTTP)",
            Self::Postgres(_) => "PostgreSQL (connection pool)",
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend_kind())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DatabaseProvider for Database {
    fn backend_kind(&self) -> BackendKind {
        match self {
            Self::Serverless(_) => BackendKind::ManagedServerless,
            Self::Postgres(_) => BackendKind::DirectPostgres,
        }
    }

    fn schema(&self) -> &Arc<Schema> {
        match self {
            Self::Serverless(db) => db.schema(),
            Self::Postgres(db) => db.schema(),
        }
    }

    #[tracing::instrument(skip(self, sql, params), fields(db_operation = "query_rows", backend = %self.backend_kind()))]
    async fn query_rows(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<JsonRow>> {
        match self {
            Self::Serverless(db) => db.query_rows(sql, params).await,
            Self::Postgres(db) => db.query_rows(sql, params).await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Serverless(db) => db.close().await,
            Self::Postgres(db) => db.close().await,
        }
    }
}
