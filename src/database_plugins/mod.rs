// ABOUTME: Database abstraction layer for Cube Gateway
// ABOUTME: Plugin architecture with serverless HTTP and pooled PostgreSQL backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use std::sync::Arc;

use async_trait::async_trait;
use cube_core::models::Schema;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// Backend selection and the `Database` handle
pub mod factory;

/// Pooled `PostgreSQL` backend
pub mod postgres;

/// Serverless (HTTP) `PostgreSQL` backend
pub mod serverless;

pub use factory::{detect_backend_kind, BackendKind, Database};

/// One result row, keyed by column alias
pub type JsonRow = Map<String, Value>;

/// Positional bind parameter (`$1`, `$2`, ...)
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// 64-bit integer
    Int(i64),
    /// Double precision float
    Float(f64),
    /// Text
    Text(String),
    /// Boolean
    Bool(bool),
}

impl SqlParam {
    /// Convert a JSON filter operand into a bind parameter.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for `null`, arrays and objects.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| AppError::invalid_input(format!("Unsupported number {n}"))),
            other => Err(AppError::invalid_input(format!(
                "Filter values must be strings, numbers or booleans, got {other}"
            ))),
        }
    }

    /// JSON rendering used in dry-run output and by the HTTP transport
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => Value::from(*v),
            Self::Text(v) => Value::from(v.as_str()),
            Self::Bool(v) => Value::from(*v),
        }
    }
}

/// Core database abstraction.
///
/// Implementations own their connection pooling; callers never hold a
/// connection. A handle is bound to one schema for its whole lifetime.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Backend kind selected at startup
    fn backend_kind(&self) -> BackendKind;

    /// Schema this handle was created with
    fn schema(&self) -> &Arc<Schema>;

    /// Execute a read-only statement and return its rows as JSON objects
    async fn query_rows(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<JsonRow>>;

    /// Release pooled connections
    async fn close(&self);
}

/// Wrap a statement so the backend returns all rows as one JSON array
pub(crate) fn wrap_as_json_rows(sql: &str) -> String {
    format!("SELECT COALESCE(json_agg(row_to_json(q)), '[]'::json) AS rows FROM ({sql}) AS q")
}

/// Split the JSON array produced by [`wrap_as_json_rows`] into rows
pub(crate) fn json_array_into_rows(value: Value) -> AppResult<Vec<JsonRow>> {
    let Value::Array(items) = value else {
        return Err(AppError::database("Expected a JSON array of rows"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(AppError::database(format!(
                "Expected a JSON object per row, got {other}"
            ))),
        })
        .collect()
}
