// ABOUTME: Serverless PostgreSQL implementation speaking the Neon HTTP SQL protocol
// ABOUTME: Sends each statement as one HTTPS request; no sockets are held between queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors
//! Serverless database implementation
//!
//! Each statement is POSTed to `https://{host}/sql` with the connection
//! descriptor in the `Neon-Connection-String` header. Connection reuse is left
//! to the `reqwest` client pool.

use std::sync::Arc;
use std::time::Duration;

use cube_core::models::Schema;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use super::{json_array_into_rows, wrap_as_json_rows, JsonRow, SqlParam};
use crate::config::environment::DatabaseUrl;
use crate::constants::limits;
use crate::errors::{AppError, AppResult};

const CONNECTION_STRING_HEADER: &str = "Neon-Connection-String";
const RAW_TEXT_OUTPUT_HEADER: &str = "Neon-Raw-Text-Output";
const ARRAY_MODE_HEADER: &str = "Neon-Array-Mode";

#[derive(Debug, Deserialize)]
struct SqlOverHttpResponse {
    rows: Vec<JsonRow>,
}

/// Serverless `PostgreSQL` over HTTP
#[derive(Clone)]
pub struct ServerlessDatabase {
    client: Client,
    endpoint: Url,
    descriptor: DatabaseUrl,
    schema: Arc<Schema>,
}

impl ServerlessDatabase {
    /// Build the HTTP transport for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the descriptor is not a `postgres://` or
    /// `postgresql://` URL with a host, or the HTTP client cannot be built.
    pub fn new(descriptor: &DatabaseUrl, schema: Arc<Schema>) -> AppResult<Self> {
        let parsed = Url::parse(descriptor.expose()).map_err(|e| {
            AppError::connection(format!(
                "Invalid serverless connection descriptor {descriptor}: {e}"
            ))
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(AppError::connection(format!(
                "Unsupported scheme '{}' for serverless descriptor {descriptor}",
                parsed.scheme()
            )));
        }

        let host = parsed.host_str().ok_or_else(|| {
            AppError::connection(format!(
                "Serverless descriptor {descriptor} does not name a host"
            ))
        })?;

        let endpoint = Url::parse(&format!("https://{host}/sql"))
            .map_err(|e| AppError::connection(format!("Invalid serverless endpoint: {e}")))?;

        Self::with_endpoint(descriptor, endpoint, schema)
    }

    /// Build the transport against an explicit SQL-over-HTTP endpoint
    pub(crate) fn with_endpoint(
        descriptor: &DatabaseUrl,
        endpoint: Url,
        schema: Arc<Schema>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(limits::SERVERLESS_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::connection(format!("Failed to build HTTP client: {e}")))?;

        info!(endpoint = %endpoint, "Serverless SQL endpoint configured");

        Ok(Self {
            client,
            endpoint,
            descriptor: descriptor.clone(),
            schema,
        })
    }

    /// SQL-over-HTTP endpoint
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
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
    /// Returns a database error on transport failures, non-success status codes
    /// or an unexpected response body.
    pub async fn query_rows(&self, sql: &str, params: &[SqlParam]) -> AppResult<Vec<JsonRow>> {
        let wrapped = wrap_as_json_rows(sql);
        // Parameters travel as text; Postgres infers their types from context.
        let params: Vec<Value> = params
            .iter()
            .map(|param| match param.to_json() {
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            })
            .collect();

        debug!(param_count = params.len(), "Executing serverless statement");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONNECTION_STRING_HEADER, self.descriptor.expose())
            .header(RAW_TEXT_OUTPUT_HEADER, "true")
            .header(ARRAY_MODE_HEADER, "false")
            .json(&json!({ "query": wrapped, "params": params }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::database(format!(
                "Serverless query failed with status {status}: {detail}"
            )));
        }

        let body: SqlOverHttpResponse = response.json().await?;
        let cell = body
            .rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("rows"))
            .ok_or_else(|| AppError::database("Serverless response contained no result row"))?;

        json_array_into_rows(decode_json_cell(cell)?)
    }

    /// Nothing is pooled beyond the HTTP client, which is dropped with the handle
    pub async fn close(&self) {
        info!("Serverless database handle released");
    }
}

/// Raw text output returns JSON columns as strings
fn decode_json_cell(cell: Value) -> AppResult<Value> {
    match cell {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| AppError::database(format!("Malformed JSON rows from serverless: {e}"))),
        other => Ok(other),
    }
}
