// ABOUTME: Liveness and service description endpoints
// ABOUTME: Neither route touches the database or requires a security context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::gateway::BASE_PATH;
use crate::constants::frontend::STATIC_PREFIX;
use crate::constants::service_names::CUBE_GATEWAY;

/// Body of `GET /api/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Crate version
    pub version: String,
    /// `METHOD path` to description
    pub endpoints: BTreeMap<String, String>,
    /// Registered cube names, in registration order
    pub cubes: Vec<String>,
}

impl ServiceInfo {
    /// Describe this service serving `cubes`
    #[must_use]
    pub fn new(cubes: Vec<String>) -> Self {
        let endpoints = [
            ("GET /health".to_owned(), "Health check"),
            ("GET /api/info".to_owned(), "Service information"),
            (format!("GET {BASE_PATH}/meta"), "Get cube metadata"),
            (format!("POST {BASE_PATH}/load"), "Execute queries"),
            (format!("GET {BASE_PATH}/load"), "Execute queries (query string)"),
            (format!("POST {BASE_PATH}/sql"), "Generate SQL without executing"),
            (format!("POST {BASE_PATH}/dry-run"), "Validate a query"),
            (format!("GET {STATIC_PREFIX}/"), "Frontend assets"),
        ]
        .into_iter()
        .map(|(endpoint, description)| (endpoint, description.to_owned()))
        .collect();

        Self {
            name: CUBE_GATEWAY.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            endpoints,
            cubes,
        }
    }
}

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create `/health` and `/api/info`
    pub fn routes(info: ServiceInfo) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/api/info", get(Self::handle_info))
            .with_state(Arc::new(info))
    }

    async fn handle_health() -> Json<Value> {
        Json(json!({ "status": "ok" }))
    }

    async fn handle_info(State(info): State<Arc<ServiceInfo>>) -> Json<ServiceInfo> {
        Json(info.as_ref().clone())
    }
}
