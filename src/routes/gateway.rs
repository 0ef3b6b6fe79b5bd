// ABOUTME: Cube API route handlers: meta, load, sql and dry-run
// ABOUTME: Resolves the security context first, validates, then delegates to the query engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! Gateway routes
//!
//! Every handler follows the same order: resolve the security context from the
//! request head, read and validate the query, and only then call the engine.
//! Failures at any step become a structured [`AppError`] response.

use std::collections::BTreeMap;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Query, Request, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cube_core::models::{CubeQuery, MemberRef, SecurityContext};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::constants::gateway::MAX_BODY_BYTES;
use crate::errors::{AppError, AppResult};
use crate::gateway::{validate_query, CubeRegistry, GatewayState, ResolvedMember, ValidatedQuery};

#[derive(Debug, Deserialize)]
struct LoadParams {
    query: Option<String>,
}

/// Cube API routes, mounted under the gateway base path
pub struct GatewayRoutes;

impl GatewayRoutes {
    /// Create all gateway routes
    pub fn routes(state: GatewayState) -> Router {
        Router::new()
            .route("/meta", get(Self::handle_meta))
            .route("/load", get(Self::handle_load_get).post(Self::handle_load))
            .route("/sql", post(Self::handle_sql))
            .route("/dry-run", post(Self::handle_dry_run))
            .with_state(state)
    }

    /// Describe the registered cubes
    async fn handle_meta(
        State(state): State<GatewayState>,
        request: Request,
    ) -> Result<Response, AppError> {
        let (parts, _body) = request.into_parts();
        state.resolve_security_context(&parts).await?;
        Ok(Json(state.cubes().meta()).into_response())
    }

    /// `POST /load` with `{ "query": {...} }` or a bare query body
    async fn handle_load(
        State(state): State<GatewayState>,
        request: Request,
    ) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let security_context = state.resolve_security_context(&parts).await?;
        let bytes = read_body(body).await?;
        let query = parse_query_body(&bytes)?;
        Self::load(&state, &security_context, query).await
    }

    /// `GET /load?query=<json>`
    async fn handle_load_get(
        State(state): State<GatewayState>,
        request: Request,
    ) -> Result<Response, AppError> {
        let (parts, _body) = request.into_parts();
        let security_context = state.resolve_security_context(&parts).await?;
        let query = query_from_uri(&parts)?;
        Self::load(&state, &security_context, query).await
    }

    async fn load(
        state: &GatewayState,
        security_context: &SecurityContext,
        query: CubeQuery,
    ) -> Result<Response, AppError> {
        let validated = validate_query(query, state.cubes())?;
        let ctx = state.engine_context(security_context);
        let data = state.engine().load(&ctx, &validated).await?;

        info!(
            organisation_id = %security_context.organisation_id(),
            user_id = %security_context.user_id(),
            cubes = ?validated.referenced_cubes(),
            rows = data.len(),
            "Cube query served"
        );

        Ok(Json(json!({
            "query": validated.query(),
            "data": data,
            "annotation": annotation(state.cubes(), &validated),
        }))
        .into_response())
    }

    /// Return the statement the engine would run, without running it
    async fn handle_sql(
        State(state): State<GatewayState>,
        request: Request,
    ) -> Result<Response, AppError> {
        let (security_context, validated) = Self::authorize_and_validate(&state, request).await?;
        let ctx = state.engine_context(&security_context);
        let statement = state.engine().generate_sql(&ctx, &validated)?;
        Ok(Json(json!({ "sql": statement.to_json() })).into_response())
    }

    /// Validate only
    async fn handle_dry_run(
        State(state): State<GatewayState>,
        request: Request,
    ) -> Result<Response, AppError> {
        let (_security_context, validated) =
            Self::authorize_and_validate(&state, request).await?;
        Ok(Json(json!({
            "valid": true,
            "normalizedQuery": validated.query(),
            "referencedCubes": validated.referenced_cubes(),
        }))
        .into_response())
    }

    async fn authorize_and_validate(
        state: &GatewayState,
        request: Request,
    ) -> AppResult<(SecurityContext, ValidatedQuery)> {
        let (parts, body) = request.into_parts();
        let security_context = state.resolve_security_context(&parts).await?;
        let bytes = read_body(body).await?;
        let validated = validate_query(parse_query_body(&bytes)?, state.cubes())?;
        Ok((security_context, validated))
    }
}

/// Buffer the request body, refusing anything over the body limit
async fn read_body(body: Body) -> AppResult<Bytes> {
    to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        debug!("Request body rejected: {e}");
        AppError::payload_too_large(MAX_BODY_BYTES)
    })
}

/// Accept `{ "query": <object|string> }` or the query object itself
fn parse_query_body(bytes: &[u8]) -> AppResult<CubeQuery> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::invalid_input(format!("Request body is not valid JSON: {e}")))?;
    let query = match value {
        Value::Object(mut map) if map.contains_key("query") => {
            map.remove("query").unwrap_or(Value::Null)
        }
        other => other,
    };
    query_from_value(query)
}

fn query_from_uri(parts: &Parts) -> AppResult<CubeQuery> {
    let Query(params) = Query::<LoadParams>::try_from_uri(&parts.uri)
        .map_err(|e| AppError::invalid_input(format!("Invalid query string: {e}")))?;
    let raw = params
        .query
        .ok_or_else(|| AppError::invalid_input("Missing 'query' parameter"))?;
    query_from_value(Value::String(raw))
}

fn query_from_value(value: Value) -> AppResult<CubeQuery> {
    let value = match value {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| AppError::invalid_input(format!("Query is not valid JSON: {e}")))?,
        other => other,
    };
    serde_json::from_value(value).map_err(|e| AppError::invalid_input(format!("Invalid query: {e}")))
}

/// Titles and types of the selected members, keyed by full name
fn annotation(cubes: &CubeRegistry, validated: &ValidatedQuery) -> Value {
    let mut measures = BTreeMap::new();
    let mut dimensions = BTreeMap::new();
    let query = validated.query();
    for name in query.measures.iter().chain(query.dimensions.iter()) {
        let Ok(member) = MemberRef::parse(name) else {
            continue;
        };
        match cubes.resolve(&member) {
            Ok(ResolvedMember::Measure(cube, measure)) => {
                measures.insert(
                    name.clone(),
                    json!({
                        "title": format!(
                            "{} {}",
                            cube.display_title(),
                            measure.title.as_deref().unwrap_or(&measure.name)
                        ),
                        "shortTitle": measure.title.as_deref().unwrap_or(&measure.name),
                        "type": "number",
                    }),
                );
            }
            Ok(ResolvedMember::Dimension(cube, dimension)) => {
                dimensions.insert(
                    name.clone(),
                    json!({
                        "title": format!(
                            "{} {}",
                            cube.display_title(),
                            dimension.title.as_deref().unwrap_or(&dimension.name)
                        ),
                        "shortTitle": dimension.title.as_deref().unwrap_or(&dimension.name),
                        "type": dimension.dimension_type.as_str(),
                    }),
                );
            }
            Err(_) => {}
        }
    }
    json!({
        "measures": measures,
        "dimensions": dimensions,
        "segments": {},
        "timeDimensions": {},
    })
}
