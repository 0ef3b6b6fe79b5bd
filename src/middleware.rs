// ABOUTME: HTTP middleware: CORS policy, request id propagation and JSON error bodies
// ABOUTME: Request ids are uuid v4, echoed in `x-request-id` and attached to the request span
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use std::time::Duration;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::environment::CorsConfig;
use crate::constants::gateway::MAX_BODY_BYTES;
use crate::errors::AppError;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// CORS layer allowing credentialed requests from the configured origins
#[must_use]
pub fn setup_cors(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            REQUEST_ID_HEADER,
        ])
        .expose_headers([REQUEST_ID_HEADER])
        .allow_credentials(true)
}

/// Reuse the caller's `x-request-id` or mint one, and echo it on the response
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    async move {
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Fallback for paths no route matches
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

/// Rewrite bodiless framework rejections (unknown route, wrong method, body
/// limit, timeout) into the standard JSON error body.
pub async fn json_error_middleware(
    State(request_timeout): State<Duration>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;

    if is_json(&response) {
        return response;
    }
    let error = match response.status() {
        StatusCode::NOT_FOUND => AppError::not_found(format!("Route {path}")),
        StatusCode::METHOD_NOT_ALLOWED => AppError::method_not_allowed(method.as_str(), &path),
        StatusCode::PAYLOAD_TOO_LARGE => AppError::payload_too_large(MAX_BODY_BYTES),
        StatusCode::REQUEST_TIMEOUT => AppError::timeout(request_timeout),
        _ => return response,
    };

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut rewritten = error.into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(header::ALLOW, allow);
    }
    rewritten
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
