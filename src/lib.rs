// ABOUTME: Main library entry point for the Cube Gateway analytics service
// ABOUTME: Multi-tenant cube query API over serverless or pooled PostgreSQL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

#![deny(unsafe_code)]

//! # Cube Gateway
//!
//! An HTTP service exposing a semantic-layer query API over `PostgreSQL`.
//! Declarative cubes (measures, dimensions, joins) are registered once at
//! startup; clients send cube queries and every query runs scoped to the
//! tenant resolved from the inbound request.
//!
//! ## Architecture
//!
//! - **Database plugins**: backend detection from the connection descriptor
//!   and a `Database` handle over either the serverless HTTP driver or a
//!   lazily connecting `sqlx` pool
//! - **Security**: the per-request `SecurityContextResolver` hook
//! - **Gateway**: cube registration, query validation and the mounted cube API
//! - **Engine**: pluggable query translation; the reference engine emits
//!   tenant-scoped `PostgreSQL`
//! - **Server**: lifecycle, middleware, `/health` and `/api/info`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cube_gateway::config::environment::ServerConfig;
//! use cube_gateway::errors::AppResult;
//! use cube_gateway::server::{GatewayServer, ServiceComponents};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     GatewayServer::start(config, ServiceComponents::demo()).await
//! }
//! ```

/// Demo schema and cube catalog
pub mod catalog;

/// Configuration management
pub mod config;

/// Application constants
pub mod constants;

/// Database backends and backend selection
pub mod database_plugins;

/// Query engine contract and the reference SQL engine
pub mod engine;

/// Unified error handling
pub mod errors;

/// Cube registration, validation and the mounted gateway
pub mod gateway;

/// Logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// HTTP routes
pub mod routes;

/// Per-request security context resolution
pub mod security;

/// Service lifecycle
pub mod server;

pub use cube_core::models;
