// ABOUTME: Route module organization for the Cube Gateway HTTP endpoints
// ABOUTME: Health and service info routes plus the mounted cube API routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! Route modules
//!
//! Each module exposes a `*Routes` type whose `routes` function returns a
//! stateless `Router`, ready to be merged or nested by the server.

/// Cube API (`/cubejs-api/v1/...`)
pub mod gateway;

/// `/health` and `/api/info`
pub mod health;

pub use gateway::GatewayRoutes;
pub use health::{HealthRoutes, ServiceInfo};
