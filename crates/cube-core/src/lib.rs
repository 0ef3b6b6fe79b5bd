// ABOUTME: Core model crate shared by the Cube Gateway server and its engines
// ABOUTME: Holds cube definitions, table schema, cube queries and security context types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

#![deny(unsafe_code)]

//! # Cube Core
//!
//! Plain data types with no I/O. Everything here is immutable once built and
//! safe to share across requests and tenants.

/// Cube, schema, query and security context models
pub mod models;

/// Errors raised while building or parsing models
pub mod errors;

pub use errors::ModelError;
