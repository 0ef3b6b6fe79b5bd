// ABOUTME: Model module organization for cube-core
// ABOUTME: Re-exports cube, schema, query and security context types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

/// Cube definitions (measures, dimensions, joins)
pub mod cube;
/// Cube query shape accepted by the gateway
pub mod query;
/// Per-request tenant and user identity
pub mod security;
/// Static table/column schema
pub mod schema;

pub use cube::{
    CubeDefinition, DimensionDefinition, DimensionType, JoinDefinition, JoinRelationship,
    MeasureDefinition, MeasureType,
};
pub use query::{CubeQuery, FilterOperator, MemberRef, OrderDirection, QueryFilter};
pub use schema::{ColumnDefinition, ColumnType, Schema, TableDefinition};
pub use security::{OrganisationId, SecurityContext, UserId};

/// Check that a name is a plain SQL-safe identifier
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
