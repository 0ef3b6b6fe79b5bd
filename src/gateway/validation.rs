// ABOUTME: Query validation against the registered cubes before any engine call
// ABOUTME: Produces a normalized ValidatedQuery or a 400-class validation error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use cube_core::models::{CubeQuery, MemberRef};
use serde::Serialize;

use super::registry::{CubeRegistry, ResolvedMember};
use crate::constants::gateway::{DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT};
use crate::database_plugins::SqlParam;
use crate::errors::{AppError, AppResult};

/// A query that passed validation, with its limit filled in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedQuery {
    query: CubeQuery,
    primary_cube: String,
    referenced_cubes: Vec<String>,
}

impl ValidatedQuery {
    /// Normalized query
    #[must_use]
    pub const fn query(&self) -> &CubeQuery {
        &self.query
    }

    /// Cube the statement is rooted at (first one referenced)
    #[must_use]
    pub fn primary_cube(&self) -> &str {
        &self.primary_cube
    }

    /// Every referenced cube, primary first, in order of first appearance
    #[must_use]
    pub fn referenced_cubes(&self) -> &[String] {
        &self.referenced_cubes
    }

    /// Effective row limit
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.query.limit.unwrap_or(DEFAULT_ROW_LIMIT)
    }
}

/// Check `query` against `registry`.
///
/// # Errors
///
/// Returns `INVALID_INPUT`, `UNKNOWN_CUBE` or `UNKNOWN_MEMBER` describing the
/// first problem found.
pub fn validate_query(mut query: CubeQuery, registry: &CubeRegistry) -> AppResult<ValidatedQuery> {
    if query.measures.is_empty() && query.dimensions.is_empty() {
        return Err(AppError::invalid_input(
            "Query must request at least one measure or dimension",
        ));
    }

    for name in &query.measures {
        if !resolve(registry, name)?.is_measure() {
            return Err(AppError::invalid_input(format!(
                "'{name}' is a dimension and cannot be listed under measures"
            )));
        }
    }
    for name in &query.dimensions {
        if resolve(registry, name)?.is_measure() {
            return Err(AppError::invalid_input(format!(
                "'{name}' is a measure and cannot be listed under dimensions"
            )));
        }
    }

    for filter in &query.filters {
        resolve(registry, &filter.member)?;
        if !filter.operator.accepts_value_count(filter.values.len()) {
            return Err(AppError::invalid_input(format!(
                "Filter on '{}' has {} value(s), which operator {:?} does not accept",
                filter.member,
                filter.values.len(),
                filter.operator
            )));
        }
        for value in &filter.values {
            SqlParam::from_json(value)?;
        }
    }

    for (member, _) in &query.order {
        resolve(registry, member)?;
        if !query.measures.contains(member) && !query.dimensions.contains(member) {
            return Err(AppError::invalid_input(format!(
                "Cannot order by '{member}': it is not selected as a measure or dimension"
            )));
        }
    }

    match query.limit {
        Some(limit) if limit > MAX_ROW_LIMIT => {
            return Err(AppError::invalid_input(format!(
                "Limit {limit} exceeds the maximum of {MAX_ROW_LIMIT}"
            )));
        }
        Some(_) => {}
        None => query.limit = Some(DEFAULT_ROW_LIMIT),
    }

    let mut referenced_cubes: Vec<String> = Vec::new();
    for name in query.referenced_members() {
        let member = MemberRef::parse(name)?;
        if !referenced_cubes.contains(&member.cube) {
            referenced_cubes.push(member.cube);
        }
    }

    let primary_cube = referenced_cubes
        .first()
        .cloned()
        .ok_or_else(|| AppError::invalid_input("Query references no cube"))?;
    let primary = registry
        .get(&primary_cube)
        .ok_or_else(|| AppError::unknown_cube(&primary_cube))?;
    for other in referenced_cubes.iter().skip(1) {
        if primary.find_join(other).is_none() {
            return Err(AppError::invalid_input(format!(
                "Cube '{primary_cube}' declares no join to '{other}'"
            )));
        }
    }

    Ok(ValidatedQuery {
        query,
        primary_cube,
        referenced_cubes,
    })
}

fn resolve<'a>(registry: &'a CubeRegistry, name: &str) -> AppResult<ResolvedMember<'a>> {
    registry.resolve(&MemberRef::parse(name)?)
}
