// ABOUTME: Registered cube set, validated once against the schema at startup
// ABOUTME: Resolves `Cube.member` references and renders the public metadata shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use std::collections::HashSet;

use cube_core::models::{
    is_valid_identifier, ColumnType, CubeDefinition, DimensionDefinition, MeasureDefinition,
    MeasureType, MemberRef, Schema, TableDefinition,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{AppError, AppResult};

/// A member reference resolved against the registry
#[derive(Debug, Clone, Copy)]
pub enum ResolvedMember<'a> {
    /// Aggregated measure
    Measure(&'a CubeDefinition, &'a MeasureDefinition),
    /// Grouping dimension
    Dimension(&'a CubeDefinition, &'a DimensionDefinition),
}

impl<'a> ResolvedMember<'a> {
    /// Owning cube
    #[must_use]
    pub const fn cube(&self) -> &'a CubeDefinition {
        match self {
            Self::Measure(cube, _) | Self::Dimension(cube, _) => cube,
        }
    }

    /// Whether this is a measure
    #[must_use]
    pub const fn is_measure(&self) -> bool {
        matches!(self, Self::Measure(..))
    }
}

/// Cube definitions in registration order, shared read-only by all tenants
#[derive(Debug, Clone)]
pub struct CubeRegistry {
    cubes: Vec<CubeDefinition>,
}

impl CubeRegistry {
    /// Validate `cubes` against `schema` and freeze them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a cube name is invalid or duplicated, a
    /// table or column it references is missing from the schema, a measure is
    /// applied to an incompatible column, or a join targets an unregistered cube.
    pub fn new(cubes: Vec<CubeDefinition>, schema: &Schema) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for cube in &cubes {
            if !is_valid_identifier(&cube.name) {
                return Err(AppError::config(format!(
                    "Invalid cube name '{}'",
                    cube.name
                )));
            }
            if !seen.insert(cube.name.as_str()) {
                return Err(AppError::config(format!(
                    "Cube '{}' is registered twice",
                    cube.name
                )));
            }
            validate_cube(cube, schema)?;
        }

        for cube in &cubes {
            for join in &cube.joins {
                let target = cubes
                    .iter()
                    .find(|c| c.name == join.target_cube)
                    .ok_or_else(|| {
                        AppError::config(format!(
                            "Cube '{}' joins unregistered cube '{}'",
                            cube.name, join.target_cube
                        ))
                    })?;
                require_column(schema, cube, &join.source_column)?;
                require_column(schema, target, &join.target_column)?;
            }
        }

        info!(
            cubes = cubes.len(),
            "Registered cubes: {}",
            cubes
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self { cubes })
    }

    /// Look up a cube by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CubeDefinition> {
        self.cubes.iter().find(|c| c.name == name)
    }

    /// All cubes in registration order
    #[must_use]
    pub fn cubes(&self) -> &[CubeDefinition] {
        &self.cubes
    }

    /// Cube names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.cubes.iter().map(|c| c.name.clone()).collect()
    }

    /// Resolve a member reference to its definition.
    ///
    /// # Errors
    ///
    /// Returns `UNKNOWN_CUBE` or `UNKNOWN_MEMBER`.
    pub fn resolve(&self, member: &MemberRef) -> AppResult<ResolvedMember<'_>> {
        let cube = self
            .get(&member.cube)
            .ok_or_else(|| AppError::unknown_cube(&member.cube))?;
        if let Some(measure) = cube.find_measure(&member.member) {
            return Ok(ResolvedMember::Measure(cube, measure));
        }
        if let Some(dimension) = cube.find_dimension(&member.member) {
            return Ok(ResolvedMember::Dimension(cube, dimension));
        }
        Err(AppError::unknown_member(
            &member.to_string(),
            format!("Cube '{}' has no member '{}'", cube.name, member.member),
        ))
    }

    /// Public description of every cube, as served by `GET /meta`
    #[must_use]
    pub fn meta(&self) -> Value {
        let cubes: Vec<Value> = self.cubes.iter().map(cube_meta).collect();
        json!({ "cubes": cubes })
    }
}

fn validate_cube(cube: &CubeDefinition, schema: &Schema) -> AppResult<()> {
    let table = find_table(schema, cube)?;
    require_table_column(table, cube, &cube.tenant_column)?;

    let mut members = HashSet::new();
    for measure in &cube.measures {
        if !is_valid_identifier(&measure.name) || !members.insert(measure.name.as_str()) {
            return Err(AppError::config(format!(
                "Invalid or duplicate member '{}.{}'",
                cube.name, measure.name
            )));
        }
        match (&measure.column, measure.measure_type) {
            (None, MeasureType::Count) => {}
            (None, other) => {
                return Err(AppError::config(format!(
                    "Measure '{}.{}' ({}) needs a column",
                    cube.name,
                    measure.name,
                    other.as_str()
                )));
            }
            (Some(column), measure_type) => {
                let column_type = require_table_column(table, cube, column)?;
                if measure_type.requires_numeric() && !column_type.is_numeric() {
                    return Err(AppError::config(format!(
                        "Measure '{}.{}' ({}) needs a numeric column, '{column}' is not",
                        cube.name,
                        measure.name,
                        measure_type.as_str()
                    )));
                }
            }
        }
    }

    for dimension in &cube.dimensions {
        if !is_valid_identifier(&dimension.name) || !members.insert(dimension.name.as_str()) {
            return Err(AppError::config(format!(
                "Invalid or duplicate member '{}.{}'",
                cube.name, dimension.name
            )));
        }
        require_table_column(table, cube, &dimension.column)?;
    }

    Ok(())
}

fn find_table<'a>(schema: &'a Schema, cube: &CubeDefinition) -> AppResult<&'a TableDefinition> {
    schema.find_table(&cube.sql_table).ok_or_else(|| {
        AppError::config(format!(
            "Cube '{}' references unknown table '{}'",
            cube.name, cube.sql_table
        ))
    })
}

fn require_table_column(
    table: &TableDefinition,
    cube: &CubeDefinition,
    column: &str,
) -> AppResult<ColumnType> {
    table
        .find_column(column)
        .map(|c| c.column_type)
        .ok_or_else(|| {
            AppError::config(format!(
                "Cube '{}' references unknown column '{}.{column}'",
                cube.name, table.name
            ))
        })
}

fn require_column(schema: &Schema, cube: &CubeDefinition, column: &str) -> AppResult<ColumnType> {
    require_table_column(find_table(schema, cube)?, cube, column)
}

fn cube_meta(cube: &CubeDefinition) -> Value {
    let measures: Vec<Value> = cube
        .measures
        .iter()
        .map(|m| {
            json!({
                "name": format!("{}.{}", cube.name, m.name),
                "title": m.title.as_deref().unwrap_or(&m.name),
                "shortTitle": m.name,
                "type": "number",
                "aggType": m.measure_type.as_str(),
            })
        })
        .collect();
    let dimensions: Vec<Value> = cube
        .dimensions
        .iter()
        .map(|d| {
            json!({
                "name": format!("{}.{}", cube.name, d.name),
                "title": d.title.as_deref().unwrap_or(&d.name),
                "shortTitle": d.name,
                "type": d.dimension_type.as_str(),
                "primaryKey": d.primary_key,
            })
        })
        .collect();
    let joins: Vec<Value> = cube
        .joins
        .iter()
        .map(|j| json!({ "name": j.target_cube, "relationship": j.relationship }))
        .collect();

    json!({
        "name": cube.name,
        "title": cube.display_title(),
        "description": cube.description,
        "measures": measures,
        "dimensions": dimensions,
        "joins": joins,
    })
}
