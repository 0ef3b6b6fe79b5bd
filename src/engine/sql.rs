// ABOUTME: Reference PostgreSQL query engine translating validated cube queries to SQL
// ABOUTME: Every statement is scoped by a `$1` tenant predicate on each cube it touches
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! Reference SQL engine
//!
//! Generated statements have the shape
//!
//! ```text
//! SELECT <dimensions>, <measures>
//! FROM "table" AS "Primary"
//! LEFT JOIN "other" AS "Other" ON <join> AND "Other"."tenant" = $1
//! WHERE "Primary"."tenant" = $1 AND <dimension filters>
//! GROUP BY <dimensions>
//! HAVING <measure filters>
//! ORDER BY ... LIMIT n OFFSET m
//! ```
//!
//! Identifiers come from validated cube definitions and are always quoted;
//! filter operands are always bound as parameters.

use async_trait::async_trait;
use cube_core::models::{
    ColumnType, CubeDefinition, FilterOperator, MeasureDefinition, MeasureType, MemberRef,
    QueryFilter, Schema,
};
use serde_json::Value;
use tracing::debug;

use super::{EngineContext, EngineKind, QueryEngine, SqlStatement};
use crate::database_plugins::{DatabaseProvider, JsonRow, SqlParam};
use crate::errors::{AppError, AppResult};
use crate::gateway::{ResolvedMember, ValidatedQuery};

/// `PostgreSQL` implementation of [`QueryEngine`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlQueryEngine;

impl SqlQueryEngine {
    /// Create the engine
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryEngine for SqlQueryEngine {
    fn supports(&self, engine_kind: EngineKind) -> bool {
        engine_kind == EngineKind::Postgres
    }

    fn generate_sql(
        &self,
        ctx: &EngineContext<'_>,
        query: &ValidatedQuery,
    ) -> AppResult<SqlStatement> {
        if !self.supports(ctx.engine_kind) {
            return Err(AppError::engine(format!(
                "SQL engine cannot generate {} statements",
                ctx.engine_kind
            )));
        }
        StatementBuilder::new(ctx).build(query)
    }

    async fn load(
        &self,
        ctx: &EngineContext<'_>,
        query: &ValidatedQuery,
    ) -> AppResult<Vec<JsonRow>> {
        let statement = self.generate_sql(ctx, query)?;
        debug!(
            organisation_id = %ctx.security_context.organisation_id(),
            params = statement.params.len(),
            "Executing cube query"
        );
        ctx.database
            .query_rows(&statement.sql, &statement.params)
            .await
    }
}

/// Placeholder holding the organisation id
const TENANT_PLACEHOLDER: &str = "$1";

struct StatementBuilder<'a> {
    ctx: &'a EngineContext<'a>,
    params: Vec<SqlParam>,
}

impl<'a> StatementBuilder<'a> {
    fn new(ctx: &'a EngineContext<'a>) -> Self {
        let tenant = SqlParam::Int(ctx.security_context.organisation_id().as_i64());
        Self {
            ctx,
            params: vec![tenant],
        }
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn cube(&self, name: &str) -> AppResult<&'a CubeDefinition> {
        self.ctx
            .cubes
            .get(name)
            .ok_or_else(|| AppError::engine(format!("Cube '{name}' vanished after validation")))
    }

    fn resolve(&self, name: &str) -> AppResult<ResolvedMember<'a>> {
        self.ctx.cubes.resolve(&MemberRef::parse(name)?)
    }

    fn build(mut self, validated: &ValidatedQuery) -> AppResult<SqlStatement> {
        let query = validated.query();
        let primary = self.cube(validated.primary_cube())?;

        let mut select = Vec::new();
        let mut group_by = Vec::new();
        for name in &query.dimensions {
            let ResolvedMember::Dimension(cube, dimension) = self.resolve(name)? else {
                return Err(AppError::engine(format!("'{name}' is not a dimension")));
            };
            let expr = column_expr(&cube.name, &dimension.column);
            select.push(format!("{expr} AS {}", quote(name)));
            group_by.push(expr);
        }
        for name in &query.measures {
            let ResolvedMember::Measure(cube, measure) = self.resolve(name)? else {
                return Err(AppError::engine(format!("'{name}' is not a measure")));
            };
            select.push(format!("{} AS {}", measure_expr(cube, measure)?, quote(name)));
        }

        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            select.join(", "),
            quote(&primary.sql_table),
            quote(&primary.name)
        );

        for other in validated.referenced_cubes().iter().skip(1) {
            let target = self.cube(other)?;
            let join = primary.find_join(other).ok_or_else(|| {
                AppError::engine(format!("No join from '{}' to '{other}'", primary.name))
            })?;
            sql.push_str(&format!(
                " LEFT JOIN {} AS {} ON {} = {} AND {} = {TENANT_PLACEHOLDER}",
                quote(&target.sql_table),
                quote(&target.name),
                column_expr(&primary.name, &join.source_column),
                column_expr(&target.name, &join.target_column),
                column_expr(&target.name, &target.tenant_column),
            ));
        }

        let mut conditions = vec![format!(
            "{} = {TENANT_PLACEHOLDER}",
            column_expr(&primary.name, &primary.tenant_column)
        )];
        let mut having = Vec::new();
        for filter in &query.filters {
            match self.resolve(&filter.member)? {
                ResolvedMember::Dimension(cube, dimension) => {
                    let column_type = column_type(self.ctx.schema, cube, &dimension.column)?;
                    let expr = column_expr(&cube.name, &dimension.column);
                    conditions.push(self.filter_sql(&expr, column_type, filter)?);
                }
                ResolvedMember::Measure(cube, measure) => {
                    let expr = measure_expr(cube, measure)?;
                    having.push(self.filter_sql(&expr, ColumnType::Numeric, filter)?);
                }
            }
        }
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));

        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }
        if !having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having.join(" AND "));
        }
        if !query.order.is_empty() {
            let order: Vec<String> = query
                .order
                .iter()
                .map(|(member, direction)| format!("{} {}", quote(member), direction.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        sql.push_str(&format!(" LIMIT {}", validated.limit()));
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok(SqlStatement {
            sql,
            params: self.params,
        })
    }

    fn filter_sql(
        &mut self,
        expr: &str,
        column_type: ColumnType,
        filter: &QueryFilter,
    ) -> AppResult<String> {
        let operand = |builder: &mut Self, value: &Value| -> AppResult<String> {
            let (param, cast) = coerce(value, column_type, &filter.member)?;
            Ok(format!("{}{cast}", builder.bind(param)))
        };

        Ok(match filter.operator {
            FilterOperator::Set => format!("{expr} IS NOT NULL"),
            FilterOperator::NotSet => format!("{expr} IS NULL"),
            FilterOperator::Equals | FilterOperator::NotEquals => {
                let mut placeholders = Vec::with_capacity(filter.values.len());
                for value in &filter.values {
                    placeholders.push(operand(self, value)?);
                }
                let negate = filter.operator == FilterOperator::NotEquals;
                match (placeholders.as_slice(), negate) {
                    ([single], false) => format!("{expr} = {single}"),
                    ([single], true) => format!("({expr} IS NULL OR {expr} <> {single})"),
                    (many, false) => format!("{expr} IN ({})", many.join(", ")),
                    (many, true) => {
                        format!("({expr} IS NULL OR {expr} NOT IN ({}))", many.join(", "))
                    }
                }
            }
            FilterOperator::Contains | FilterOperator::NotContains => {
                let value = single_value(filter)?;
                let needle = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let placeholder = self.bind(SqlParam::Text(needle));
                let pattern = format!("('%' || {placeholder} || '%')");
                if filter.operator == FilterOperator::Contains {
                    format!("{expr}::text ILIKE {pattern}")
                } else {
                    format!("({expr} IS NULL OR {expr}::text NOT ILIKE {pattern})")
                }
            }
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
                let op = match filter.operator {
                    FilterOperator::Gt => ">",
                    FilterOperator::Gte => ">=",
                    FilterOperator::Lt => "<",
                    _ => "<=",
                };
                let placeholder = operand(self, single_value(filter)?)?;
                format!("{expr} {op} {placeholder}")
            }
        })
    }
}

fn single_value(filter: &QueryFilter) -> AppResult<&Value> {
    match filter.values.as_slice() {
        [value] => Ok(value),
        _ => Err(AppError::invalid_input(format!(
            "Filter on '{}' expects exactly one value",
            filter.member
        ))),
    }
}

/// Bind a JSON operand with the type the compared column expects
fn coerce(
    value: &Value,
    column_type: ColumnType,
    member: &str,
) -> AppResult<(SqlParam, &'static str)> {
    let mismatch = || {
        AppError::invalid_input(format!(
            "Value {value} is not valid for '{member}' ({column_type:?})"
        ))
    };
    let param = SqlParam::from_json(value)?;
    Ok(match (column_type, param) {
        (ColumnType::Integer | ColumnType::Numeric, p @ (SqlParam::Int(_) | SqlParam::Float(_))) => {
            (p, "")
        }
        (ColumnType::Integer, SqlParam::Text(s)) => (
            s.trim().parse().map(SqlParam::Int).map_err(|_| mismatch())?,
            "",
        ),
        (ColumnType::Numeric, SqlParam::Text(s)) => (
            s.trim().parse().map(SqlParam::Float).map_err(|_| mismatch())?,
            "",
        ),
        (ColumnType::Boolean, p @ SqlParam::Bool(_)) => (p, ""),
        (ColumnType::Boolean, SqlParam::Text(s)) => (
            s.trim().parse().map(SqlParam::Bool).map_err(|_| mismatch())?,
            "",
        ),
        (ColumnType::Text, p @ SqlParam::Text(_)) => (p, ""),
        (ColumnType::Text, p) => (SqlParam::Text(p.to_json().to_string()), ""),
        (ColumnType::Timestamp, p @ SqlParam::Text(_)) => (p, "::timestamptz"),
        _ => return Err(mismatch()),
    })
}

fn column_type(schema: &Schema, cube: &CubeDefinition, column: &str) -> AppResult<ColumnType> {
    schema
        .find_table(&cube.sql_table)
        .and_then(|table| table.find_column(column))
        .map(|c| c.column_type)
        .ok_or_else(|| {
            AppError::engine(format!(
                "Column '{}.{column}' missing from schema",
                cube.sql_table
            ))
        })
}

fn measure_expr(cube: &CubeDefinition, measure: &MeasureDefinition) -> AppResult<String> {
    let column = measure
        .column
        .as_deref()
        .map(|column| column_expr(&cube.name, column));
    Ok(match (measure.measure_type, column) {
        (MeasureType::Count, None) => "count(*)".to_owned(),
        (MeasureType::Count, Some(c)) => format!("count({c})"),
        (MeasureType::CountDistinct, Some(c)) => format!("count(DISTINCT {c})"),
        (MeasureType::Sum, Some(c)) => format!("sum({c})"),
        (MeasureType::Avg, Some(c)) => format!("avg({c})"),
        (MeasureType::Min, Some(c)) => format!("min({c})"),
        (MeasureType::Max, Some(c)) => format!("max({c})"),
        (other, None) => {
            return Err(AppError::engine(format!(
                "Measure '{}.{}' ({}) has no column",
                cube.name,
                measure.name,
                other.as_str()
            )))
        }
    })
}

fn column_expr(alias: &str, column: &str) -> String {
    format!("{}.{}", quote(alias), quote(column))
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
