// ABOUTME: Demo schema and cube catalog served by the bundled binary
// ABOUTME: Employees, departments and daily productivity, all scoped by organisation_id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use cube_core::models::{
    ColumnType, CubeDefinition, DimensionType, JoinRelationship, MeasureType, Schema,
    TableDefinition,
};

/// Column every demo table is scoped by
pub const TENANT_COLUMN: &str = "organisation_id";

/// Tables backing the demo cubes
#[must_use]
pub fn demo_schema() -> Schema {
    Schema::new()
        .table(
            TableDefinition::new("employees")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::Text)
                .nullable_column("email", ColumnType::Text)
                .column("active", ColumnType::Boolean)
                .nullable_column("department_id", ColumnType::Integer)
                .column(TENANT_COLUMN, ColumnType::Integer)
                .nullable_column("salary", ColumnType::Numeric)
                .column("created_at", ColumnType::Timestamp),
        )
        .table(
            TableDefinition::new("departments")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::Text)
                .column(TENANT_COLUMN, ColumnType::Integer)
                .nullable_column("budget", ColumnType::Numeric),
        )
        .table(
            TableDefinition::new("productivity")
                .column("id", ColumnType::Integer)
                .column("employee_id", ColumnType::Integer)
                .nullable_column("department_id", ColumnType::Integer)
                .column("date", ColumnType::Timestamp)
                .column("lines_of_code", ColumnType::Integer)
                .column("pull_requests", ColumnType::Integer)
                .column("deployments", ColumnType::Integer)
                .nullable_column("happiness_index", ColumnType::Integer)
                .column(TENANT_COLUMN, ColumnType::Integer),
        )
}

/// Cubes over [`demo_schema`], in registration order
#[must_use]
pub fn demo_cubes() -> Vec<CubeDefinition> {
    vec![employees(), departments(), productivity()]
}

fn employees() -> CubeDefinition {
    CubeDefinition::new("Employees", "employees", TENANT_COLUMN)
        .title("Employee Analytics")
        .description("Employee data and metrics")
        .primary_key("id", "id")
        .dimension("name", DimensionType::String, "name")
        .dimension("email", DimensionType::String, "email")
        .dimension("isActive", DimensionType::Boolean, "active")
        .dimension("createdAt", DimensionType::Time, "created_at")
        .measure("count", MeasureType::Count, None)
        .measure("totalSalary", MeasureType::Sum, Some("salary"))
        .measure("avgSalary", MeasureType::Avg, Some("salary"))
        .join("Departments", JoinRelationship::BelongsTo, "department_id", "id")
        .join("Productivity", JoinRelationship::HasMany, "id", "employee_id")
}

fn departments() -> CubeDefinition {
    CubeDefinition::new("Departments", "departments", TENANT_COLUMN)
        .title("Department Analytics")
        .description("Department information and budgets")
        .primary_key("id", "id")
        .dimension("name", DimensionType::String, "name")
        .measure("count", MeasureType::Count, None)
        .measure("totalBudget", MeasureType::Sum, Some("budget"))
        .measure("avgBudget", MeasureType::Avg, Some("budget"))
        .join("Employees", JoinRelationship::HasMany, "id", "department_id")
}

fn productivity() -> CubeDefinition {
    CubeDefinition::new("Productivity", "productivity", TENANT_COLUMN)
        .title("Productivity Analytics")
        .description("Daily developer productivity metrics")
        .primary_key("id", "id")
        .dimension("date", DimensionType::Time, "date")
        .dimension("happinessIndex", DimensionType::Number, "happiness_index")
        .measure("recordCount", MeasureType::Count, None)
        .measure("totalLinesOfCode", MeasureType::Sum, Some("lines_of_code"))
        .measure("avgLinesOfCode", MeasureType::Avg, Some("lines_of_code"))
        .measure("totalPullRequests", MeasureType::Sum, Some("pull_requests"))
        .measure("totalDeployments", MeasureType::Sum, Some("deployments"))
        .measure("avgHappinessIndex", MeasureType::Avg, Some("happiness_index"))
        .measure("workingEmployees", MeasureType::CountDistinct, Some("employee_id"))
        .join("Employees", JoinRelationship::BelongsTo, "employee_id", "id")
        .join("Departments", JoinRelationship::BelongsTo, "department_id", "id")
}
