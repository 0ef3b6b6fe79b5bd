// ABOUTME: Declarative cube definitions with measures, dimensions and joins
// ABOUTME: Registered once at startup and shared read-only by every tenant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use serde::{Deserialize, Serialize};

/// Aggregation applied by a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasureType {
    /// `count(*)` or `count(column)`
    Count,
    /// `count(distinct column)`
    CountDistinct,
    /// `sum(column)`
    Sum,
    /// `avg(column)`
    Avg,
    /// `min(column)`
    Min,
    /// `max(column)`
    Max,
}

impl MeasureType {
    /// Name as exposed in metadata
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::CountDistinct => "countDistinct",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Whether the aggregation needs a numeric column
    #[must_use]
    pub const fn requires_numeric(self) -> bool {
        matches!(self, Self::Sum | Self::Avg)
    }
}

/// Semantic type of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    /// Free text
    String,
    /// Numeric value
    Number,
    /// Timestamp / date
    Time,
    /// true / false
    Boolean,
}

impl DimensionType {
    /// Name as exposed in metadata
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Time => "time",
            Self::Boolean => "boolean",
        }
    }
}

/// A measure: an aggregation over one column of the cube's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    /// Member name (without cube prefix)
    pub name: String,
    /// Human readable title
    pub title: Option<String>,
    /// Aggregation
    pub measure_type: MeasureType,
    /// Column aggregated; `None` only for `count`, meaning `count(*)`
    pub column: Option<String>,
}

/// A dimension: a column exposed for grouping and filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDefinition {
    /// Member name (without cube prefix)
    pub name: String,
    /// Human readable title
    pub title: Option<String>,
    /// Semantic type
    pub dimension_type: DimensionType,
    /// Backing column
    pub column: String,
    /// Whether this dimension is the cube's primary key
    pub primary_key: bool,
}

/// Cardinality of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinRelationship {
    /// Many rows of this cube point at one target row
    BelongsTo,
    /// One row of this cube matches at most one target row
    HasOne,
    /// One row of this cube matches many target rows
    HasMany,
}

/// Join from this cube to another registered cube
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDefinition {
    /// Name of the target cube
    pub target_cube: String,
    /// Relationship kind
    pub relationship: JoinRelationship,
    /// Column on this cube's table
    pub source_column: String,
    /// Column on the target cube's table
    pub target_column: String,
}

/// Declarative description of one analytical entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeDefinition {
    /// Cube name, used as the member prefix (`Employees.count`)
    pub name: String,
    /// Human readable title
    pub title: Option<String>,
    /// Description shown in metadata
    pub description: Option<String>,
    /// Backing table in the schema
    pub sql_table: String,
    /// Column holding the owning organisation id
    pub tenant_column: String,
    /// Measures in declaration order
    pub measures: Vec<MeasureDefinition>,
    /// Dimensions in declaration order
    pub dimensions: Vec<DimensionDefinition>,
    /// Joins to other cubes
    pub joins: Vec<JoinDefinition>,
}

impl CubeDefinition {
    /// Start a cube over `sql_table`, scoped to tenants by `tenant_column`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sql_table: impl Into<String>,
        tenant_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            sql_table: sql_table.into(),
            tenant_column: tenant_column.into(),
            measures: Vec::new(),
            dimensions: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a measure; `column` is ignored by validation only for `count`
    #[must_use]
    pub fn measure(
        mut self,
        name: impl Into<String>,
        measure_type: MeasureType,
        column: Option<&str>,
    ) -> Self {
        self.measures.push(MeasureDefinition {
            name: name.into(),
            title: None,
            measure_type,
            column: column.map(str::to_owned),
        });
        self
    }

    /// Add a dimension
    #[must_use]
    pub fn dimension(
        mut self,
        name: impl Into<String>,
        dimension_type: DimensionType,
        column: impl Into<String>,
    ) -> Self {
        self.dimensions.push(DimensionDefinition {
            name: name.into(),
            title: None,
            dimension_type,
            column: column.into(),
            primary_key: false,
        });
        self
    }

    /// Add the primary key dimension
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.dimensions.push(DimensionDefinition {
            name: name.into(),
            title: None,
            dimension_type: DimensionType::Number,
            column: column.into(),
            primary_key: true,
        });
        self
    }

    /// Add a join to another cube
    #[must_use]
    pub fn join(
        mut self,
        target_cube: impl Into<String>,
        relationship: JoinRelationship,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        self.joins.push(JoinDefinition {
            target_cube: target_cube.into(),
            relationship,
            source_column: source_column.into(),
            target_column: target_column.into(),
        });
        self
    }

    /// Find a measure by its short name
    #[must_use]
    pub fn find_measure(&self, name: &str) -> Option<&MeasureDefinition> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// Find a dimension by its short name
    #[must_use]
    pub fn find_dimension(&self, name: &str) -> Option<&DimensionDefinition> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Find the join leading to `target`
    #[must_use]
    pub fn find_join(&self, target: &str) -> Option<&JoinDefinition> {
        self.joins.iter().find(|j| j.target_cube == target)
    }

    /// Title, falling back to the cube name
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}
