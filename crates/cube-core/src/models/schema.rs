// ABOUTME: Static table schema shared by the database handle and the query gateway
// ABOUTME: Maps table names to ordered column definitions used for cube validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use serde::{Deserialize, Serialize};

/// SQL column type, as far as cube validation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer types (`integer`, `bigint`, `serial`)
    Integer,
    /// Floating point / numeric
    Numeric,
    /// Text / varchar
    Text,
    /// Boolean
    Boolean,
    /// Timestamp or date
    Timestamp,
}

impl ColumnType {
    /// Whether aggregations like `sum`/`avg` make sense on this column
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Numeric)
    }
}

/// A single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// Column type
    pub column_type: ColumnType,
    /// Whether the column accepts NULL
    pub nullable: bool,
}

/// A table and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Start a table definition
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a NOT NULL column
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            column_type,
            nullable: false,
        });
        self
    }

    /// Add a nullable column
    #[must_use]
    pub fn nullable_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            column_type,
            nullable: true,
        });
        self
    }

    /// Look up a column by name
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Named entities mapped to their column definitions.
///
/// The same `Arc<Schema>` instance must be handed to both the database handle and
/// the gateway registrar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: Vec<TableDefinition>,
}

impl Schema {
    /// Empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table (replaces an existing table of the same name)
    #[must_use]
    pub fn table(mut self, table: TableDefinition) -> Self {
        self.tables.retain(|t| t.name != table.name);
        self.tables.push(table);
        self
    }

    /// Look up a table by name
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// All tables in declaration order
    #[must_use]
    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        let schema = Schema::new().table(
            TableDefinition::new("employees")
                .column("id", ColumnType::Integer)
                .nullable_column("email", ColumnType::Text),
        );

        let table = schema.find_table("employees");
        assert!(table.is_some());
        let email = table.and_then(|t| t.find_column("email"));
        assert!(email.is_some_and(|c| c.nullable));
        assert!(schema.find_table("missing").is_none());
    }

    #[test]
    fn redefining_table_replaces_it() {
        let schema = Schema::new()
            .table(TableDefinition::new("t").column("a", ColumnType::Text))
            .table(TableDefinition::new("t").column("b", ColumnType::Text));
        assert_eq!(schema.tables().len(), 1);
        assert!(schema.find_table("t").and_then(|t| t.find_column("b")).is_some());
    }
}
