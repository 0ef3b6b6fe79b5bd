// ABOUTME: Cube query shape accepted by the gateway load, sql and dry-run endpoints
// ABOUTME: Members are referenced as `Cube.member`; unknown fields are rejected
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::is_valid_identifier;
use crate::errors::ModelError;

/// Parsed `Cube.member` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Cube name
    pub cube: String,
    /// Member name within the cube
    pub member: String,
}

impl MemberRef {
    /// Parse a fully-qualified member name.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidMemberReference` unless the input is exactly
    /// two identifiers separated by one dot.
    pub fn parse(full_name: &str) -> Result<Self, ModelError> {
        let mut parts = full_name.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(cube), Some(member), None)
                if is_valid_identifier(cube) && is_valid_identifier(member) =>
            {
                Ok(Self {
                    cube: cube.to_owned(),
                    member: member.to_owned(),
                })
            }
            _ => Err(ModelError::InvalidMemberReference(full_name.to_owned())),
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.cube, self.member)
    }
}

/// Filter comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Member equals any of the values
    Equals,
    /// Member equals none of the values
    NotEquals,
    /// Case-insensitive substring match
    Contains,
    /// Negated substring match
    NotContains,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Member IS NOT NULL
    Set,
    /// Member IS NULL
    NotSet,
}

impl FilterOperator {
    /// Check the number of values supplied for this operator
    #[must_use]
    pub const fn accepts_value_count(self, count: usize) -> bool {
        match self {
            Self::Set | Self::NotSet => count == 0,
            Self::Equals | Self::NotEquals => count >= 1,
            Self::Contains | Self::NotContains | Self::Gt | Self::Gte | Self::Lt | Self::Lte => {
                count == 1
            }
        }
    }
}

/// One filter clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryFilter {
    /// Fully-qualified member
    pub member: String,
    /// Comparison
    pub operator: FilterOperator,
    /// Operands (strings, numbers or booleans)
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl OrderDirection {
    /// SQL keyword
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Analytical query over registered cubes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CubeQuery {
    /// Measures to aggregate
    #[serde(default)]
    pub measures: Vec<String>,
    /// Dimensions to group by
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Filters (AND-ed)
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    /// Ordering; accepts `[[member, dir], ...]` or `{member: dir}` (sorted by member)
    #[serde(default, deserialize_with = "deserialize_order")]
    pub order: Vec<(String, OrderDirection)>,
    /// Row limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Row offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl CubeQuery {
    /// All member names referenced anywhere in the query
    pub fn referenced_members(&self) -> impl Iterator<Item = &str> {
        self.measures
            .iter()
            .chain(self.dimensions.iter())
            .chain(self.filters.iter().map(|f| &f.member))
            .chain(self.order.iter().map(|(member, _)| member))
            .map(String::as_str)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderSpec {
    Pairs(Vec<(String, OrderDirection)>),
    Map(BTreeMap<String, OrderDirection>),
}

fn deserialize_order<'de, D>(deserializer: D) -> Result<Vec<(String, OrderDirection)>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OrderSpec::deserialize(deserializer)? {
        OrderSpec::Pairs(pairs) => pairs,
        OrderSpec::Map(map) => map.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_ref_parsing() {
        let member = MemberRef::parse("Employees.count");
        assert_eq!(
            member,
            Ok(MemberRef {
                cube: "Employees".to_owned(),
                member: "count".to_owned()
            })
        );
        assert!(MemberRef::parse("Employees").is_err());
        assert!(MemberRef::parse("a.b.c").is_err());
        assert!(MemberRef::parse("Employees.\"x").is_err());
        assert!(MemberRef::parse(".count").is_err());
    }

    #[test]
    fn order_accepts_pairs_and_map() {
        let from_pairs: CubeQuery = serde_json::from_value(json!({
            "measures": ["Employees.count"],
            "order": [["Employees.count", "desc"], ["Employees.name", "asc"]]
        }))
        .unwrap_or_default();
        assert_eq!(from_pairs.order.len(), 2);
        assert_eq!(from_pairs.order[0].1, OrderDirection::Desc);

        let from_map: CubeQuery = serde_json::from_value(json!({
            "measures": ["Employees.count"],
            "order": {"Employees.count": "asc"}
        }))
        .unwrap_or_default();
        assert_eq!(
            from_map.order,
            vec![("Employees.count".to_owned(), OrderDirection::Asc)]
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        let parsed = serde_json::from_value::<CubeQuery>(json!({
            "measures": ["Employees.count"],
            "timezone": "UTC"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn operator_arity() {
        assert!(FilterOperator::Set.accepts_value_count(0));
        assert!(!FilterOperator::Set.accepts_value_count(1));
        assert!(FilterOperator::Equals.accepts_value_count(3));
        assert!(!FilterOperator::Equals.accepts_value_count(0));
        assert!(FilterOperator::Gt.accepts_value_count(1));
        assert!(!FilterOperator::Gt.accepts_value_count(2));
    }
}
