use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Comparison kind offered for a property. Unknown operator names coming from the
/// warehouse are kept verbatim and treated as single-valued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    IsNull,
    IsNotNull,
    Other(String),
}

/// Shape a filter value must take under a given operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// A set of strings (`equals`, `not_equals`)
    Set,
    /// A single free-form string
    Scalar,
    /// No value at all (`is_null`, `is_not_null`)
    Empty,
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::Other(name) => name,
        }
    }

    pub fn value_class(&self) -> ValueClass {
        match self {
            Operator::Equals | Operator::NotEquals => ValueClass::Set,
            Operator::IsNull | Operator::IsNotNull => ValueClass::Empty,
            _ => ValueClass::Scalar,
        }
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        match name.as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "is_null" => Operator::IsNull,
            "is_not_null" => Operator::IsNotNull,
            _ => Operator::Other(name),
        }
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::from(name.to_string())
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        match operator {
            Operator::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filterable or segmentable warehouse column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    pub property_label: String,
    #[serde(default)]
    pub property_scope_label: Option<String>,
    #[serde(default)]
    pub available_operators: Vec<Operator>,
}

/// A selectable measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Metric {
    pub metric_id: String,
    pub metric_label: String,
    #[serde(default)]
    pub metric_group_label: Option<String>,
    #[serde(default)]
    pub has_filters: bool,
}

/// One enumerable choice for a property's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PropertyValueOption {
    pub label: String,
    pub value: String,
}
