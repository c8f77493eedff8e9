use anyhow::{Context, Result};
use sqlx::FromRow;

use crate::models::{Operator, Property};

/// Raw property row; operators are stored as a JSON array of names.
#[derive(Debug, FromRow)]
pub struct PropertyRow {
    pub property_id: String,
    pub property_label: String,
    pub property_scope_label: Option<String>,
    pub available_operators: String,
}

impl PropertyRow {
    pub fn into_property(self) -> Result<Property> {
        let available_operators: Vec<Operator> = serde_json::from_str(&self.available_operators)
            .with_context(|| {
                format!(
                    "invalid available_operators for property {}",
                    self.property_id
                )
            })?;

        Ok(Property {
            property_id: self.property_id,
            property_label: self.property_label,
            property_scope_label: self.property_scope_label,
            available_operators,
        })
    }
}

pub fn into_properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>> {
    rows.into_iter().map(PropertyRow::into_property).collect()
}

pub fn operators_json(operators: &[Operator]) -> Result<String> {
    Ok(serde_json::to_string(operators)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_property_parses_operator_list() {
        let row = PropertyRow {
            property_id: "1".to_string(),
            property_label: "Source".to_string(),
            property_scope_label: Some("UTM".to_string()),
            available_operators: r#"["equals","not_equals"]"#.to_string(),
        };

        let property = row.into_property().unwrap();
        assert_eq!(
            property.available_operators,
            vec![Operator::Equals, Operator::NotEquals]
        );
    }

    #[test]
    fn test_into_property_rejects_malformed_operators() {
        let row = PropertyRow {
            property_id: "9".to_string(),
            property_label: "Device Type".to_string(),
            property_scope_label: None,
            available_operators: "equals,contains".to_string(),
        };

        let err = row.into_property().unwrap_err();
        assert!(err.to_string().contains("property 9"));
    }
}
