use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Operator, Property, ValueClass};
use crate::report::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterId(Uuid);

impl FilterId {
    fn fresh() -> Self {
        FilterId(Uuid::new_v4())
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filter value; its shape is dictated by the operator's [`ValueClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Set(Vec<String>),
    Scalar(String),
    Empty,
}

impl FilterValue {
    pub fn empty_for(class: ValueClass) -> Self {
        match class {
            ValueClass::Set => FilterValue::Set(Vec::new()),
            ValueClass::Scalar => FilterValue::Scalar(String::new()),
            ValueClass::Empty => FilterValue::Empty,
        }
    }

    pub fn fits(&self, class: ValueClass) -> bool {
        matches!(
            (self, class),
            (FilterValue::Set(_), ValueClass::Set)
                | (FilterValue::Scalar(_), ValueClass::Scalar)
                | (FilterValue::Empty, ValueClass::Empty)
        )
    }

    /// Drops repeated set members, keeping the first occurrence.
    fn normalized(self) -> Self {
        match self {
            FilterValue::Set(values) => {
                let mut unique: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                FilterValue::Set(unique)
            }
            other => other,
        }
    }
}

/// Partial update for an [`ActiveFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub operator: Option<Operator>,
    pub value: Option<FilterValue>,
}

impl FilterPatch {
    pub fn operator(operator: impl Into<Operator>) -> Self {
        Self {
            operator: Some(operator.into()),
            value: None,
        }
    }

    pub fn value(value: FilterValue) -> Self {
        Self {
            operator: None,
            value: Some(value),
        }
    }

    pub fn values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::value(FilterValue::Set(values.into_iter().map(Into::into).collect()))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::value(FilterValue::Scalar(value.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
    pub id: FilterId,
    pub property_id: String,
    pub property_label: String,
    pub operator: Operator,
    pub value: FilterValue,
    pub available_operators: Vec<Operator>,
}

impl ActiveFilter {
    /// Instantiate from a property using its first operator and an empty value.
    pub fn from_property(property: &Property) -> Result<Self, StoreError> {
        let operator = property
            .available_operators
            .first()
            .cloned()
            .ok_or_else(|| StoreError::NoOperators(property.property_id.clone()))?;

        Ok(Self {
            id: FilterId::fresh(),
            property_id: property.property_id.clone(),
            property_label: property.property_label.clone(),
            value: FilterValue::empty_for(operator.value_class()),
            operator,
            available_operators: property.available_operators.clone(),
        })
    }

    /// Validates the whole patch before touching the filter.
    pub fn apply(&mut self, patch: FilterPatch) -> Result<(), StoreError> {
        let operator = match patch.operator {
            Some(operator) if !self.available_operators.contains(&operator) => {
                return Err(StoreError::OperatorNotAvailable {
                    property_id: self.property_id.clone(),
                    operator,
                });
            }
            Some(operator) => operator,
            None => self.operator.clone(),
        };

        let class = operator.value_class();
        let value = match patch.value {
            Some(value) if !value.fits(class) => return Err(StoreError::ValueShape(operator)),
            Some(value) => value.normalized(),
            None if class == self.operator.value_class() => self.value.clone(),
            None => FilterValue::empty_for(class),
        };

        self.operator = operator;
        self.value = value;
        Ok(())
    }
}

/// Insertion-ordered filters, used both at the top level and inside each metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    filters: Vec<ActiveFilter>,
}

impl FilterList {
    pub fn as_slice(&self) -> &[ActiveFilter] {
        &self.filters
    }

    pub fn get(&self, id: FilterId) -> Option<&ActiveFilter> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn add(&mut self, property: &Property) -> Result<FilterId, StoreError> {
        let filter = ActiveFilter::from_property(property)?;
        let id = filter.id;
        self.filters.push(filter);
        Ok(id)
    }

    pub fn update(&mut self, id: FilterId, patch: FilterPatch) -> Result<(), StoreError> {
        self.filters
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::UnknownFilter(id))?
            .apply(patch)
    }

    pub fn remove(&mut self, id: FilterId) -> Result<ActiveFilter, StoreError> {
        let index = self
            .filters
            .iter()
            .position(|f| f.id == id)
            .ok_or(StoreError::UnknownFilter(id))?;
        Ok(self.filters.remove(index))
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
