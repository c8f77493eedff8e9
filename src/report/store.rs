//! Selection Store: the only mutation surface of a report being configured.
//!
//! Every transition either applies completely or returns a [`StoreError`] and leaves
//! the state as it was.

use thiserror::Error;

use crate::models::{Metric, Operator, Property};
use crate::report::filter::{ActiveFilter, FilterId, FilterList, FilterPatch};

pub const DEFAULT_TIME_PERIOD: &str = "last_30_days";
pub const DEFAULT_ATTRIBUTION_MODEL: &str = "linear";
pub const DEFAULT_AUDIENCE: &str = "all_accounts";

const ATTRIBUTION_MODEL_TYPES: &[&str] = &["spend_performance", "session_activity_performance"];
const AUDIENCE_TYPES: &[&str] = &["audience_engagement"];

pub fn requires_attribution_model(analysis_type: &str) -> bool {
    ATTRIBUTION_MODEL_TYPES.contains(&analysis_type)
}

pub fn requires_audience(analysis_type: &str) -> bool {
    AUDIENCE_TYPES.contains(&analysis_type)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no analysis type selected")]
    NoAnalysisType,
    #[error("filter {0} not found")]
    UnknownFilter(FilterId),
    #[error("metric {0} is not selected")]
    MetricNotSelected(String),
    #[error("metric {0} does not accept filters")]
    MetricNotFilterable(String),
    #[error("property {0} exposes no operators")]
    NoOperators(String),
    #[error("operator {operator} is not available for property {property_id}")]
    OperatorNotAvailable {
        property_id: String,
        operator: Operator,
    },
    #[error("value does not match the shape required by operator {0}")]
    ValueShape(Operator),
    #[error("{field} does not apply to analysis type {analysis_type}")]
    NotApplicable {
        field: &'static str,
        analysis_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatorySelections {
    pub time_period: String,
    pub attribution_model: Option<String>,
    pub audience: Option<String>,
}

impl MandatorySelections {
    pub fn defaults_for(analysis_type: &str) -> Self {
        Self {
            time_period: DEFAULT_TIME_PERIOD.to_string(),
            attribution_model: requires_attribution_model(analysis_type)
                .then(|| DEFAULT_ATTRIBUTION_MODEL.to_string()),
            audience: requires_audience(analysis_type).then(|| DEFAULT_AUDIENCE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedMetric {
    pub metric: Metric,
    pub filters: FilterList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    analysis_type: String,
    mandatory: MandatorySelections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selection: Option<Selection>,
    filters: FilterList,
    segmentation: Option<Property>,
    metrics: Vec<SelectedMetric>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis_type(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.analysis_type.as_str())
    }

    pub fn mandatory(&self) -> Option<&MandatorySelections> {
        self.selection.as_ref().map(|s| &s.mandatory)
    }

    pub fn filters(&self) -> &[ActiveFilter] {
        self.filters.as_slice()
    }

    pub fn segmentation(&self) -> Option<&Property> {
        self.segmentation.as_ref()
    }

    pub fn metrics(&self) -> &[SelectedMetric] {
        &self.metrics
    }

    pub fn metric(&self, metric_id: &str) -> Option<&SelectedMetric> {
        self.metrics.iter().find(|m| m.metric.metric_id == metric_id)
    }

    pub fn is_metric_selected(&self, metric_id: &str) -> bool {
        self.metric(metric_id).is_some()
    }

    /// Looks a filter up among the top-level filters and every metric's filters.
    pub fn find_filter(&self, id: FilterId) -> Option<&ActiveFilter> {
        self.filters.get(id).or_else(|| {
            self.metrics
                .iter()
                .find_map(|selected| selected.filters.get(id))
        })
    }

    /// Switch analysis type; everything that depends on it starts over.
    pub fn select_analysis_type(&mut self, analysis_type: impl Into<String>) {
        let analysis_type = analysis_type.into();
        self.selection = Some(Selection {
            mandatory: MandatorySelections::defaults_for(&analysis_type),
            analysis_type,
        });
        self.filters.clear();
        self.segmentation = None;
        self.metrics.clear();
    }

    pub fn set_time_period(&mut self, time_period: impl Into<String>) -> Result<(), StoreError> {
        let selection = self.selection_mut()?;
        selection.mandatory.time_period = time_period.into();
        Ok(())
    }

    pub fn set_attribution_model(&mut self, model: impl Into<String>) -> Result<(), StoreError> {
        let selection = self.selection_mut()?;
        if !requires_attribution_model(&selection.analysis_type) {
            return Err(StoreError::NotApplicable {
                field: "attributionModel",
                analysis_type: selection.analysis_type.clone(),
            });
        }
        selection.mandatory.attribution_model = Some(model.into());
        Ok(())
    }

    pub fn set_audience(&mut self, audience: impl Into<String>) -> Result<(), StoreError> {
        let selection = self.selection_mut()?;
        if !requires_audience(&selection.analysis_type) {
            return Err(StoreError::NotApplicable {
                field: "audience",
                analysis_type: selection.analysis_type.clone(),
            });
        }
        selection.mandatory.audience = Some(audience.into());
        Ok(())
    }

    pub fn add_filter(&mut self, property: &Property) -> Result<FilterId, StoreError> {
        self.selection_mut()?;
        self.filters.add(property)
    }

    pub fn update_filter(&mut self, id: FilterId, patch: FilterPatch) -> Result<(), StoreError> {
        self.filters.update(id, patch)
    }

    pub fn remove_filter(&mut self, id: FilterId) -> Result<(), StoreError> {
        self.filters.remove(id).map(|_| ())
    }

    /// Replace the segmentation; `None` clears it.
    pub fn set_segmentation(&mut self, property: Option<Property>) -> Result<(), StoreError> {
        if property.is_some() {
            self.selection_mut()?;
        }
        self.segmentation = property;
        Ok(())
    }

    /// Returns whether the metric is selected after the toggle.
    pub fn toggle_metric(&mut self, metric: &Metric) -> Result<bool, StoreError> {
        self.selection_mut()?;

        match self
            .metrics
            .iter()
            .position(|m| m.metric.metric_id == metric.metric_id)
        {
            Some(index) => {
                self.metrics.remove(index);
                Ok(false)
            }
            None => {
                self.metrics.push(SelectedMetric {
                    metric: metric.clone(),
                    filters: FilterList::default(),
                });
                Ok(true)
            }
        }
    }

    pub fn add_metric_filter(
        &mut self,
        metric_id: &str,
        property: &Property,
    ) -> Result<FilterId, StoreError> {
        let selected = self.metric_mut(metric_id)?;
        if !selected.metric.has_filters {
            return Err(StoreError::MetricNotFilterable(metric_id.to_string()));
        }
        selected.filters.add(property)
    }

    pub fn update_metric_filter(
        &mut self,
        metric_id: &str,
        filter_id: FilterId,
        patch: FilterPatch,
    ) -> Result<(), StoreError> {
        self.metric_mut(metric_id)?.filters.update(filter_id, patch)
    }

    pub fn remove_metric_filter(
        &mut self,
        metric_id: &str,
        filter_id: FilterId,
    ) -> Result<(), StoreError> {
        self.metric_mut(metric_id)?
            .filters
            .remove(filter_id)
            .map(|_| ())
    }

    fn selection_mut(&mut self) -> Result<&mut Selection, StoreError> {
        self.selection.as_mut().ok_or(StoreError::NoAnalysisType)
    }

    fn metric_mut(&mut self, metric_id: &str) -> Result<&mut SelectedMetric, StoreError> {
        self.metrics
            .iter_mut()
            .find(|m| m.metric.metric_id == metric_id)
            .ok_or_else(|| StoreError::MetricNotSelected(metric_id.to_string()))
    }
}
