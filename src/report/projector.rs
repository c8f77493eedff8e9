//! Derives the serializable report configuration from the store.

use serde::Serialize;

use crate::models::Operator;
use crate::report::filter::{ActiveFilter, FilterValue};
use crate::report::store::{requires_attribution_model, requires_audience, SelectionStore};

pub const NOT_STARTED_MESSAGE: &str = "Select an analysis type to begin.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportConfiguration {
    NotStarted { message: String },
    Configured(ReportSnapshot),
}

impl ReportConfiguration {
    pub fn is_started(&self) -> bool {
        matches!(self, ReportConfiguration::Configured(_))
    }

    pub fn snapshot(&self) -> Option<&ReportSnapshot> {
        match self {
            ReportConfiguration::Configured(snapshot) => Some(snapshot),
            ReportConfiguration::NotStarted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub analysis_type: String,
    pub mandatory_selections: MandatoryView,
    pub filters: Vec<FilterView>,
    pub segmentation: Option<SegmentationView>,
    pub metrics: Vec<MetricView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MandatoryView {
    pub time_period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterView {
    pub property_id: String,
    pub property_label: String,
    pub operator: Operator,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationView {
    pub property_id: String,
    pub property_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricView {
    pub metric_id: String,
    pub metric_label: String,
    pub filters: Vec<FilterView>,
}

impl From<&ActiveFilter> for FilterView {
    fn from(filter: &ActiveFilter) -> Self {
        Self {
            property_id: filter.property_id.clone(),
            property_label: filter.property_label.clone(),
            operator: filter.operator.clone(),
            value: filter.value.clone(),
        }
    }
}

fn filter_views(filters: &[ActiveFilter]) -> Vec<FilterView> {
    filters.iter().map(FilterView::from).collect()
}

pub fn project(store: &SelectionStore) -> ReportConfiguration {
    let (Some(analysis_type), Some(mandatory)) = (store.analysis_type(), store.mandatory()) else {
        return ReportConfiguration::NotStarted {
            message: NOT_STARTED_MESSAGE.to_string(),
        };
    };

    let mandatory_selections = MandatoryView {
        time_period: mandatory.time_period.clone(),
        attribution_model: mandatory
            .attribution_model
            .clone()
            .filter(|_| requires_attribution_model(analysis_type)),
        audience: mandatory
            .audience
            .clone()
            .filter(|_| requires_audience(analysis_type)),
    };

    let segmentation = store.segmentation().map(|property| SegmentationView {
        property_id: property.property_id.clone(),
        property_label: property.property_label.clone(),
    });

    let metrics = store
        .metrics()
        .iter()
        .map(|selected| MetricView {
            metric_id: selected.metric.metric_id.clone(),
            metric_label: selected.metric.metric_label.clone(),
            filters: filter_views(selected.filters.as_slice()),
        })
        .collect();

    ReportConfiguration::Configured(ReportSnapshot {
        analysis_type: analysis_type.to_string(),
        mandatory_selections,
        filters: filter_views(store.filters()),
        segmentation,
        metrics,
    })
}
