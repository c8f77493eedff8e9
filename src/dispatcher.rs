//! Executes parsed queries against the warehouse and reshapes the rows.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::models::{Metric, Property, PropertyValueOption};
use crate::query::{AnalysisTypeParams, MetricParams, PropertyParams, Query, QueryError};
use crate::report::CatalogSource;
use crate::warehouse::Warehouse;

/// Rows returned for a query. Serializes as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    AnalysisTypes(Vec<String>),
    Properties(Vec<Property>),
    Metrics(Vec<Metric>),
    PropertyValues(Vec<PropertyValueOption>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::AnalysisTypes(rows) => rows.len(),
            QueryResult::Properties(rows) => rows.len(),
            QueryResult::Metrics(rows) => rows.len(),
            QueryResult::PropertyValues(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_analysis_types(self) -> Result<Vec<String>> {
        match self {
            QueryResult::AnalysisTypes(rows) => Ok(rows),
            other => bail!("expected analysis types, got {other:?}"),
        }
    }

    fn into_properties(self) -> Result<Vec<Property>> {
        match self {
            QueryResult::Properties(rows) => Ok(rows),
            other => bail!("expected properties, got {other:?}"),
        }
    }

    fn into_metrics(self) -> Result<Vec<Metric>> {
        match self {
            QueryResult::Metrics(rows) => Ok(rows),
            other => bail!("expected metrics, got {other:?}"),
        }
    }

    fn into_property_values(self) -> Result<Vec<PropertyValueOption>> {
        match self {
            QueryResult::PropertyValues(rows) => Ok(rows),
            other => bail!("expected property values, got {other:?}"),
        }
    }
}

/// One per process; shared by every request handler.
pub struct QueryDispatcher {
    warehouse: Arc<dyn Warehouse>,
}

impl QueryDispatcher {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }

    /// Parse `queryName` and its parameters, then execute.
    pub async fn execute_named(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<QueryResult, QueryError> {
        let query = Query::parse(params)?;
        self.execute(&query).await
    }

    pub async fn execute(&self, query: &Query) -> Result<QueryResult, QueryError> {
        debug!(query = query.name(), "executing warehouse query");

        let result = match query {
            Query::AnalysisTypes => self
                .warehouse
                .analysis_types()
                .await
                .map(QueryResult::AnalysisTypes),
            Query::FiltersForType(p) => self
                .warehouse
                .filters_for_type(&p.analysis_type)
                .await
                .map(QueryResult::Properties),
            Query::SegmentationsForType(p) => self
                .warehouse
                .segmentations_for_type(&p.analysis_type)
                .await
                .map(QueryResult::Properties),
            Query::MetricsForType(p) => self
                .warehouse
                .metrics_for_type(&p.analysis_type)
                .await
                .map(QueryResult::Metrics),
            Query::PropertyValues(p) => self
                .warehouse
                .property_values(&p.property_id)
                .await
                .map(QueryResult::PropertyValues),
            Query::FiltersForMetric(p) => self
                .warehouse
                .filters_for_metric(&p.metric_id)
                .await
                .map(QueryResult::Properties),
        };

        result.map_err(|e| {
            error!(query = query.name(), error = ?e, "warehouse query failed");
            QueryError::backend(e)
        })
    }
}

#[async_trait]
impl CatalogSource for QueryDispatcher {
    async fn analysis_types(&self) -> Result<Vec<String>> {
        self.execute(&Query::AnalysisTypes)
            .await?
            .into_analysis_types()
    }

    async fn filters_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.execute(&Query::FiltersForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await?
        .into_properties()
    }

    async fn segmentations_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.execute(&Query::SegmentationsForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await?
        .into_properties()
    }

    async fn metrics_for_type(&self, analysis_type: &str) -> Result<Vec<Metric>> {
        self.execute(&Query::MetricsForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await?
        .into_metrics()
    }

    async fn property_values(&self, property_id: &str) -> Result<Vec<PropertyValueOption>> {
        self.execute(&Query::PropertyValues(PropertyParams {
            property_id: property_id.to_string(),
        }))
        .await?
        .into_property_values()
    }

    async fn filters_for_metric(&self, metric_id: &str) -> Result<Vec<Property>> {
        self.execute(&Query::FiltersForMetric(MetricParams {
            metric_id: metric_id.to_string(),
        }))
        .await?
        .into_properties()
    }
}
