//! Recognised warehouse queries and their parameters.
//!
//! Requests arrive as a `queryName` plus loose string parameters; they are parsed
//! into a closed [`Query`] so every dispatch site is checked for exhaustiveness.

use std::collections::HashMap;
use thiserror::Error;

pub const QUERY_NAME_PARAM: &str = "queryName";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTypeParams {
    pub analysis_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyParams {
    pub property_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricParams {
    pub metric_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    AnalysisTypes,
    FiltersForType(AnalysisTypeParams),
    SegmentationsForType(AnalysisTypeParams),
    MetricsForType(AnalysisTypeParams),
    PropertyValues(PropertyParams),
    FiltersForMetric(MetricParams),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid queryName specified.")]
    InvalidQuery(String),

    #[error(
        "Missing required parameter{}: {parameter}",
        .query.map(|name| format!(" for {name}")).unwrap_or_default()
    )]
    MissingParameter {
        query: Option<&'static str>,
        parameter: &'static str,
    },

    #[error("Failed to query the warehouse.")]
    Backend { details: String },
}

impl QueryError {
    /// Wraps an infrastructure failure, keeping only its outermost message.
    pub fn backend(err: anyhow::Error) -> Self {
        QueryError::Backend {
            details: err.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidQuery(_) => "invalid_query",
            QueryError::MissingParameter { .. } => "missing_parameter",
            QueryError::Backend { .. } => "backend_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Backend { .. })
    }
}

impl Query {
    /// Parse a request's query string parameters, `queryName` included.
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let name = params
            .get(QUERY_NAME_PARAM)
            .filter(|name| !name.is_empty())
            .ok_or(QueryError::MissingParameter {
                query: None,
                parameter: QUERY_NAME_PARAM,
            })?;

        Self::from_name(name, params)
    }

    pub fn from_name(name: &str, params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let query = match name {
            "getAnalysisTypes" => Query::AnalysisTypes,
            "getFiltersForType" => Query::FiltersForType(AnalysisTypeParams {
                analysis_type: required(params, "getFiltersForType", "analysisType")?,
            }),
            "getSegmentationsForType" => Query::SegmentationsForType(AnalysisTypeParams {
                analysis_type: required(params, "getSegmentationsForType", "analysisType")?,
            }),
            "getMetricsForType" => Query::MetricsForType(AnalysisTypeParams {
                analysis_type: required(params, "getMetricsForType", "analysisType")?,
            }),
            "getPropertyValues" => Query::PropertyValues(PropertyParams {
                property_id: required(params, "getPropertyValues", "propertyId")?,
            }),
            "getFiltersForMetric" => Query::FiltersForMetric(MetricParams {
                metric_id: required(params, "getFiltersForMetric", "metricId")?,
            }),
            other => return Err(QueryError::InvalidQuery(other.to_string())),
        };

        Ok(query)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Query::AnalysisTypes => "getAnalysisTypes",
            Query::FiltersForType(_) => "getFiltersForType",
            Query::SegmentationsForType(_) => "getSegmentationsForType",
            Query::MetricsForType(_) => "getMetricsForType",
            Query::PropertyValues(_) => "getPropertyValues",
            Query::FiltersForMetric(_) => "getFiltersForMetric",
        }
    }

    /// Query string pairs that reproduce this query, `queryName` excluded.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Query::AnalysisTypes => vec![],
            Query::FiltersForType(p) | Query::SegmentationsForType(p) | Query::MetricsForType(p) => {
                vec![("analysisType", p.analysis_type.as_str())]
            }
            Query::PropertyValues(p) => vec![("propertyId", p.property_id.as_str())],
            Query::FiltersForMetric(p) => vec![("metricId", p.metric_id.as_str())],
        }
    }
}

fn required(
    params: &HashMap<String, String>,
    query: &'static str,
    parameter: &'static str,
) -> Result<String, QueryError> {
    params
        .get(parameter)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or(QueryError::MissingParameter {
            query: Some(query),
            parameter,
        })
}
