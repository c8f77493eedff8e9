//! HTTP client of a running query API.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::{Metric, Property, PropertyValueOption};
use crate::query::{AnalysisTypeParams, MetricParams, PropertyParams, Query, QUERY_NAME_PARAM};
use crate::report::CatalogSource;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

pub struct QueryClient {
    http: Client,
    endpoint: Url,
}

impl QueryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid API URL {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("api/query").context("failed to build query endpoint URL")?;

        let http = Client::builder()
            .user_agent("report-builder-client/0.1.0")
            .build()
            .context("failed to build HTTP client for the query API")?;

        Ok(Self { http, endpoint })
    }

    /// Run a query by name with loose parameters, returning the raw JSON rows.
    pub async fn run(&self, name: &str, params: &[(String, String)]) -> Result<serde_json::Value> {
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.get(name, &pairs).await
    }

    pub async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        self.get(query.name(), &query.params()).await
    }

    async fn get<T: DeserializeOwned>(&self, name: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(QUERY_NAME_PARAM, name);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to request {name}"))?;

        let status = response.status();
        if !status.is_success() {
            match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    error,
                    details: Some(details),
                }) => bail!("{name} failed ({status}): {error} {details}"),
                Ok(ErrorBody { error, .. }) => bail!("{name} failed ({status}): {error}"),
                Err(_) => bail!("{name} failed ({status})"),
            }
        }

        response
            .json()
            .await
            .with_context(|| format!("failed to parse {name} response"))
    }
}

#[async_trait]
impl CatalogSource for QueryClient {
    async fn analysis_types(&self) -> Result<Vec<String>> {
        self.fetch(&Query::AnalysisTypes).await
    }

    async fn filters_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.fetch(&Query::FiltersForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await
    }

    async fn segmentations_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.fetch(&Query::SegmentationsForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await
    }

    async fn metrics_for_type(&self, analysis_type: &str) -> Result<Vec<Metric>> {
        self.fetch(&Query::MetricsForType(AnalysisTypeParams {
            analysis_type: analysis_type.to_string(),
        }))
        .await
    }

    async fn property_values(&self, property_id: &str) -> Result<Vec<PropertyValueOption>> {
        self.fetch(&Query::PropertyValues(PropertyParams {
            property_id: property_id.to_string(),
        }))
        .await
    }

    async fn filters_for_metric(&self, metric_id: &str) -> Result<Vec<Property>> {
        self.fetch(&Query::FiltersForMetric(MetricParams {
            metric_id: metric_id.to_string(),
        }))
        .await
    }
}
