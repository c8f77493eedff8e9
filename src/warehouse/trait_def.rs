use crate::models::{Metric, Property, PropertyValueOption};
use anyhow::Result;
use async_trait::async_trait;

use super::demo::CatalogSeed;

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Initialize the warehouse tables
    async fn init(&self) -> Result<()>;

    /// Whether the report component table holds no rows yet
    async fn is_empty(&self) -> Result<bool>;

    /// Load a catalog into the tables in a single transaction
    async fn seed(&self, catalog: &CatalogSeed) -> Result<()>;

    /// Distinct analysis types, alphabetically
    async fn analysis_types(&self) -> Result<Vec<String>>;

    /// Filter candidates available for an analysis type
    async fn filters_for_type(&self, analysis_type: &str) -> Result<Vec<Property>>;

    /// Segmentation candidates available for an analysis type
    async fn segmentations_for_type(&self, analysis_type: &str) -> Result<Vec<Property>>;

    /// Metrics available for an analysis type
    async fn metrics_for_type(&self, analysis_type: &str) -> Result<Vec<Metric>>;

    /// Enumerable values of a property, ordered by the lookup table's sort key
    async fn property_values(&self, property_id: &str) -> Result<Vec<PropertyValueOption>>;

    /// Filter candidates scoped to a single metric
    async fn filters_for_metric(&self, metric_id: &str) -> Result<Vec<Property>>;
}
