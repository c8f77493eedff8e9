//! Report session: the store plus the catalogs it is edited against.
//!
//! Catalog loading is split into request / fetch / apply so responses can arrive
//! after the user has moved on. Each analysis type change bumps a generation
//! counter; batches carrying an older generation are dropped on arrival.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{Metric, Property, PropertyValueOption, ValueClass};
use crate::report::filter::FilterId;
use crate::report::projector::{project, ReportConfiguration};
use crate::report::store::SelectionStore;

/// Where report catalogs come from: the HTTP API or an in-process dispatcher.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn analysis_types(&self) -> Result<Vec<String>>;

    async fn filters_for_type(&self, analysis_type: &str) -> Result<Vec<Property>>;

    async fn segmentations_for_type(&self, analysis_type: &str) -> Result<Vec<Property>>;

    async fn metrics_for_type(&self, analysis_type: &str) -> Result<Vec<Metric>>;

    async fn property_values(&self, property_id: &str) -> Result<Vec<PropertyValueOption>>;

    async fn filters_for_metric(&self, metric_id: &str) -> Result<Vec<Property>>;
}

/// Candidates offered for the current analysis type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogs {
    pub filters: Vec<Property>,
    pub segmentations: Vec<Property>,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    generation: u64,
    analysis_type: String,
}

impl CatalogRequest {
    pub fn analysis_type(&self) -> &str {
        &self.analysis_type
    }
}

#[derive(Debug, Clone)]
pub struct CatalogBatch {
    request: CatalogRequest,
    catalogs: Catalogs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesRequest {
    pub filter_id: FilterId,
    pub property_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFiltersRequest {
    generation: u64,
    metric_id: String,
}

impl MetricFiltersRequest {
    pub fn metric_id(&self) -> &str {
        &self.metric_id
    }
}

#[derive(Debug, Clone)]
pub struct ValuesResponse {
    pub request: ValuesRequest,
    pub options: Vec<PropertyValueOption>,
}

fn or_empty<T>(result: Result<Vec<T>>, what: &str, key: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(key, error = %e, "failed to fetch {what}, continuing with none");
        Vec::new()
    })
}

/// Fetch the three catalogs of an analysis type concurrently. Failures degrade to
/// empty catalogs.
pub async fn fetch_catalogs(source: &dyn CatalogSource, request: CatalogRequest) -> CatalogBatch {
    let analysis_type = request.analysis_type.as_str();
    let (filters, segmentations, metrics) = tokio::join!(
        source.filters_for_type(analysis_type),
        source.segmentations_for_type(analysis_type),
        source.metrics_for_type(analysis_type),
    );

    let catalogs = Catalogs {
        filters: or_empty(filters, "filters", analysis_type),
        segmentations: or_empty(segmentations, "segmentations", analysis_type),
        metrics: or_empty(metrics, "metrics", analysis_type),
    };

    CatalogBatch { request, catalogs }
}

/// Fetch value options for one filter. No options means free-text entry.
pub async fn fetch_values(source: &dyn CatalogSource, request: ValuesRequest) -> ValuesResponse {
    let options = or_empty(
        source.property_values(&request.property_id).await,
        "property values",
        &request.property_id,
    );

    ValuesResponse { request, options }
}

pub struct ReportSession {
    store: SelectionStore,
    analysis_types: Vec<String>,
    generation: u64,
    catalogs: Catalogs,
    loading: bool,
    value_options: HashMap<FilterId, Vec<PropertyValueOption>>,
    metric_filter_catalogs: HashMap<String, Vec<Property>>,
    updates: watch::Sender<ReportConfiguration>,
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSession {
    pub fn new() -> Self {
        let store = SelectionStore::new();
        let (updates, _) = watch::channel(project(&store));

        Self {
            store,
            analysis_types: Vec::new(),
            generation: 0,
            catalogs: Catalogs::default(),
            loading: false,
            value_options: HashMap::new(),
            metric_filter_catalogs: HashMap::new(),
            updates,
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn analysis_types(&self) -> &[String] {
        &self.analysis_types
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn value_options(&self, filter_id: FilterId) -> Option<&[PropertyValueOption]> {
        self.value_options.get(&filter_id).map(Vec::as_slice)
    }

    pub fn metric_filter_catalog(&self, metric_id: &str) -> Option<&[Property]> {
        self.metric_filter_catalogs
            .get(metric_id)
            .map(Vec::as_slice)
    }

    pub fn configuration(&self) -> ReportConfiguration {
        project(&self.store)
    }

    /// Receives the fresh projection after every change.
    pub fn subscribe(&self) -> watch::Receiver<ReportConfiguration> {
        self.updates.subscribe()
    }

    /// Run a store transition, then drop state belonging to vanished filters or
    /// metrics and publish the new projection.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut SelectionStore) -> R) -> R {
        let result = f(&mut self.store);

        let store = &self.store;
        self.value_options
            .retain(|id, _| store.find_filter(*id).is_some());
        self.metric_filter_catalogs
            .retain(|metric_id, _| store.is_metric_selected(metric_id));

        self.publish();
        result
    }

    /// Switch analysis type and hand back the catalog request to fetch.
    pub fn select_analysis_type(&mut self, analysis_type: impl Into<String>) -> CatalogRequest {
        let analysis_type = analysis_type.into();
        self.store.select_analysis_type(analysis_type.clone());

        self.generation += 1;
        self.catalogs = Catalogs::default();
        self.loading = true;
        self.value_options.clear();
        self.metric_filter_catalogs.clear();
        self.publish();

        CatalogRequest {
            generation: self.generation,
            analysis_type,
        }
    }

    /// Apply a fetched batch unless a newer analysis type was selected meanwhile.
    pub fn apply_catalogs(&mut self, batch: CatalogBatch) -> bool {
        if batch.request.generation != self.generation {
            debug!(
                analysis_type = %batch.request.analysis_type,
                "discarding catalogs for superseded analysis type"
            );
            return false;
        }

        self.catalogs = batch.catalogs;
        self.loading = false;
        true
    }

    pub async fn load_analysis_types(&mut self, source: &dyn CatalogSource) {
        self.analysis_types = or_empty(source.analysis_types().await, "analysis types", "*");
    }

    pub async fn change_analysis_type(
        &mut self,
        source: &dyn CatalogSource,
        analysis_type: impl Into<String>,
    ) -> bool {
        let request = self.select_analysis_type(analysis_type);
        let batch = fetch_catalogs(source, request).await;
        self.apply_catalogs(batch)
    }

    /// Value requests for every filter (top-level and per metric) that takes a
    /// value and has no options loaded yet.
    pub fn pending_value_requests(&self) -> Vec<ValuesRequest> {
        let metric_filters = self
            .store
            .metrics()
            .iter()
            .flat_map(|selected| selected.filters.as_slice());

        self.store
            .filters()
            .iter()
            .chain(metric_filters)
            .filter(|f| f.operator.value_class() != ValueClass::Empty)
            .filter(|f| !self.value_options.contains_key(&f.id))
            .map(|f| ValuesRequest {
                filter_id: f.id,
                property_id: f.property_id.clone(),
            })
            .collect()
    }

    /// Store value options unless the filter has since been removed.
    pub fn apply_values(&mut self, response: ValuesResponse) -> bool {
        let ValuesResponse { request, options } = response;
        let still_present = self
            .store
            .find_filter(request.filter_id)
            .is_some_and(|f| f.property_id == request.property_id);

        if !still_present {
            debug!(filter_id = %request.filter_id, "discarding values for removed filter");
            return false;
        }

        self.value_options.insert(request.filter_id, options);
        true
    }

    /// Fetch value options for all pending filters in parallel, applying each
    /// response as soon as it arrives.
    pub async fn load_value_options(&mut self, source: Arc<dyn CatalogSource>) {
        let mut fetches = JoinSet::new();
        for request in self.pending_value_requests() {
            let source = Arc::clone(&source);
            fetches.spawn(async move { fetch_values(source.as_ref(), request).await });
        }

        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(response) => {
                    self.apply_values(response);
                }
                Err(e) => warn!(error = %e, "property value fetch task failed"),
            }
        }
    }

    pub fn request_metric_filters(&self, metric_id: impl Into<String>) -> MetricFiltersRequest {
        MetricFiltersRequest {
            generation: self.generation,
            metric_id: metric_id.into(),
        }
    }

    /// Store a metric's filter catalog unless the analysis type changed or the
    /// metric was deselected meanwhile.
    pub fn apply_metric_filters(
        &mut self,
        request: MetricFiltersRequest,
        properties: Vec<Property>,
    ) -> bool {
        if request.generation != self.generation {
            debug!(
                metric_id = %request.metric_id,
                "discarding filter catalog for superseded analysis type"
            );
            return false;
        }
        if !self.store.is_metric_selected(&request.metric_id) {
            debug!(metric_id = %request.metric_id, "discarding filter catalog for deselected metric");
            return false;
        }

        self.metric_filter_catalogs
            .insert(request.metric_id, properties);
        true
    }

    pub async fn load_metric_filters(&mut self, source: &dyn CatalogSource, metric_id: &str) -> bool {
        let request = self.request_metric_filters(metric_id);
        let properties = or_empty(
            source.filters_for_metric(metric_id).await,
            "metric filters",
            metric_id,
        );
        self.apply_metric_filters(request, properties)
    }

    fn publish(&self) {
        self.updates.send_replace(project(&self.store));
    }
}
