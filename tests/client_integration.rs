//! Integration tests for the HTTP query client
//!
//! Each test serves the API on an ephemeral local port and talks to it with
//! `QueryClient`, both directly and as the catalog source of a report session.

use report_builder::api;
use report_builder::client::QueryClient;
use report_builder::dispatcher::QueryDispatcher;
use report_builder::models::Property;
use report_builder::report::{CatalogSource, FilterPatch, ReportSession};
use report_builder::warehouse::{demo_catalog, SqliteWarehouse, Warehouse};
use std::sync::Arc;

/// Start a server over the demo catalog and return its base URL
async fn spawn_server() -> String {
    let warehouse = SqliteWarehouse::new("sqlite::memory:", 1).await.unwrap();
    warehouse.init().await.unwrap();
    warehouse.seed(&demo_catalog()).await.unwrap();

    let dispatcher = Arc::new(QueryDispatcher::new(Arc::new(warehouse)));
    let app = api::create_api_router(dispatcher);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_run_named_query() {
    let client = QueryClient::new(&spawn_server().await).unwrap();

    let rows = client
        .run(
            "getSegmentationsForType",
            &[("analysisType".to_string(), "performance".to_string())],
        )
        .await
        .unwrap();

    let labels: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["property_label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Country", "Device Type"]);
}

#[tokio::test]
async fn test_client_surfaces_api_errors() {
    let client = QueryClient::new(&spawn_server().await).unwrap();

    let err = client.run("getPropertyValues", &[]).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("400"), "unexpected error: {message}");
    assert!(message.contains("propertyId"), "unexpected error: {message}");

    let err = client.run("getEverything", &[]).await.unwrap_err();
    assert!(err.to_string().contains("Invalid queryName specified."));
}

#[tokio::test]
async fn test_typed_catalog_fetches() {
    let client = QueryClient::new(&spawn_server().await).unwrap();

    let filters: Vec<Property> = client.filters_for_metric("16").await.unwrap();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].property_label, "Ad Platform");

    let metrics = client.metrics_for_type("spend_performance").await.unwrap();
    assert!(metrics[0].has_filters);
    assert!(!metrics[1].has_filters);
}

#[tokio::test]
async fn test_session_over_http() {
    let source: Arc<dyn CatalogSource> =
        Arc::new(QueryClient::new(&spawn_server().await).unwrap());
    let mut session = ReportSession::new();

    session.load_analysis_types(source.as_ref()).await;
    assert_eq!(session.analysis_types().len(), 7);

    assert!(session.change_analysis_type(source.as_ref(), "revenue").await);
    let stage = session.catalogs().filters[0].clone();
    let id = session.update(|store| store.add_filter(&stage)).unwrap();
    session.load_value_options(Arc::clone(&source)).await;
    assert_eq!(session.value_options(id).unwrap().len(), 4);

    session
        .update(|store| store.update_filter(id, FilterPatch::values(["closed_won"])))
        .unwrap();

    let json = serde_json::to_value(session.configuration()).unwrap();
    assert_eq!(json["filters"][0]["propertyLabel"], "Deal Stage");
    assert_eq!(json["filters"][0]["value"], serde_json::json!(["closed_won"]));
}

#[tokio::test]
async fn test_unreachable_server_degrades_to_empty_catalogs() {
    let source = QueryClient::new("http://127.0.0.1:9").unwrap();
    let mut session = ReportSession::new();

    assert!(session.change_analysis_type(&source, "journeys").await);
    assert!(session.catalogs().filters.is_empty());
    assert!(session.catalogs().metrics.is_empty());
    assert!(session.configuration().is_started());
}
