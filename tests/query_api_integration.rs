//! Integration tests for the query API
//!
//! These drive the axum router end-to-end over an in-memory SQLite warehouse
//! seeded with the demo catalog.

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use report_builder::api;
use report_builder::dispatcher::QueryDispatcher;
use report_builder::models::{Metric, Property, PropertyValueOption};
use report_builder::warehouse::{demo_catalog, CatalogSeed, SqliteWarehouse, Warehouse};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create a seeded test warehouse
async fn create_test_warehouse() -> Arc<dyn Warehouse> {
    let warehouse = SqliteWarehouse::new("sqlite::memory:", 1).await.unwrap();
    warehouse.init().await.unwrap();
    warehouse.seed(&demo_catalog()).await.unwrap();
    Arc::new(warehouse)
}

async fn create_test_app() -> Router {
    let dispatcher = QueryDispatcher::new(create_test_warehouse().await);
    api::create_api_router(Arc::new(dispatcher))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Warehouse that fails every catalog query
struct UnreachableWarehouse;

#[async_trait]
impl Warehouse for UnreachableWarehouse {
    async fn init(&self) -> Result<()> {
        Ok(())
    }
    async fn is_empty(&self) -> Result<bool> {
        Ok(true)
    }
    async fn seed(&self, _catalog: &CatalogSeed) -> Result<()> {
        Ok(())
    }
    async fn analysis_types(&self) -> Result<Vec<String>> {
        bail!("connection refused")
    }
    async fn filters_for_type(&self, _analysis_type: &str) -> Result<Vec<Property>> {
        bail!("connection refused")
    }
    async fn segmentations_for_type(&self, _analysis_type: &str) -> Result<Vec<Property>> {
        bail!("connection refused")
    }
    async fn metrics_for_type(&self, _analysis_type: &str) -> Result<Vec<Metric>> {
        bail!("connection refused")
    }
    async fn property_values(&self, _property_id: &str) -> Result<Vec<PropertyValueOption>> {
        bail!("connection refused")
    }
    async fn filters_for_metric(&self, _metric_id: &str) -> Result<Vec<Property>> {
        bail!("connection refused")
    }
}

#[tokio::test]
async fn test_get_analysis_types_returns_strings() {
    let (status, json) = get(create_test_app().await, "/api/query?queryName=getAnalysisTypes").await;

    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(types.len(), 7);
    assert!(types.contains(&"journeys"));
    assert!(types.contains(&"spend_performance"));
}

#[tokio::test]
async fn test_get_filters_for_type_row_shape() {
    let (status, json) = get(
        create_test_app().await,
        "/api/query?queryName=getFiltersForType&analysisType=journeys",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["property_id"], "1");
    assert_eq!(rows[0]["property_label"], "Source");
    assert_eq!(rows[0]["property_scope_label"], "UTM");
    assert_eq!(
        rows[0]["available_operators"],
        serde_json::json!(["equals", "not_equals"])
    );
}

#[tokio::test]
async fn test_get_metrics_and_metric_filters() {
    let app = create_test_app().await;

    let (status, metrics) = get(
        app.clone(),
        "/api/query?queryName=getMetricsForType&analysisType=journeys",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = metrics
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["metric_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["7", "8", "9"]);
    assert_eq!(metrics[2]["has_filters"], false);

    let (status, filters) = get(app, "/api/query?queryName=getFiltersForMetric&metricId=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filters.as_array().unwrap().len(), 2);
    assert_eq!(filters[1]["property_label"], "Campaign");
}

#[tokio::test]
async fn test_get_property_values() {
    let (status, json) = get(
        create_test_app().await,
        "/api/query?queryName=getPropertyValues&propertyId=13",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0], serde_json::json!({ "label": "Qualified", "value": "qualified" }));
    assert_eq!(json.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_unknown_type_yields_empty_rows() {
    let (status, json) = get(
        create_test_app().await,
        "/api/query?queryName=getSegmentationsForType&analysisType=does_not_exist",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_parameter_is_bound_not_interpolated() {
    let (status, json) = get(
        create_test_app().await,
        "/api/query?queryName=getFiltersForType&analysisType=journeys%27%20OR%20%271%27%3D%271",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request() {
    let (status, json) = get(
        create_test_app().await,
        "/api/query?queryName=getFiltersForType",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "missing_parameter");
    assert!(json["error"].as_str().unwrap().contains("analysisType"));
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn test_missing_query_name_is_bad_request() {
    let (status, json) = get(create_test_app().await, "/api/query").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "missing_parameter");
    assert!(json["error"].as_str().unwrap().contains("queryName"));
}

#[tokio::test]
async fn test_unknown_query_name_is_bad_request() {
    let (status, json) = get(create_test_app().await, "/api/query?queryName=dropTables").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_query");
    assert_eq!(json["error"], "Invalid queryName specified.");
}

#[tokio::test]
async fn test_backend_failure_is_server_error() {
    let dispatcher = QueryDispatcher::new(Arc::new(UnreachableWarehouse));
    let app = api::create_api_router(Arc::new(dispatcher));

    let (status, json) = get(app, "/api/query?queryName=getAnalysisTypes").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to query the warehouse.");
    assert_eq!(json["details"], "connection refused");
    assert!(json.get("code").is_none());
}

#[tokio::test]
async fn test_options_preflight_is_ok_and_empty() {
    let app = create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/query")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/query")
                .header(header::ORIGIN, "https://reports.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
}

#[tokio::test]
async fn test_cors_header_on_get() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/query?queryName=getAnalysisTypes")
                .header(header::ORIGIN, "https://reports.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_health_check() {
    let (status, json) = get(create_test_app().await, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "OK");
}
