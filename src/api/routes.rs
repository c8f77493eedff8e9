use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::dispatcher::QueryDispatcher;

use super::handlers::{health_check, preflight, run_query, AppState};

const ALLOWED_HEADERS: [HeaderName; 9] = [
    HeaderName::from_static("x-csrf-token"),
    HeaderName::from_static("x-requested-with"),
    header::ACCEPT,
    HeaderName::from_static("accept-version"),
    header::CONTENT_LENGTH,
    HeaderName::from_static("content-md5"),
    header::CONTENT_TYPE,
    header::DATE,
    HeaderName::from_static("x-api-version"),
];

pub fn create_api_router(dispatcher: Arc<QueryDispatcher>) -> Router {
    let state = Arc::new(AppState { dispatcher });

    // Credentials stay off: they cannot be combined with a wildcard origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(ALLOWED_HEADERS);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/query", get(run_query).options(preflight))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}
