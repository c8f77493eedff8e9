use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatcher::{QueryDispatcher, QueryResult};
use crate::query::QueryError;

pub struct AppState {
    pub dispatcher: Arc<QueryDispatcher>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl From<QueryError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: QueryError) -> Self {
        let error = err.to_string();
        match err {
            QueryError::Backend { details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error,
                    code: None,
                    details: Some(details),
                }),
            ),
            client => {
                tracing::debug!(code = client.code(), "rejected query request: {error}");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error,
                        code: Some(client.code()),
                        details: None,
                    }),
                )
            }
        }
    }
}

/// Run a named warehouse query
pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QueryResult>, (StatusCode, Json<ErrorResponse>)> {
    let rows = state.dispatcher.execute_named(&params).await?;
    Ok(Json(rows))
}

/// CORS pre-flight without the CORS request headers: plain 200, empty body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
