//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use picpress_convert::AreaKind;
use picpress_telemetry::build_sha;
use tracing::error;

use crate::http::constants::METRICS_CONTENT_TYPE;
use crate::http::errors::ApiError;
use crate::models::HealthResponse;
use crate::state::ApiState;

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let storage = state.storage();
    Json(HealthResponse {
        status: "ok".to_string(),
        build: build_sha().to_string(),
        intake_dir: storage.area(AreaKind::Intake).root().display().to_string(),
        output_dir: storage.area(AreaKind::Output).root().display().to_string(),
        active_jobs: state.telemetry.snapshot().active_jobs,
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(axum::http::header::CONTENT_TYPE, METRICS_CONTENT_TYPE)
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
