//! `POST /clear-data`: empty both transient areas.

use std::sync::Arc;

use axum::{Json, extract::State};
use picpress_convert::AreaKind;
use tracing::info;

use crate::models::ClearDataResponse;
use crate::state::ApiState;

pub(crate) async fn clear_data(State(state): State<Arc<ApiState>>) -> Json<ClearDataResponse> {
    let report = state.storage().clear_all().await;
    state
        .telemetry
        .add_cleanup_removed(AreaKind::Intake.as_str(), report.intake);
    state
        .telemetry
        .add_cleanup_removed(AreaKind::Output.as_str(), report.output);
    info!(
        intake = report.intake,
        output = report.output,
        "transient areas cleared"
    );
    Json(ClearDataResponse::for_deleted(report.total()))
}
