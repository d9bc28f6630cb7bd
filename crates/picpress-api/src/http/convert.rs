//! `POST /convert`: receive a batch of images and stream back a ZIP of WebP copies.
//!
//! Uploads are streamed chunk by chunk into the intake area; nothing is buffered in memory
//! beyond one chunk. Any early return drops the partially received batch, which removes
//! everything it staged.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        State,
        multipart::{Multipart, MultipartRejection},
    },
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::Response,
};
use picpress_convert::UploadBatch;
use picpress_telemetry::current_request_id;
use tracing::{debug, error, info};

use crate::http::constants::{
    ARCHIVE_CONTENT_TYPE, ARCHIVE_DISPOSITION, HEADER_CONVERTED, HEADER_FAILED, UPLOAD_FIELD,
};
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn convert(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|rejection| ApiError::from_multipart_rejection(&rejection))?;
    let batch = receive_batch(&state, &mut multipart).await?;
    if batch.is_empty() {
        return Err(ApiError::bad_request("no files provided"));
    }
    info!(
        job = %batch.token(),
        files = batch.len(),
        request_id = %current_request_id().unwrap_or_default(),
        "upload batch received"
    );

    let converted = state
        .pipeline
        .convert(batch)
        .await
        .map_err(|err| ApiError::from_convert(&err))?;
    let succeeded = converted.succeeded();
    let failed = converted.failed();
    info!(
        job = %converted.token(),
        succeeded,
        failed,
        bytes = converted.size_bytes(),
        "conversion finished"
    );
    let stream = converted
        .into_stream()
        .await
        .map_err(|err| ApiError::from_convert(&err))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
        .header(CONTENT_DISPOSITION, ARCHIVE_DISPOSITION)
        .header(CONTENT_LENGTH, stream.size_bytes())
        .header(HEADER_CONVERTED, succeeded)
        .header(HEADER_FAILED, failed)
        .body(Body::from_stream(stream))
        .map_err(|err| {
            error!(error = %err, "failed to build archive response");
            ApiError::internal("failed to build archive response")
        })
}

async fn receive_batch(state: &ApiState, multipart: &mut Multipart) -> Result<UploadBatch, ApiError> {
    let storage = state.storage();
    let mut batch = UploadBatch::new(state.limits.max_files);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::from_multipart(&err))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "ignoring unrelated form field");
            continue;
        }
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            debug!("skipping file part without a filename");
            continue;
        };

        let mut sink = batch
            .begin_file(storage, &file_name)
            .await
            .map_err(|err| ApiError::from_convert(&err))?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| ApiError::from_multipart(&err))?
        {
            sink.write_chunk(&chunk)
                .await
                .map_err(|err| ApiError::from_convert(&err))?;
        }
        let uploaded = sink
            .finish()
            .await
            .map_err(|err| ApiError::from_convert(&err))?;
        debug!(job = %batch.token(), file = %file_name, bytes = uploaded.size(), "upload staged");
        batch.push(uploaded);
    }
    Ok(batch)
}
