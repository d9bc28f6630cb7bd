//! RFC 9457-style API error wrapper.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use picpress_convert::ConvertError;
use picpress_telemetry::{current_request_id, current_route};
use tracing::{error, warn};

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND, PROBLEM_PAYLOAD_TOO_LARGE,
};
use crate::models::ProblemDetails;

/// Structured API error rendered as a problem document.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            PROBLEM_PAYLOAD_TOO_LARGE,
            "payload too large",
        )
        .with_detail(detail)
    }

    /// Map a failure while reading the multipart stream.
    pub(crate) fn from_multipart(err: &MultipartError) -> Self {
        warn!(error = %err, status = %err.status(), "multipart body rejected");
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::payload_too_large("request body exceeds the configured upload limit")
        } else {
            Self::bad_request("malformed multipart form data")
        }
    }

    /// Map a request that could not be opened as multipart at all.
    pub(crate) fn from_multipart_rejection(rejection: &MultipartRejection) -> Self {
        warn!(error = %rejection, "multipart extraction rejected");
        Self::bad_request("request body must be multipart/form-data")
    }

    /// Map a request-level conversion failure.
    pub(crate) fn from_convert(err: &ConvertError) -> Self {
        match err {
            ConvertError::NoFilesProvided => Self::bad_request("no files provided"),
            ConvertError::TooManyFiles { limit } => {
                Self::bad_request(format!("at most {limit} files may be uploaded per request"))
            }
            other if other.is_archive_failure() => {
                error!(error = %other, source = ?std::error::Error::source(other), "archive creation failed");
                Self::internal("failed to create archive")
            }
            other => {
                error!(error = %other, source = ?std::error::Error::source(other), "upload staging failed");
                Self::internal("failed to stage upload")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                route = %current_route().unwrap_or_default(),
                request_id = %current_request_id().unwrap_or_default(),
                detail = self.detail.as_deref().unwrap_or_default(),
                "request failed"
            );
        }
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn convert_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from_convert(&ConvertError::NoFilesProvided).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from_convert(&ConvertError::TooManyFiles { limit: 2 }).status,
            StatusCode::BAD_REQUEST
        );
        let archive = ConvertError::ArchiveIo {
            operation: "archive.create",
            path: "outputs/x.zip".into(),
            source: io::Error::other("disk full"),
        };
        let mapped = ApiError::from_convert(&archive);
        assert_eq!(mapped.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mapped.kind, PROBLEM_INTERNAL);
    }

    #[test]
    fn problems_render_json_bodies() {
        let response = ApiError::not_found("Route not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("application/json")
        );
    }
}
