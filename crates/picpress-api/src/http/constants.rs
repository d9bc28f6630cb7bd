//! Shared HTTP constants (headers, problem URIs, form fields).

pub(crate) const HEADER_REQUEST_ID: &str = picpress_telemetry::REQUEST_ID_HEADER;
pub(crate) const HEADER_CONVERTED: &str = "x-picpress-converted";
pub(crate) const HEADER_FAILED: &str = "x-picpress-failed";

pub(crate) const UPLOAD_FIELD: &str = "image";
pub(crate) const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
pub(crate) const ARCHIVE_DISPOSITION: &str = "attachment; filename=\"converted_images.zip\"";
pub(crate) const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub(crate) const PROBLEM_INTERNAL: &str = "https://picpress.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://picpress.dev/problems/bad-request";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://picpress.dev/problems/not-found";
pub(crate) const PROBLEM_PAYLOAD_TOO_LARGE: &str =
    "https://picpress.dev/problems/payload-too-large";
