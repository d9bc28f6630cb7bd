//! HTTP surface modules (router, handlers, middleware).

/// Manual cleanup of the transient areas.
pub mod clear;
/// Shared constants and header names.
pub mod constants;
/// Batch upload and archive download.
pub mod convert;
/// Problem response helpers and error types.
pub mod errors;
/// Health and metrics endpoints.
pub mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub mod telemetry;
