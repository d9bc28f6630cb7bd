#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the picpress workspace.
//!
//! This crate centralises logging, metrics, and request-scoped tracing helpers so the
//! HTTP surface and the conversion pipeline share one observability story.
//!
//! Layout: `init.rs` (subscriber install), `layers.rs` (request-id middleware),
//! `context.rs` (span/task-local context), `metrics.rs` (Prometheus registry).

mod context;
mod error;
mod init;
mod layers;
mod metrics;

pub use context::{
    GlobalContextGuard, current_request_id, current_route, set_request_context,
    with_request_context,
};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{REQUEST_ID_HEADER, propagate_request_id_layer, set_request_id_layer};
pub use metrics::{Metrics, MetricsSnapshot};
