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

//! HTTP surface for the picpress converter.
//!
//! Layout: `http/router.rs` (router + server host), `http/convert.rs` (upload and archive
//! response), `http/clear.rs` (manual cleanup), `http/health.rs` (health and metrics),
//! `http/errors.rs` (problem responses), `http/telemetry.rs` (request metrics middleware).

pub mod error;
pub mod http;
pub mod models;
mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::ApiState;
