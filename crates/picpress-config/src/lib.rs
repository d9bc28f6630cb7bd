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

//! Environment-driven configuration for the picpress server.
//!
//! Layout: `model.rs` (typed configuration), `defaults.rs` (default values),
//! `validate.rs` (parsing/validation helpers), `loader.rs` (environment lookup).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ServerConfig, TransientDirs, UploadLimits};
