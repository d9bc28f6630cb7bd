//! Default values for server configuration.
//!
//! # Design
//! - Centralize defaults so the loader, docs, and tests agree.

use std::net::{IpAddr, Ipv4Addr};

/// Default listener address (loopback only).
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Default listener port.
pub const HTTP_PORT: u16 = 3000;
/// Default parent directory for the transient areas.
pub const DATA_DIR: &str = ".";
/// Intake area directory name under the data directory.
pub const INTAKE_DIR_NAME: &str = "uploads";
/// Output area directory name under the data directory.
pub const OUTPUT_DIR_NAME: &str = "outputs";
/// Default static asset directory.
pub const STATIC_DIR: &str = "public";
/// Sentinel value that disables static asset serving.
pub const STATIC_DIR_DISABLED: &str = "none";
/// Maximum number of files accepted in one conversion request.
pub const MAX_FILES: usize = 100;
/// Upper bound accepted for the per-request file limit.
pub const MAX_FILES_CEILING: usize = 10_000;
/// Maximum accepted request body size in bytes (256 MiB).
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
/// Smallest accepted request body limit in bytes.
pub const MIN_UPLOAD_BYTES: usize = 1024;
/// Lossy WebP quality on a 0-100 scale.
pub const WEBP_QUALITY: u8 = 80;
/// Default log level.
pub const LOG_LEVEL: &str = "info";
/// Default build identifier.
pub const BUILD_SHA: &str = "dev";
