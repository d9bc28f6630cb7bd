//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; parsing lives in `loader.rs` and `validate.rs`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::defaults;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to.
    pub bind_addr: IpAddr,
    /// Port the HTTP listener binds to.
    pub http_port: u16,
    /// Locations of the intake and output transient areas.
    pub dirs: TransientDirs,
    /// Static asset directory, `None` when static serving is disabled.
    pub static_dir: Option<PathBuf>,
    /// Upload bounds enforced by the router.
    pub limits: UploadLimits,
    /// Lossy WebP quality (0-100).
    pub webp_quality: u8,
    /// Default log filter when `RUST_LOG` is absent.
    pub log_level: String,
    /// Explicit log format (`json`/`pretty`), inferred when `None`.
    pub log_format: Option<String>,
    /// Build identifier recorded in logs and the health endpoint.
    pub build_sha: String,
}

impl ServerConfig {
    /// Socket address for the HTTP listener.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::BIND_ADDR,
            http_port: defaults::HTTP_PORT,
            dirs: TransientDirs::under(Path::new(defaults::DATA_DIR)),
            static_dir: Some(PathBuf::from(defaults::STATIC_DIR)),
            limits: UploadLimits::default(),
            webp_quality: defaults::WEBP_QUALITY,
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
            build_sha: defaults::BUILD_SHA.to_string(),
        }
    }
}

/// Intake and output directories used for request-scoped scratch files.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransientDirs {
    /// Directory receiving staged uploads.
    pub intake: PathBuf,
    /// Directory receiving archive staging files.
    pub output: PathBuf,
}

impl TransientDirs {
    /// Standard `uploads/` and `outputs/` layout under `root`.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            intake: root.join(defaults::INTAKE_DIR_NAME),
            output: root.join(defaults::OUTPUT_DIR_NAME),
        }
    }
}

/// Bounds applied to a single conversion request.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum number of files per request.
    pub max_files: usize,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: defaults::MAX_FILES,
            max_body_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.dirs.intake, Path::new(".").join("uploads"));
        assert_eq!(config.dirs.output, Path::new(".").join("outputs"));
        assert_eq!(config.limits.max_files, 100);
        assert_eq!(config.webp_quality, 80);
    }

    #[test]
    fn config_serializes_for_startup_logging() -> Result<(), serde_json::Error> {
        let rendered = serde_json::to_value(ServerConfig::default())?;
        assert_eq!(rendered["http_port"], 3000);
        assert_eq!(rendered["limits"]["max_files"], 100);
        Ok(())
    }
}
