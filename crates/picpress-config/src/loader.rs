//! Environment-backed configuration loading.
//!
//! # Design
//! - Values are read through an injectable lookup so tests never mutate process env.
//! - Blank variables behave as unset.
//! - Every rejected value names its variable in the returned error.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults;
use crate::error::ConfigResult;
use crate::model::{ServerConfig, TransientDirs, UploadLimits};
use crate::validate::{
    parse_bind_addr, parse_bounded, parse_log_format, parse_port, parse_quality,
};

/// Listener IP address.
pub const ENV_BIND_ADDR: &str = "PICPRESS_BIND_ADDR";
/// Listener port.
pub const ENV_HTTP_PORT: &str = "PICPRESS_HTTP_PORT";
/// Parent directory of the transient areas.
pub const ENV_DATA_DIR: &str = "PICPRESS_DATA_DIR";
/// Explicit intake area location.
pub const ENV_INTAKE_DIR: &str = "PICPRESS_INTAKE_DIR";
/// Explicit output area location.
pub const ENV_OUTPUT_DIR: &str = "PICPRESS_OUTPUT_DIR";
/// Static asset directory (`none` disables).
pub const ENV_STATIC_DIR: &str = "PICPRESS_STATIC_DIR";
/// Per-request file limit.
pub const ENV_MAX_FILES: &str = "PICPRESS_MAX_FILES";
/// Per-request body size limit.
pub const ENV_MAX_UPLOAD_BYTES: &str = "PICPRESS_MAX_UPLOAD_BYTES";
/// WebP quality.
pub const ENV_WEBP_QUALITY: &str = "PICPRESS_WEBP_QUALITY";
/// Default log level.
pub const ENV_LOG_LEVEL: &str = "PICPRESS_LOG_LEVEL";
/// Log output format.
pub const ENV_LOG_FORMAT: &str = "PICPRESS_LOG_FORMAT";
/// Build identifier.
pub const ENV_BUILD_SHA: &str = "PICPRESS_BUILD_SHA";

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when any variable holds an invalid value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through the supplied variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when any variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = read(ENV_BIND_ADDR)
            .map(|value| parse_bind_addr(ENV_BIND_ADDR, &value))
            .transpose()?
            .unwrap_or(defaults::BIND_ADDR);
        let http_port = read(ENV_HTTP_PORT)
            .map(|value| parse_port(ENV_HTTP_PORT, &value))
            .transpose()?
            .unwrap_or(defaults::HTTP_PORT);

        let data_dir = read(ENV_DATA_DIR).unwrap_or_else(|| defaults::DATA_DIR.to_string());
        let standard = TransientDirs::under(Path::new(&data_dir));
        let dirs = TransientDirs {
            intake: read(ENV_INTAKE_DIR).map_or(standard.intake, PathBuf::from),
            output: read(ENV_OUTPUT_DIR).map_or(standard.output, PathBuf::from),
        };

        let static_dir = match read(ENV_STATIC_DIR) {
            Some(value) if value.eq_ignore_ascii_case(defaults::STATIC_DIR_DISABLED) => None,
            Some(value) => Some(PathBuf::from(value)),
            None => Some(PathBuf::from(defaults::STATIC_DIR)),
        };

        let limits = UploadLimits {
            max_files: read(ENV_MAX_FILES)
                .map(|value| parse_bounded(ENV_MAX_FILES, &value, 1, defaults::MAX_FILES_CEILING))
                .transpose()?
                .unwrap_or(defaults::MAX_FILES),
            max_body_bytes: read(ENV_MAX_UPLOAD_BYTES)
                .map(|value| {
                    parse_bounded(
                        ENV_MAX_UPLOAD_BYTES,
                        &value,
                        defaults::MIN_UPLOAD_BYTES,
                        usize::MAX,
                    )
                })
                .transpose()?
                .unwrap_or(defaults::MAX_UPLOAD_BYTES),
        };

        let webp_quality = read(ENV_WEBP_QUALITY)
            .map(|value| parse_quality(ENV_WEBP_QUALITY, &value))
            .transpose()?
            .unwrap_or(defaults::WEBP_QUALITY);
        let log_format = read(ENV_LOG_FORMAT)
            .map(|value| parse_log_format(ENV_LOG_FORMAT, &value))
            .transpose()?;

        let config = Self {
            bind_addr,
            http_port,
            dirs,
            static_dir,
            limits,
            webp_quality,
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            log_format,
            build_sha: read(ENV_BUILD_SHA).unwrap_or_else(|| defaults::BUILD_SHA.to_string()),
        };
        debug!(port = config.http_port, "server configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = ServerConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config, ServerConfig::default());
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> ConfigResult<()> {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_BIND_ADDR, "0.0.0.0"),
            (ENV_HTTP_PORT, "8088"),
            (ENV_DATA_DIR, "/srv/picpress"),
            (ENV_OUTPUT_DIR, "/tmp/out"),
            (ENV_STATIC_DIR, "none"),
            (ENV_MAX_FILES, "5"),
            (ENV_WEBP_QUALITY, "65"),
            (ENV_LOG_FORMAT, "json"),
        ]))?;
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8088");
        assert_eq!(config.dirs.intake, Path::new("/srv/picpress").join("uploads"));
        assert_eq!(config.dirs.output, PathBuf::from("/tmp/out"));
        assert!(config.static_dir.is_none());
        assert_eq!(config.limits.max_files, 5);
        assert_eq!(config.webp_quality, 65);
        assert_eq!(config.log_format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn blank_values_fall_back_to_defaults() -> ConfigResult<()> {
        let config = ServerConfig::from_lookup(lookup(&[(ENV_HTTP_PORT, "  ")]))?;
        assert_eq!(config.http_port, defaults::HTTP_PORT);
        Ok(())
    }

    #[test]
    fn invalid_values_name_their_variable() {
        let result = ServerConfig::from_lookup(lookup(&[(ENV_MAX_FILES, "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                field: ENV_MAX_FILES,
                reason: "out_of_range",
                ..
            })
        ));

        let result = ServerConfig::from_lookup(lookup(&[(ENV_MAX_UPLOAD_BYTES, "12")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                field: ENV_MAX_UPLOAD_BYTES,
                ..
            })
        ));
    }
}
