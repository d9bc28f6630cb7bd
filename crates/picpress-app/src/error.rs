//! # Design
//!
//! - Centralize application-level errors for bootstrap.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: picpress_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: picpress_telemetry::TelemetryError,
    },
    /// Transient storage could not be prepared.
    #[error("transient storage operation failed")]
    Storage {
        /// Operation identifier.
        operation: &'static str,
        /// Source conversion error.
        source: picpress_convert::ConvertError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: picpress_api::ApiServerError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: picpress_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: picpress_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn storage(
        operation: &'static str,
        source: picpress_convert::ConvertError,
    ) -> Self {
        Self::Storage { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: picpress_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn app_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let config = AppError::config(
            "config.from_env",
            picpress_config::ConfigError::InvalidField {
                field: "PICPRESS_HTTP_PORT",
                value: Some("0".to_string()),
                reason: "out_of_range",
            },
        );
        assert_eq!(config.to_string(), "configuration operation failed");
        assert!(config.source().is_some());

        let storage = AppError::storage(
            "storage.init",
            picpress_convert::ConvertError::NoFilesProvided,
        );
        assert!(matches!(storage, AppError::Storage { .. }));

        let api = AppError::api_server(
            "api_server.serve",
            picpress_api::ApiServerError::Bind {
                addr: "127.0.0.1:3000".parse()?,
                source: io::Error::new(io::ErrorKind::AddrInUse, "busy"),
            },
        );
        assert_eq!(api.to_string(), "api server operation failed");
        Ok(())
    }
}
