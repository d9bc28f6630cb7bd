//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment variable that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: Some(value.to_string()),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_keeps_constant_message() {
        let err = ConfigError::invalid("PICPRESS_HTTP_PORT", "abc", "not_a_number");
        assert_eq!(err.to_string(), "invalid configuration field");
        match err {
            ConfigError::InvalidField {
                field,
                value,
                reason,
            } => {
                assert_eq!(field, "PICPRESS_HTTP_PORT");
                assert_eq!(value.as_deref(), Some("abc"));
                assert_eq!(reason, "not_a_number");
            }
        }
    }
}
