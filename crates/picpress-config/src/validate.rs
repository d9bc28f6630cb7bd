//! Validation helpers and parsing utilities for configuration values.

use std::net::IpAddr;

use crate::error::{ConfigError, ConfigResult};

/// Parse a listener port in the range 1-65535.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a valid non-zero port.
pub fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port = value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::invalid(field, value, "not_a_port"))?;
    if port == 0 {
        return Err(ConfigError::invalid(field, value, "zero"));
    }
    Ok(port)
}

/// Parse an IP address for the listener.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an IP address.
pub fn parse_bind_addr(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::invalid(field, value, "not_an_ip_address"))
}

/// Parse an unsigned integer bounded to `min..=max`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a number or out of range.
pub fn parse_bounded(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> ConfigResult<usize> {
    let parsed = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(field, value, "not_a_number"))?;
    if !(min..=max).contains(&parsed) {
        return Err(ConfigError::invalid(field, value, "out_of_range"));
    }
    Ok(parsed)
}

/// Parse a quality setting on a 0-100 scale.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not within 0-100.
pub fn parse_quality(field: &'static str, value: &str) -> ConfigResult<u8> {
    let parsed = parse_bounded(field, value, 0, 100)?;
    u8::try_from(parsed).map_err(|_| ConfigError::invalid(field, value, "out_of_range"))
}

/// Accept only the log formats the telemetry crate understands.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for unknown format names.
pub fn parse_log_format(field: &'static str, value: &str) -> ConfigResult<String> {
    let normalised = value.trim().to_ascii_lowercase();
    match normalised.as_str() {
        "json" | "pretty" => Ok(normalised),
        _ => Err(ConfigError::invalid(field, value, "unknown_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_rejects_zero_and_garbage() {
        assert_eq!(parse_port("PORT", "8080").ok(), Some(8080));
        assert!(matches!(
            parse_port("PORT", "0"),
            Err(ConfigError::InvalidField { reason: "zero", .. })
        ));
        assert!(matches!(
            parse_port("PORT", "70000"),
            Err(ConfigError::InvalidField {
                reason: "not_a_port",
                ..
            })
        ));
    }

    #[test]
    fn parse_bounded_enforces_range() {
        assert_eq!(parse_bounded("N", " 5 ", 1, 10).ok(), Some(5));
        assert!(parse_bounded("N", "0", 1, 10).is_err());
        assert!(parse_bounded("N", "-3", 1, 10).is_err());
    }

    #[test]
    fn parse_quality_accepts_edges() {
        assert_eq!(parse_quality("Q", "0").ok(), Some(0));
        assert_eq!(parse_quality("Q", "100").ok(), Some(100));
        assert!(parse_quality("Q", "101").is_err());
    }

    #[test]
    fn parse_log_format_normalises_case() {
        assert_eq!(parse_log_format("F", "JSON").ok().as_deref(), Some("json"));
        assert!(parse_log_format("F", "xml").is_err());
    }

    #[test]
    fn parse_bind_addr_handles_v6() {
        assert!(parse_bind_addr("ADDR", "::1").is_ok());
        assert!(parse_bind_addr("ADDR", "localhost").is_err());
    }
}
