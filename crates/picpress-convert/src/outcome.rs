//! Per-file conversion outcomes.

use serde::Serialize;

/// Why a single input could not be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The staged bytes could not be read back.
    UnreadableInput,
    /// The bytes are not a decodable image in a supported format.
    InvalidImage,
    /// Decoding succeeded but WebP encoding failed.
    TranscodeError,
}

impl FailureReason {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnreadableInput => "unreadable_input",
            Self::InvalidImage => "invalid_image",
            Self::TranscodeError => "transcode_error",
        }
    }
}

/// Result of processing one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The file was converted and appended to the archive.
    Success {
        /// Name of the archive entry.
        entry_name: String,
        /// Size of the encoded entry.
        bytes: u64,
    },
    /// The file was skipped.
    Failure {
        /// Client-supplied filename.
        original_name: String,
        /// Classification of the failure.
        reason: FailureReason,
    },
}

impl ConversionOutcome {
    /// Whether the file made it into the archive.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Label for the `conversions_total` counter.
    #[must_use]
    pub const fn metric_label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { reason, .. } => reason.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_serialize_with_status_tag() -> Result<(), serde_json::Error> {
        let failure = ConversionOutcome::Failure {
            original_name: "notes.txt".to_string(),
            reason: FailureReason::InvalidImage,
        };
        let json = serde_json::to_value(&failure)?;
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "invalid_image");
        assert_eq!(failure.metric_label(), "invalid_image");
        assert!(!failure.is_success());

        let success = ConversionOutcome::Success {
            entry_name: "a.webp".to_string(),
            bytes: 12,
        };
        assert_eq!(serde_json::to_value(&success)?["status"], "success");
        assert_eq!(success.metric_label(), "success");
        Ok(())
    }
}
