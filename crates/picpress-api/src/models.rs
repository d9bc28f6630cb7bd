//! Wire payloads returned by the HTTP surface.

use serde::{Deserialize, Serialize};

/// RFC 9457 problem document returned for every handled failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short constant summary.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Request-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response body of `POST /clear-data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClearDataResponse {
    /// Entries removed across both transient areas.
    pub deleted: usize,
    /// Human-readable summary.
    pub message: String,
}

impl ClearDataResponse {
    /// Build the response for `deleted` removed entries.
    #[must_use]
    pub fn for_deleted(deleted: usize) -> Self {
        let message = if deleted == 0 {
            "No files found to delete.".to_string()
        } else {
            format!("{deleted} file(s) deleted from 'uploads' and 'outputs'.")
        };
        Self { deleted, message }
    }
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Build identifier.
    pub build: String,
    /// Intake area location.
    pub intake_dir: String,
    /// Output area location.
    pub output_dir: String,
    /// Conversion jobs currently in flight.
    pub active_jobs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_messages_match_removed_count() {
        assert_eq!(
            ClearDataResponse::for_deleted(0).message,
            "No files found to delete."
        );
        assert_eq!(
            ClearDataResponse::for_deleted(3).message,
            "3 file(s) deleted from 'uploads' and 'outputs'."
        );
    }

    #[test]
    fn problem_kind_serializes_as_type() -> Result<(), serde_json::Error> {
        let problem = ProblemDetails {
            kind: "https://picpress.dev/problems/bad-request".to_string(),
            title: "bad request".to_string(),
            status: 400,
            detail: None,
        };
        let json = serde_json::to_value(&problem)?;
        assert_eq!(json["type"], "https://picpress.dev/problems/bad-request");
        assert!(json.get("detail").is_none());
        Ok(())
    }
}
