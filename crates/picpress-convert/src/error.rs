//! # Design
//!
//! - Provide structured, constant-message errors for the conversion pipeline.
//! - Capture operation context (paths, limits, states) to make failures reproducible in tests.
//! - Per-file failures are not errors; they are recorded as outcomes. Only request-level
//!   failures surface here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

use crate::archive::ArchiveState;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Request-level errors produced while staging uploads or building the archive.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The batch contained no files.
    #[error("no files provided")]
    NoFilesProvided,
    /// The batch exceeded the configured file limit.
    #[error("too many files")]
    TooManyFiles {
        /// Configured limit.
        limit: usize,
    },
    /// IO failures while staging uploads in a transient area.
    #[error("transient storage io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// IO failures while writing the archive container.
    #[error("archive io failure")]
    ArchiveIo {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Archive staging path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Zip encoder failures.
    #[error("archive zip failure")]
    ArchiveZip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Archive staging path.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// The archive was used in a state that does not permit the operation.
    #[error("archive in unexpected state")]
    ArchiveState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the archive was in.
        state: ArchiveState,
    },
    /// A blocking archive task panicked or was cancelled.
    #[error("archive task failed")]
    Join {
        /// Operation executed by the task.
        operation: &'static str,
        /// Underlying join error.
        source: JoinError,
    },
}

impl ConvertError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive_io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::ArchiveIo {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive_zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::ArchiveZip {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was caused by the client's request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NoFilesProvided | Self::TooManyFiles { .. })
    }

    /// Whether the archive container itself could not be constructed.
    #[must_use]
    pub const fn is_archive_failure(&self) -> bool {
        matches!(
            self,
            Self::ArchiveIo { .. }
                | Self::ArchiveZip { .. }
                | Self::ArchiveState { .. }
                | Self::Join { .. }
        )
    }
}
