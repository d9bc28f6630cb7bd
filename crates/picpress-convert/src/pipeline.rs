//! Conversion pipeline: staged uploads in, one finalized archive out.
//!
//! # Design
//! - Files are processed strictly in arrival order; per-file work is sequential.
//! - Per-file problems become [`ConversionOutcome::Failure`] values and never abort the job.
//! - Only archive-level failures are fatal. Every staged input still owned by the job is
//!   removed on the way out by its drop guard.
//! - Codec and ZIP work run on the blocking pool so the runtime keeps serving other requests.
//! - Each staged input is unlinked as soon as its attempt finishes.

use std::sync::Arc;

use picpress_telemetry::Metrics;
use tokio::fs;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveJob, FinishedArchive};
use crate::error::{ConvertError, ConvertResult};
use crate::naming::OutputNames;
use crate::outcome::{ConversionOutcome, FailureReason};
use crate::storage::{JobToken, TransientStorage};
use crate::stream::ArchiveStream;
use crate::transcoder::{TranscodeError, Transcoder};
use crate::upload::UploadBatch;

/// Orchestrates transcoding and archiving for upload batches.
#[derive(Clone)]
pub struct ConversionPipeline {
    storage: TransientStorage,
    transcoder: Arc<dyn Transcoder>,
    metrics: Metrics,
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("storage", &self.storage)
            .field("extension", &self.transcoder.extension())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl ConversionPipeline {
    /// Build a pipeline over the given storage and codec.
    #[must_use]
    pub fn new(storage: TransientStorage, transcoder: Arc<dyn Transcoder>, metrics: Metrics) -> Self {
        Self {
            storage,
            transcoder,
            metrics,
        }
    }

    /// Transient storage used for staging.
    #[must_use]
    pub const fn storage(&self) -> &TransientStorage {
        &self.storage
    }

    /// Convert every file in `batch` and finalize the archive.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::NoFilesProvided`] for an empty batch, or an archive error when
    /// the container cannot be created, appended to, or finalized.
    pub async fn convert(&self, batch: UploadBatch) -> ConvertResult<ConvertedArchive> {
        if batch.is_empty() {
            return Err(ConvertError::NoFilesProvided);
        }
        let (token, files) = batch.into_parts();
        let active = ActiveJobGuard::new(self.metrics.clone());
        info!(job = %token, files = files.len(), "conversion started");

        let archive_path = self.storage.archive_path(&token);
        let job_token = token.clone();
        let mut job = spawn_blocking(move || ArchiveJob::create(job_token, archive_path))
            .await
            .map_err(|source| ConvertError::Join {
                operation: "archive.create",
                source,
            })??;

        let mut names = OutputNames::new(self.transcoder.extension());
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let (original_name, staged) = file.into_parts();

            let attempt = match fs::read(staged.path()).await {
                Ok(bytes) => self.transcode(&token, &original_name, bytes).await,
                Err(err) => {
                    warn!(
                        job = %token,
                        file = %original_name,
                        error = %err,
                        "staged upload unreadable"
                    );
                    Err(FailureReason::UnreadableInput)
                }
            };
            staged.release().await;

            let outcome = match attempt {
                Ok(encoded) => {
                    let entry_name = names.allocate(&original_name);
                    let bytes = encoded.len() as u64;
                    job = append(job, entry_name.clone(), encoded).await?;
                    debug!(job = %token, file = %original_name, entry = %entry_name, bytes, "entry appended");
                    ConversionOutcome::Success { entry_name, bytes }
                }
                Err(reason) => ConversionOutcome::Failure {
                    original_name,
                    reason,
                },
            };
            self.metrics.inc_conversion(outcome.metric_label());
            outcomes.push(outcome);
        }

        let archive = spawn_blocking(move || job.finish())
            .await
            .map_err(|source| ConvertError::Join {
                operation: "archive.finish",
                source,
            })??;
        self.metrics.add_archive_bytes(archive.size_bytes);

        let converted = ConvertedArchive {
            archive,
            outcomes,
            active,
        };
        info!(
            job = %token,
            succeeded = converted.succeeded(),
            failed = converted.failed(),
            size_bytes = converted.size_bytes(),
            "conversion finished"
        );
        Ok(converted)
    }

    async fn transcode(
        &self,
        token: &JobToken,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, FailureReason> {
        let transcoder = Arc::clone(&self.transcoder);
        let attempt = spawn_blocking(move || transcode_one(transcoder.as_ref(), &bytes)).await;
        match attempt {
            Ok(Ok(encoded)) => Ok(encoded),
            Ok(Err((reason, err))) => {
                warn!(
                    job = %token,
                    file = %original_name,
                    reason = reason.as_str(),
                    error = %err,
                    "file skipped"
                );
                Err(reason)
            }
            Err(err) => {
                warn!(
                    job = %token,
                    file = %original_name,
                    error = %err,
                    "transcoder task failed"
                );
                Err(FailureReason::TranscodeError)
            }
        }
    }
}

fn transcode_one(
    transcoder: &dyn Transcoder,
    bytes: &[u8],
) -> Result<Vec<u8>, (FailureReason, TranscodeError)> {
    let probe = transcoder
        .probe(bytes)
        .map_err(|err| (FailureReason::InvalidImage, err))?;
    debug!(format = ?probe.format, width = probe.width, height = probe.height, "input probed");
    transcoder.transcode(bytes).map_err(|err| {
        let reason = if err.is_invalid_input() {
            FailureReason::InvalidImage
        } else {
            FailureReason::TranscodeError
        };
        (reason, err)
    })
}

async fn append(mut job: ArchiveJob, name: String, bytes: Vec<u8>) -> ConvertResult<ArchiveJob> {
    spawn_blocking(move || job.append(&name, &bytes).map(|()| job))
        .await
        .map_err(|source| ConvertError::Join {
            operation: "archive.append",
            source,
        })?
}

/// Keeps the `active_jobs` gauge raised until the job's archive has been transmitted.
#[derive(Debug)]
pub(crate) struct ActiveJobGuard {
    metrics: Metrics,
}

impl ActiveJobGuard {
    fn new(metrics: Metrics) -> Self {
        metrics.job_started();
        Self { metrics }
    }
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.metrics.job_finished();
    }
}

/// A finalized archive plus the per-file report.
#[derive(Debug)]
pub struct ConvertedArchive {
    archive: FinishedArchive,
    outcomes: Vec<ConversionOutcome>,
    active: ActiveJobGuard,
}

impl ConvertedArchive {
    /// Outcomes in input order.
    #[must_use]
    pub fn outcomes(&self) -> &[ConversionOutcome] {
        &self.outcomes
    }

    /// Number of files that made it into the archive.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_success()).count()
    }

    /// Number of files that were skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Archive size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.archive.size_bytes
    }

    /// Job that produced the archive.
    #[must_use]
    pub const fn token(&self) -> &JobToken {
        &self.archive.token
    }

    /// Staging location of the archive.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.archive.staging.path()
    }

    /// Open the archive as a byte stream that removes the staging file when it ends or is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the staging file cannot be opened; it is removed in that case.
    pub async fn into_stream(self) -> ConvertResult<ArchiveStream> {
        let file = fs::File::open(self.archive.staging.path())
            .await
            .map_err(|source| {
                ConvertError::archive_io("archive.open", self.archive.staging.path(), source)
            })?;
        let FinishedArchive {
            token,
            staging,
            size_bytes,
            ..
        } = self.archive;
        Ok(ArchiveStream::new(file, staging, token, size_bytes, self.active))
    }
}
