//! Transient storage areas shared by every conversion request.
//!
//! # Design
//! - Two process-wide directories: the intake area (staged uploads) and the output area
//!   (archive staging files). They are created at startup and never removed as directories.
//! - Requests never share filenames: every name embeds the request's [`JobToken`].
//! - [`StagedFile`] owns exactly one file and unlinks it when released or dropped, which covers
//!   both normal completion and cancelled requests.
//! - Clearing an area never fails the caller: per-entry failures are logged and skipped.
//! - A manual clear racing an in-flight request may delete that request's files; the request
//!   then observes ordinary per-file failures.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ConvertError, ConvertResult};
use crate::naming::staging_component;

const ARCHIVE_PREFIX: &str = "webp_images_";
const ARCHIVE_EXTENSION: &str = "zip";

/// Which of the two transient areas an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    /// Staged uploads awaiting conversion.
    Intake,
    /// Archive staging files awaiting transmission.
    Output,
}

impl AreaKind {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Output => "output",
        }
    }
}

/// Unique, time-derived identifier for one conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobToken(String);

impl JobToken {
    /// Generate a token from the current UTC time (nanosecond resolution) plus a random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let stamp = Utc::now().format("%Y%m%d%H%M%S%9f");
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{stamp}-{}", &random[..8]))
    }

    /// Borrow the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A file exclusively owned by one request; unlinked on release or drop.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    armed: bool,
}

impl StagedFile {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Location of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the file now. Returns `true` when this call removed it.
    pub async fn release(mut self) -> bool {
        self.armed = false;
        match fs::remove_file(&self.path).await {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "staged file already gone");
                false
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "failed to remove staged file"
                );
                false
            }
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed abandoned staged file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                error = %err,
                path = %self.path.display(),
                "failed to remove abandoned staged file"
            ),
        }
    }
}

/// One transient directory.
#[derive(Debug, Clone)]
pub struct TransientArea {
    kind: AreaKind,
    root: PathBuf,
}

impl TransientArea {
    /// Describe an area rooted at `root`.
    #[must_use]
    pub fn new(kind: AreaKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    /// Which area this is.
    #[must_use]
    pub const fn kind(&self) -> AreaKind {
        self.kind
    }

    /// Directory backing the area.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub async fn ensure(&self) -> ConvertResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ConvertError::io("area.ensure", &self.root, source))
    }

    /// Count the entries currently in the area; a missing area counts as empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory exists but cannot be listed.
    pub async fn entry_count(&self) -> ConvertResult<usize> {
        let mut reader = match fs::read_dir(&self.root).await {
            Ok(reader) => reader,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(ConvertError::io("area.count", &self.root, source)),
        };
        let mut count = 0usize;
        while reader
            .next_entry()
            .await
            .map_err(|source| ConvertError::io("area.count", &self.root, source))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }

    /// Remove every entry in the area and return how many were removed by this call.
    ///
    /// Never fails: a missing area is treated as empty, individual removal failures are
    /// logged, and the directory exists again on return.
    pub async fn clear(&self) -> usize {
        let area = self.kind.as_str();
        let mut removed = 0usize;

        match fs::read_dir(&self.root).await {
            Ok(mut reader) => loop {
                let entry = match reader.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(
                            area,
                            error = %err,
                            path = %self.root.display(),
                            "failed to list transient area"
                        );
                        break;
                    }
                };
                let path = entry.path();
                let outcome = match entry.file_type().await {
                    Ok(file_type) if file_type.is_dir() => fs::remove_dir_all(&path).await,
                    Ok(_) => fs::remove_file(&path).await,
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(()) => removed += 1,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        debug!(area, path = %path.display(), "entry vanished before cleanup");
                    }
                    Err(err) => {
                        warn!(
                            area,
                            error = %err,
                            path = %path.display(),
                            "failed to remove transient entry"
                        );
                    }
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(area, path = %self.root.display(), "transient area missing; nothing to clear");
            }
            Err(err) => {
                warn!(
                    area,
                    error = %err,
                    path = %self.root.display(),
                    "failed to read transient area"
                );
            }
        }

        if let Err(err) = fs::create_dir_all(&self.root).await {
            warn!(
                area,
                error = %err,
                path = %self.root.display(),
                "failed to recreate transient area"
            );
        }
        removed
    }
}

/// Entries removed by a full clear, per area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Entries removed from the intake area.
    pub intake: usize,
    /// Entries removed from the output area.
    pub output: usize,
}

impl ClearReport {
    /// Total entries removed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.intake + self.output
    }
}

/// Handle to the intake and output areas, passed explicitly to whoever needs scratch space.
#[derive(Debug, Clone)]
pub struct TransientStorage {
    intake: TransientArea,
    output: TransientArea,
}

impl TransientStorage {
    /// Describe storage backed by the two directories.
    #[must_use]
    pub fn new(intake: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            intake: TransientArea::new(AreaKind::Intake, intake),
            output: TransientArea::new(AreaKind::Output, output),
        }
    }

    /// Create both areas if absent.
    ///
    /// # Errors
    ///
    /// Returns an error when either directory cannot be created.
    pub async fn init(&self) -> ConvertResult<()> {
        self.intake.ensure().await?;
        self.output.ensure().await?;
        info!(
            intake = %self.intake.root().display(),
            output = %self.output.root().display(),
            "transient areas ready"
        );
        Ok(())
    }

    /// Borrow the area of the given kind.
    #[must_use]
    pub const fn area(&self, kind: AreaKind) -> &TransientArea {
        match kind {
            AreaKind::Intake => &self.intake,
            AreaKind::Output => &self.output,
        }
    }

    /// Create a fresh, exclusively owned file in the intake area for one upload.
    ///
    /// The name combines the job token, the upload's position in the batch, and a sanitised
    /// form of the client filename. The intake directory is recreated if it went missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be created.
    pub async fn stage(
        &self,
        job: &JobToken,
        seq: usize,
        original_name: &str,
    ) -> ConvertResult<(StagedFile, File)> {
        let file_name = format!("{job}-{seq:03}-{}", staging_component(original_name));
        let path = self.intake.root().join(file_name);

        let file = match create_new(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.intake.ensure().await?;
                create_new(&path)
                    .await
                    .map_err(|source| ConvertError::io("stage.create", &path, source))?
            }
            Err(source) => return Err(ConvertError::io("stage.create", &path, source)),
        };
        Ok((StagedFile::new(path), file))
    }

    /// Staging location of the archive for `job` in the output area.
    #[must_use]
    pub fn archive_path(&self, job: &JobToken) -> PathBuf {
        self.output
            .root()
            .join(format!("{ARCHIVE_PREFIX}{job}.{ARCHIVE_EXTENSION}"))
    }

    /// Clear one area.
    pub async fn clear(&self, kind: AreaKind) -> usize {
        self.area(kind).clear().await
    }

    /// Clear both areas.
    pub async fn clear_all(&self) -> ClearReport {
        ClearReport {
            intake: self.intake.clear().await,
            output: self.output.clear().await,
        }
    }
}

async fn create_new(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    fn storage_in(temp: &TempDir) -> TransientStorage {
        TransientStorage::new(temp.path().join("uploads"), temp.path().join("outputs"))
    }

    #[test]
    fn job_tokens_are_unique_and_time_prefixed() {
        let first = JobToken::generate();
        let second = JobToken::generate();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with(&Utc::now().format("%Y").to_string()));
        assert_eq!(first.to_string(), first.as_str());
    }

    #[tokio::test]
    async fn init_creates_both_areas() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        assert!(temp.path().join("uploads").is_dir());
        assert!(temp.path().join("outputs").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn stage_names_embed_job_and_sequence() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        let job = JobToken::generate();

        let (staged, mut file) = storage.stage(&job, 7, "../evil name.png").await?;
        file.write_all(b"bytes").await?;
        drop(file);

        let name = staged
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        assert_eq!(name, format!("{job}-007-evil_name.png"));
        assert_eq!(staged.path().parent(), Some(storage.area(AreaKind::Intake).root()));
        Ok(())
    }

    #[tokio::test]
    async fn stage_recreates_missing_intake_area() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        let (staged, _file) = storage.stage(&JobToken::generate(), 0, "a.png").await?;
        assert!(staged.path().exists());
        Ok(())
    }

    #[tokio::test]
    async fn staged_file_is_removed_on_release_and_on_drop() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        let job = JobToken::generate();

        let (released, _file) = storage.stage(&job, 0, "a.png").await?;
        let released_path = released.path().to_path_buf();
        assert!(released.release().await);
        assert!(!released_path.exists());

        let (dropped, file) = storage.stage(&job, 1, "b.png").await?;
        drop(file);
        let dropped_path = dropped.path().to_path_buf();
        drop(dropped);
        assert!(!dropped_path.exists());

        assert_eq!(storage.area(AreaKind::Intake).entry_count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn release_reports_already_missing_files() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        let (staged, _file) = storage.stage(&JobToken::generate(), 0, "a.png").await?;
        storage.clear(AreaKind::Intake).await;
        assert!(!staged.release().await);
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_files_and_directories() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        let output = storage.area(AreaKind::Output).root().to_path_buf();
        std::fs::write(output.join("one.zip"), b"1")?;
        std::fs::write(output.join("two.webp"), b"2")?;
        std::fs::create_dir_all(output.join("nested").join("deeper"))?;
        std::fs::write(output.join("nested").join("deeper").join("x"), b"3")?;

        let removed = storage.clear(AreaKind::Output).await;
        assert_eq!(removed, 3);
        assert!(output.is_dir());
        assert_eq!(storage.area(AreaKind::Output).entry_count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn clear_tolerates_missing_area_and_recreates_it() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        let report = storage.clear_all().await;
        assert_eq!(report, ClearReport::default());
        assert_eq!(report.total(), 0);
        assert!(temp.path().join("uploads").is_dir());
        assert!(temp.path().join("outputs").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn clear_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = storage_in(&temp);
        storage.init().await?;
        std::fs::write(storage.area(AreaKind::Intake).root().join("left.png"), b"x")?;

        let first = storage.clear_all().await;
        let second = storage.clear_all().await;
        assert_eq!(first.total(), 1);
        assert_eq!(second.total(), 0);
        assert_eq!(storage.area(AreaKind::Intake).entry_count().await?, 0);
        assert_eq!(storage.area(AreaKind::Output).entry_count().await?, 0);
        Ok(())
    }

    #[test]
    fn archive_path_lives_in_output_area() {
        let storage = TransientStorage::new("/data/uploads", "/data/outputs");
        let job = JobToken::generate();
        let path = storage.archive_path(&job);
        assert_eq!(path.parent(), Some(Path::new("/data/outputs")));
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some(format!("webp_images_{job}.zip").as_str())
        );
    }
}
