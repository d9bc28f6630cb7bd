//! ZIP archive assembly for one conversion job.
//!
//! # Design
//! - The archive is written to a staging file in the output area, never held in memory.
//! - Entries are deflated at the maximum compression level.
//! - All methods block; callers move the job onto the blocking pool.
//! - The staging file is owned by the job (then by [`FinishedArchive`]) and is removed when
//!   the owner is dropped, so an abandoned job leaves nothing behind.
//! - Any write failure closes the job; it cannot be resumed.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ConvertError, ConvertResult};
use crate::storage::{JobToken, StagedFile};

const COMPRESSION_LEVEL: i32 = 9;

/// Lifecycle of an [`ArchiveJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    /// Accepting entries.
    Open,
    /// Central directory is being written.
    Finalizing,
    /// Finished or failed; no further writes are possible.
    Closed,
}

/// A ZIP archive under construction.
pub struct ArchiveJob {
    token: JobToken,
    staging: StagedFile,
    writer: Option<ZipWriter<File>>,
    state: ArchiveState,
    entries: usize,
}

impl std::fmt::Debug for ArchiveJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveJob")
            .field("token", &self.token)
            .field("path", &self.staging.path())
            .field("state", &self.state)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// A completed archive awaiting transmission.
#[derive(Debug)]
pub struct FinishedArchive {
    /// Job that produced the archive.
    pub token: JobToken,
    /// Staging file holding the archive bytes.
    pub staging: StagedFile,
    /// Number of entries written.
    pub entries: usize,
    /// Total archive size.
    pub size_bytes: u64,
}

impl ArchiveJob {
    /// Create the staging file at `path` and open an empty archive in it.
    ///
    /// # Errors
    ///
    /// Returns an error when the staging file already exists or cannot be created.
    pub fn create(token: JobToken, path: PathBuf) -> ConvertResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| ConvertError::archive_io("archive.create", &path, source))?;
        debug!(job = %token, path = %path.display(), "archive staging file created");
        Ok(Self {
            token,
            staging: StagedFile::new(path),
            writer: Some(ZipWriter::new(file)),
            state: ArchiveState::Open,
            entries: 0,
        })
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the job is not open or the entry cannot be written. A failed
    /// append closes the job.
    pub fn append(&mut self, name: &str, bytes: &[u8]) -> ConvertResult<()> {
        if self.state != ArchiveState::Open {
            return Err(ConvertError::ArchiveState {
                operation: "archive.append",
                state: self.state,
            });
        }
        let Some(writer) = self.writer.as_mut() else {
            self.state = ArchiveState::Closed;
            return Err(ConvertError::ArchiveState {
                operation: "archive.append",
                state: self.state,
            });
        };

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));
        let written = writer
            .start_file(name, options)
            .map_err(|source| {
                ConvertError::archive_zip("archive.start_entry", self.staging.path(), source)
            })
            .and_then(|()| {
                writer.write_all(bytes).map_err(|source| {
                    ConvertError::archive_io("archive.write_entry", self.staging.path(), source)
                })
            });

        match written {
            Ok(()) => {
                self.entries += 1;
                Ok(())
            }
            Err(err) => {
                self.state = ArchiveState::Closed;
                self.writer = None;
                Err(err)
            }
        }
    }

    /// Write the central directory and hand over the staging file.
    ///
    /// # Errors
    ///
    /// Returns an error when the job is not open or the archive cannot be finalised; the
    /// staging file is removed in that case.
    pub fn finish(mut self) -> ConvertResult<FinishedArchive> {
        if self.state != ArchiveState::Open {
            return Err(ConvertError::ArchiveState {
                operation: "archive.finish",
                state: self.state,
            });
        }
        self.state = ArchiveState::Finalizing;
        let Some(mut writer) = self.writer.take() else {
            return Err(ConvertError::ArchiveState {
                operation: "archive.finish",
                state: self.state,
            });
        };

        let mut file = writer.finish().map_err(|source| {
            ConvertError::archive_zip("archive.finish", self.staging.path(), source)
        })?;
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|source| ConvertError::archive_io("archive.sync", self.staging.path(), source))?;
        let size_bytes = file
            .seek(SeekFrom::End(0))
            .map_err(|source| ConvertError::archive_io("archive.size", self.staging.path(), source))?;
        self.state = ArchiveState::Closed;
        debug!(
            job = %self.token,
            entries = self.entries,
            size_bytes,
            "archive finalised"
        );

        Ok(FinishedArchive {
            token: self.token,
            staging: self.staging,
            entries: self.entries,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Read;
    use tempfile::TempDir;

    fn open_job(temp: &TempDir) -> Result<ArchiveJob> {
        Ok(ArchiveJob::create(
            JobToken::generate(),
            temp.path().join("job.zip"),
        )?)
    }

    #[test]
    fn entries_are_written_in_order_and_deflated() -> Result<()> {
        let temp = TempDir::new()?;
        let mut job = open_job(&temp)?;
        job.append("b.webp", &[7u8; 4096])?;
        job.append("a.webp", b"second")?;
        let finished = job.finish()?;
        assert_eq!(finished.entries, 2);
        assert_eq!(
            finished.size_bytes,
            std::fs::metadata(finished.staging.path())?.len()
        );

        let mut archive = zip::ZipArchive::new(File::open(finished.staging.path())?)?;
        assert_eq!(archive.len(), 2);
        let mut first = archive.by_index(0)?;
        assert_eq!(first.name(), "b.webp");
        assert_eq!(first.compression(), CompressionMethod::Deflated);
        let mut body = Vec::new();
        first.read_to_end(&mut body)?;
        assert_eq!(body, vec![7u8; 4096]);
        drop(first);
        assert_eq!(archive.by_index(1)?.name(), "a.webp");
        Ok(())
    }

    #[test]
    fn empty_archive_is_valid() -> Result<()> {
        let temp = TempDir::new()?;
        let finished = open_job(&temp)?.finish()?;
        assert_eq!(finished.entries, 0);
        let archive = zip::ZipArchive::new(File::open(finished.staging.path())?)?;
        assert_eq!(archive.len(), 0);
        Ok(())
    }

    #[test]
    fn staging_file_is_removed_when_dropped() -> Result<()> {
        let temp = TempDir::new()?;
        let mut job = open_job(&temp)?;
        job.append("a.webp", b"x")?;
        let path = temp.path().join("job.zip");
        assert!(path.exists());
        drop(job);
        assert!(!path.exists());

        let finished = open_job(&temp)?.finish()?;
        drop(finished);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn create_refuses_existing_staging_file() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("job.zip"), b"other job")?;
        let err = open_job(&temp)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected create failure"))?;
        assert!(err.to_string().contains("archive io failure"));
        assert_eq!(std::fs::read(temp.path().join("job.zip"))?, b"other job");
        Ok(())
    }

    #[test]
    fn create_fails_when_output_area_is_missing() {
        let err = ArchiveJob::create(
            JobToken::generate(),
            PathBuf::from("/nonexistent-picpress-area/job.zip"),
        );
        assert!(matches!(err, Err(ConvertError::ArchiveIo { .. })));
    }
}
