//! Upload batches: files staged in the intake area for one request.
//!
//! # Design
//! - A batch owns its job token; every staged file carries that token in its name.
//! - The file limit is enforced before a new file is staged, so an oversized batch never
//!   writes more than the limit to disk.
//! - Dropping a batch (or a sink) removes everything it staged.

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{ConvertError, ConvertResult};
use crate::storage::{JobToken, StagedFile, TransientStorage};

/// One uploaded file persisted in the intake area.
#[derive(Debug)]
pub struct UploadedFile {
    original_name: String,
    staged: StagedFile,
    size: u64,
}

impl UploadedFile {
    /// Client-supplied filename.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Staged copy of the upload.
    #[must_use]
    pub const fn staged(&self) -> &StagedFile {
        &self.staged
    }

    /// Bytes received for this file.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Split into the original name and the staged file.
    #[must_use]
    pub fn into_parts(self) -> (String, StagedFile) {
        (self.original_name, self.staged)
    }
}

/// Ordered collection of uploads for one conversion request.
#[derive(Debug)]
pub struct UploadBatch {
    token: JobToken,
    files: Vec<UploadedFile>,
    max_files: usize,
}

impl UploadBatch {
    /// Start an empty batch with a freshly generated job token.
    #[must_use]
    pub fn new(max_files: usize) -> Self {
        Self::with_token(JobToken::generate(), max_files)
    }

    /// Start an empty batch with an explicit job token.
    #[must_use]
    pub const fn with_token(token: JobToken, max_files: usize) -> Self {
        Self {
            token,
            files: Vec::new(),
            max_files,
        }
    }

    /// Job token shared by every file in the batch.
    #[must_use]
    pub const fn token(&self) -> &JobToken {
        &self.token
    }

    /// Number of files staged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files have been staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Staged files in arrival order.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Open a sink for the next file in the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::TooManyFiles`] once the batch holds `max_files` files, or an IO
    /// error when the staging file cannot be created.
    pub async fn begin_file(
        &self,
        storage: &TransientStorage,
        original_name: &str,
    ) -> ConvertResult<UploadSink> {
        if self.files.len() >= self.max_files {
            return Err(ConvertError::TooManyFiles {
                limit: self.max_files,
            });
        }
        let (staged, file) = storage
            .stage(&self.token, self.files.len(), original_name)
            .await?;
        Ok(UploadSink {
            original_name: original_name.to_string(),
            staged,
            file,
            size: 0,
        })
    }

    /// Append a completed upload.
    pub fn push(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// Split into the job token and the staged files.
    #[must_use]
    pub fn into_parts(self) -> (JobToken, Vec<UploadedFile>) {
        (self.token, self.files)
    }
}

/// Writer for one in-progress upload.
#[derive(Debug)]
pub struct UploadSink {
    original_name: String,
    staged: StagedFile,
    file: File,
    size: u64,
}

impl UploadSink {
    /// Append a chunk of the upload body.
    ///
    /// # Errors
    ///
    /// Returns an error when the chunk cannot be written.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> ConvertResult<()> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|source| ConvertError::io("upload.write", self.staged.path(), source))?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Flush and close the staging file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be flushed.
    pub async fn finish(mut self) -> ConvertResult<UploadedFile> {
        self.file
            .flush()
            .await
            .map_err(|source| ConvertError::io("upload.flush", self.staged.path(), source))?;
        self.file
            .sync_data()
            .await
            .map_err(|source| ConvertError::io("upload.sync", self.staged.path(), source))?;
        let Self {
            original_name,
            staged,
            file,
            size,
        } = self;
        drop(file);
        Ok(UploadedFile {
            original_name,
            staged,
            size,
        })
    }
}
