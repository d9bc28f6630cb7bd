#![forbid(unsafe_code)]
#![warn(
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Upload, convert, archive, and cleanup pipeline for batch image conversion.
//!
//! Layout: `storage.rs` (transient areas and staged files), `naming.rs` (name sanitising and
//! archive entry allocation), `upload.rs` (request batches), `transcoder.rs` (codec seam),
//! `archive.rs` (ZIP job), `pipeline.rs` (orchestration), `stream.rs` (response body).

pub mod archive;
pub mod error;
pub mod naming;
pub mod outcome;
pub mod pipeline;
pub mod storage;
pub mod stream;
pub mod transcoder;
pub mod upload;

pub use archive::{ArchiveJob, ArchiveState, FinishedArchive};
pub use error::{ConvertError, ConvertResult};
pub use naming::OutputNames;
pub use outcome::{ConversionOutcome, FailureReason};
pub use pipeline::{ConversionPipeline, ConvertedArchive};
pub use storage::{AreaKind, ClearReport, JobToken, StagedFile, TransientArea, TransientStorage};
pub use stream::ArchiveStream;
pub use transcoder::{ImageProbe, TranscodeError, Transcoder, WebpTranscoder};
pub use upload::{UploadBatch, UploadSink, UploadedFile};
