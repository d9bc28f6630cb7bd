//! Response body for a finished archive.
//!
//! The stream reads the staging file in chunks and owns it until the last byte is yielded.
//! Completion, a read error, or an early drop (client disconnect) all remove the file.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::pipeline::ActiveJobGuard;
use crate::storage::{JobToken, StagedFile};

/// Chunked reader over a finished archive.
#[derive(Debug)]
pub struct ArchiveStream {
    inner: Option<ReaderStream<File>>,
    staging: Option<StagedFile>,
    token: JobToken,
    sent: u64,
    expected: u64,
    _active: ActiveJobGuard,
}

impl ArchiveStream {
    pub(crate) fn new(
        file: File,
        staging: StagedFile,
        token: JobToken,
        expected: u64,
        active: ActiveJobGuard,
    ) -> Self {
        Self {
            inner: Some(ReaderStream::new(file)),
            staging: Some(staging),
            token,
            sent: 0,
            expected,
            _active: active,
        }
    }

    /// Total archive size; suitable for `Content-Length`.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.expected
    }

    /// Bytes yielded so far.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    fn close(&mut self) {
        self.inner = None;
        self.staging = None;
    }
}

impl Stream for ArchiveStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match Pin::new(inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                warn!(job = %this.token, error = %err, sent = this.sent, "archive read failed");
                this.close();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                info!(job = %this.token, bytes = this.sent, "archive transmitted");
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ArchiveStream {
    fn drop(&mut self) {
        if self.staging.is_some() {
            debug!(
                job = %self.token,
                sent = self.sent,
                expected = self.expected,
                "archive stream dropped before completion"
            );
        }
        self.close();
    }
}
