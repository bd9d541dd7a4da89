//! # Byte Sinks
//!
//! The write-side collaborator: hands out writable regions, accepts how much
//! of each region was filled, and reports backpressure when flushed.
//!
//! ## Implementations
//! - **StreamSink**: stages bytes in a `BytesMut` and writes them to any
//!   `AsyncWrite` on flush. A peer that stops accepting bytes (write-zero,
//!   broken pipe, reset) is reported as completion rather than an error.
//! - **MemorySink**: collects bytes in memory, optionally reporting completion
//!   once a byte limit is reached. Useful for building messages and in tests.

use crate::error::Result;
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Outcome of a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// The consumer accepted the bytes; more writes are welcome
    Ready,
    /// The consumer is finished; further writes on this message are invalid
    Completed,
}

impl FlushStatus {
    pub fn is_completed(self) -> bool {
        self == FlushStatus::Completed
    }
}

/// Destination for encoded bytes
pub trait ByteSink {
    /// Get a writable region of at least `size_hint` bytes (and at least one)
    fn writable(&mut self, size_hint: usize) -> &mut [u8];

    /// Commit the first `written` bytes of the last region handed out
    fn advance(&mut self, written: usize);

    /// Push committed bytes to the consumer
    fn flush(&mut self) -> impl Future<Output = Result<FlushStatus>> + Send;
}

/// Staging buffer shared by the sink implementations
///
/// `buffer[..committed]` holds advanced bytes. Everything after it is
/// initialised scratch space that later regions reuse, so the buffer is only
/// zero-filled when it grows.
#[derive(Debug, Default)]
struct Staging {
    buffer: BytesMut,
    committed: usize,
}

impl Staging {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            committed: 0,
        }
    }

    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        let start = self.committed;
        let end = start + size_hint.max(1);
        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        &mut self.buffer[start..end]
    }

    fn advance(&mut self, written: usize) {
        debug_assert!(self.committed + written <= self.buffer.len());
        self.committed = (self.committed + written).min(self.buffer.len());
    }

    fn committed(&self) -> &[u8] {
        &self.buffer[..self.committed]
    }

    /// Forget committed bytes, keeping the initialised space
    fn reset(&mut self) {
        self.committed = 0;
    }
}

/// Sink over any `AsyncWrite`
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
    staging: Staging,
    completed: bool,
}

impl<W: AsyncWrite + Unpin + Send> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, crate::config::DEFAULT_SEGMENT_SIZE)
    }

    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        Self {
            inner,
            staging: Staging::with_capacity(capacity),
            completed: false,
        }
    }

    /// Bytes committed but not yet flushed
    pub fn buffered(&self) -> usize {
        self.staging.committed
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Flush remaining bytes and shut down the writer
    pub async fn close(&mut self) -> Result<()> {
        self.flush_inner().await?;
        if !self.completed {
            self.inner.shutdown().await?;
        }
        Ok(())
    }

    async fn flush_inner(&mut self) -> Result<FlushStatus> {
        if self.completed {
            self.staging.reset();
            return Ok(FlushStatus::Completed);
        }

        let pending = self.staging.committed;
        let result = match self.inner.write_all(self.staging.committed()).await {
            Ok(()) => self.inner.flush().await,
            Err(e) => Err(e),
        };

        self.staging.reset();
        match result {
            Ok(()) => Ok(FlushStatus::Ready),
            Err(e) if is_peer_gone(&e) => {
                debug!(error = %e, pending, "Writer stopped accepting bytes");
                self.completed = true;
                Ok(FlushStatus::Completed)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn is_peer_gone(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WriteZero | io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
    )
}

impl<W: AsyncWrite + Unpin + Send> ByteSink for StreamSink<W> {
    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        self.staging.writable(size_hint)
    }

    fn advance(&mut self, written: usize) {
        self.staging.advance(written);
    }

    fn flush(&mut self) -> impl Future<Output = Result<FlushStatus>> + Send {
        self.flush_inner()
    }
}

/// In-memory sink with an optional completion limit
#[derive(Debug, Default)]
pub struct MemorySink {
    staging: Staging,
    limit: Option<usize>,
    flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report completion once at least `limit` bytes have been flushed
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Number of flushes observed so far
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Committed bytes
    pub fn as_slice(&self) -> &[u8] {
        self.staging.committed()
    }

    pub fn into_bytes(mut self) -> Bytes {
        self.staging.buffer.truncate(self.staging.committed);
        self.staging.buffer.freeze()
    }
}

impl ByteSink for MemorySink {
    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        self.staging.writable(size_hint)
    }

    fn advance(&mut self, written: usize) {
        self.staging.advance(written);
    }

    fn flush(&mut self) -> impl Future<Output = Result<FlushStatus>> + Send {
        self.flushes += 1;
        let status = match self.limit {
            Some(limit) if self.staging.committed >= limit => FlushStatus::Completed,
            _ => FlushStatus::Ready,
        };
        std::future::ready(Ok(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_commits_only_advanced_bytes() {
        let mut staging = Staging::default();
        let region = staging.writable(8);
        assert_eq!(region.len(), 8);
        region[..3].copy_from_slice(b"abc");
        staging.advance(3);
        assert_eq!(staging.committed(), b"abc");
    }

    #[test]
    fn test_staging_rerequest_replaces_region() {
        let mut staging = Staging::default();
        staging.writable(8);
        let region = staging.writable(2);
        region.copy_from_slice(b"xy");
        staging.advance(2);
        assert_eq!(staging.committed(), b"xy");
    }

    #[test]
    fn test_staging_reuses_initialised_space() {
        let mut staging = Staging::default();
        staging.writable(64)[..4].copy_from_slice(b"abcd");
        staging.advance(4);
        staging.reset();
        let capacity = staging.buffer.capacity();

        let region = staging.writable(16);
        assert_eq!(region.len(), 16);
        // Old scratch bytes are handed out as-is, not zeroed again
        assert_eq!(&region[..4], b"abcd");
        assert_eq!(staging.buffer.len(), 64);
        assert_eq!(staging.buffer.capacity(), capacity);
        assert!(staging.committed().is_empty());
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_memory_sink_limit() {
        let mut sink = MemorySink::with_limit(4);
        sink.writable(2).copy_from_slice(b"ab");
        sink.advance(2);
        assert_eq!(sink.flush().await.expect("flush"), FlushStatus::Ready);
        sink.writable(2).copy_from_slice(b"cd");
        sink.advance(2);
        assert_eq!(sink.flush().await.expect("flush"), FlushStatus::Completed);
        assert_eq!(sink.flush_count(), 2);
        assert_eq!(&sink.into_bytes()[..], b"abcd");
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_stream_sink_writes_on_flush() {
        let mut sink = StreamSink::new(Vec::new());
        sink.writable(5).copy_from_slice(b"hello");
        sink.advance(5);
        assert_eq!(sink.buffered(), 5);
        assert!(sink.get_ref().is_empty());
        assert_eq!(sink.flush().await.expect("flush"), FlushStatus::Ready);
        assert_eq!(sink.get_ref().as_slice(), b"hello");
        assert_eq!(sink.buffered(), 0);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_stream_sink_closed_peer_is_completion() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut sink = StreamSink::new(client);
        sink.writable(3).copy_from_slice(b"abc");
        sink.advance(3);
        assert_eq!(sink.flush().await.expect("flush"), FlushStatus::Completed);
    }
}
