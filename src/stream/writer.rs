//! Writing facade over any [`ByteSink`].
//!
//! Once the sink reports [`FlushStatus::Completed`] the writer is finished:
//! every later write fails with `EndOfInput` without touching the sink.

use crate::config::CodecConfig;
use crate::core::sink::{ByteSink, FlushStatus};
use crate::core::text::{EncodeContext, TextEncoding};
use crate::core::write::{self, TextWriteOptions};
use crate::error::{CodecError, Result};
use crate::utils::endian::{Endian, Primitive};
use crate::utils::length::LengthPrefix;
use crate::utils::metrics::CodecMetrics;
use bytes::Buf;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sink wrapper that notices completion and feeds metrics
struct Observed<'a, S> {
    sink: &'a mut S,
    metrics: Option<&'a CodecMetrics>,
    completed: bool,
}

impl<'a, S> Observed<'a, S> {
    fn new(sink: &'a mut S, metrics: &'a Option<Arc<CodecMetrics>>) -> Self {
        Self {
            sink,
            metrics: metrics.as_deref(),
            completed: false,
        }
    }
}

impl<S: ByteSink + Send> ByteSink for Observed<'_, S> {
    fn writable(&mut self, size_hint: usize) -> &mut [u8] {
        self.sink.writable(size_hint)
    }

    fn advance(&mut self, written: usize) {
        if let Some(metrics) = self.metrics {
            metrics.bytes_written(written as u64);
        }
        self.sink.advance(written);
    }

    fn flush(&mut self) -> impl Future<Output = Result<FlushStatus>> + Send {
        async move {
            let status = self.sink.flush().await?;
            if let Some(metrics) = self.metrics {
                metrics.flushed();
            }
            self.completed |= status.is_completed();
            Ok(status)
        }
    }
}

/// Typed writes into one byte sink
#[derive(Debug)]
pub struct WireWriter<S> {
    sink: S,
    encoder: EncodeContext,
    length_prefix: LengthPrefix,
    options: TextWriteOptions,
    cancel: CancellationToken,
    metrics: Option<Arc<CodecMetrics>>,
    completed: bool,
}

impl<S: ByteSink + Send> WireWriter<S> {
    /// UTF-8 text behind compressed length prefixes
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            encoder: EncodeContext::new(TextEncoding::Utf8),
            length_prefix: LengthPrefix::Compressed,
            options: TextWriteOptions::default(),
            cancel: CancellationToken::new(),
            metrics: None,
            completed: false,
        }
    }

    /// Take encoding, prefix format, threshold and segment size from `config`
    pub fn with_config(sink: S, config: &CodecConfig) -> Self {
        Self {
            encoder: EncodeContext::new(config.text.encoding),
            length_prefix: config.text.length_prefix,
            options: TextWriteOptions {
                threshold: config.text.write_threshold,
                segment_size: config.write.segment_size,
            },
            ..Self::new(sink)
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the sink has signaled completion
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.completed {
            Err(CodecError::EndOfInput)
        } else {
            Ok(())
        }
    }

    fn settle<T>(&mut self, completed: bool, result: Result<T>) -> Result<T> {
        if completed && !self.completed {
            debug!("Sink completed; writer closed");
            self.completed = true;
            if let Some(metrics) = &self.metrics {
                metrics.sink_completed();
            }
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_write(&result);
        }
        result
    }

    /// Write one value in native byte order
    pub async fn write<T: Primitive>(&mut self, value: T) -> Result<FlushStatus> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::write_primitive(&mut sink, value, &self.cancel).await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    pub async fn write_endian<T: Primitive>(
        &mut self,
        value: T,
        endian: Endian,
    ) -> Result<FlushStatus> {
        self.write(endian.normalize(value)).await
    }

    pub async fn write_le<T: Primitive>(&mut self, value: T) -> Result<FlushStatus> {
        self.write_endian(value, Endian::Little).await
    }

    pub async fn write_be<T: Primitive>(&mut self, value: T) -> Result<FlushStatus> {
        self.write_endian(value, Endian::Big).await
    }

    pub async fn write_varint(&mut self, value: u32) -> Result<FlushStatus> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::write_varint(&mut sink, value, &self.cancel).await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    pub async fn write_length(&mut self, len: usize, format: LengthPrefix) -> Result<FlushStatus> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::write_length(&mut sink, len, format, &self.cancel).await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    /// Write text behind the configured length prefix
    pub async fn write_string(&mut self, text: &str) -> Result<FlushStatus> {
        self.write_string_with(text, self.length_prefix).await
    }

    /// Write text behind a length prefix in `format` (none for `LengthPrefix::None`)
    pub async fn write_string_with(
        &mut self,
        text: &str,
        format: LengthPrefix,
    ) -> Result<FlushStatus> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::write_text(
            &mut sink,
            text,
            format,
            &mut self.encoder,
            &self.options,
            &self.cancel,
        )
        .await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    /// Write every chunk of `data`, returning the bytes written
    ///
    /// Stops early without error if the sink completes; the writer is closed
    /// afterwards.
    pub async fn write_buf<B: Buf>(&mut self, data: B) -> Result<u64> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::write_buf(&mut sink, data, &self.cancel).await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    /// Flush without writing anything
    pub async fn flush(&mut self) -> Result<FlushStatus> {
        self.ensure_open()?;
        let mut sink = Observed::new(&mut self.sink, &self.metrics);
        let result = write::flush_sink(&mut sink, &self.cancel).await;
        let completed = sink.completed;
        self.settle(completed, result)
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::MemorySink;

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_writes_in_order() {
        let mut writer = WireWriter::new(MemorySink::new());
        writer.write_le(0x0102u16).await.expect("u16");
        writer.write_varint(300).await.expect("varint");
        writer
            .write_string_with("hi", LengthPrefix::PlainLittleEndian)
            .await
            .expect("text");
        assert_eq!(
            writer.get_ref().as_slice(),
            &[0x02, 0x01, 0xAC, 0x02, 2, 0, 0, 0, b'h', b'i']
        );
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_writes_refused_after_completion() {
        let mut writer = WireWriter::new(MemorySink::with_limit(4));
        let status = writer.write(7u32).await.expect("write");
        assert_eq!(status, FlushStatus::Completed);
        assert!(writer.is_completed());

        assert!(matches!(writer.write(1u8).await, Err(CodecError::EndOfInput)));
        assert_eq!(writer.get_ref().as_slice().len(), 4);
        assert_eq!(writer.get_ref().flush_count(), 1);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_metrics_follow_sink() {
        let metrics = Arc::new(CodecMetrics::new());
        let mut writer =
            WireWriter::new(MemorySink::with_limit(3)).with_metrics(Arc::clone(&metrics));
        let written = writer
            .write_buf(bytes::Bytes::from_static(b"abcdef"))
            .await
            .expect("write");
        assert_eq!(written, 6);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.writes_total, 1);
        assert_eq!(snapshot.bytes_written, 6);
        assert_eq!(snapshot.flushes, 1);
        assert_eq!(snapshot.sink_completions, 1);
    }

    #[tokio::test]
    async fn test_canceled_writer() {
        let cancel = CancellationToken::new();
        let mut writer = WireWriter::new(MemorySink::new()).with_cancellation(cancel.clone());
        cancel.cancel();
        assert!(matches!(writer.write_varint(1).await, Err(CodecError::Canceled)));
        assert!(!writer.is_completed());
        assert!(writer.get_ref().as_slice().is_empty());
    }
}
