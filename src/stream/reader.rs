//! Reading facade over any `AsyncBufRead`.

use crate::config::{CodecConfig, DEFAULT_SEGMENT_SIZE, MAX_TEXT_CHARS};
use crate::core::digest::{check_output_len, StreamingDigest};
use crate::core::read;
use crate::core::sink::ByteSink;
use crate::core::text::{DecodeContext, TextEncoding};
use crate::error::Result;
use crate::utils::endian::{Endian, Primitive};
use crate::utils::length::LengthPrefix;
use crate::utils::metrics::CodecMetrics;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Typed reads from one byte source
#[derive(Debug)]
pub struct WireReader<R> {
    source: R,
    decoder: DecodeContext,
    length_prefix: LengthPrefix,
    max_chars: usize,
    segment_size: usize,
    cancel: CancellationToken,
    metrics: Option<Arc<CodecMetrics>>,
}

impl<R: AsyncBufRead + Unpin> WireReader<R> {
    /// UTF-8 text behind compressed length prefixes
    pub fn new(source: R) -> Self {
        Self {
            source,
            decoder: DecodeContext::new(TextEncoding::Utf8),
            length_prefix: LengthPrefix::Compressed,
            max_chars: MAX_TEXT_CHARS,
            segment_size: DEFAULT_SEGMENT_SIZE,
            cancel: CancellationToken::new(),
            metrics: None,
        }
    }

    /// Take encoding, prefix format and limits from `config`
    pub fn with_config(source: R, config: &CodecConfig) -> Self {
        Self {
            decoder: DecodeContext::new(config.text.encoding),
            length_prefix: config.text.length_prefix,
            max_chars: config.text.max_chars,
            segment_size: config.write.segment_size,
            ..Self::new(source)
        }
    }

    /// Observe `cancel` in every subsequent read
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

    pub fn encoding(&self) -> TextEncoding {
        self.decoder.encoding()
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Some(metrics) = &self.metrics {
            metrics.record_read(&result);
        }
        result
    }

    /// Read one value in native byte order
    pub async fn read<T: Primitive>(&mut self) -> Result<T> {
        let result = read::read_primitive(&mut self.source, &self.cancel).await;
        self.observe(result)
    }

    pub async fn read_endian<T: Primitive>(&mut self, endian: Endian) -> Result<T> {
        let result = read::read_endian(&mut self.source, endian, &self.cancel).await;
        self.observe(result)
    }

    pub async fn read_le<T: Primitive>(&mut self) -> Result<T> {
        self.read_endian(Endian::Little).await
    }

    pub async fn read_be<T: Primitive>(&mut self) -> Result<T> {
        self.read_endian(Endian::Big).await
    }

    pub async fn read_varint(&mut self) -> Result<u32> {
        let result = read::read_varint(&mut self.source, &self.cancel).await;
        self.observe(result)
    }

    pub async fn read_length(&mut self, format: LengthPrefix) -> Result<usize> {
        let result = read::read_length(&mut self.source, format, &self.cancel).await;
        self.observe(result)
    }

    /// Read text behind the configured length prefix
    pub async fn read_string(&mut self) -> Result<String> {
        self.read_string_with(self.length_prefix).await
    }

    /// Read text behind a length prefix in `format`
    ///
    /// # Errors
    /// `InvalidLength` if the declared count exceeds the configured maximum;
    /// nothing past the prefix is consumed in that case.
    pub async fn read_string_with(&mut self, format: LengthPrefix) -> Result<String> {
        let result = read::read_prefixed_text(
            &mut self.source,
            format,
            self.max_chars,
            &mut self.decoder,
            &self.cancel,
        )
        .await;
        self.observe(result)
    }

    /// Read exactly `chars` characters with no prefix
    pub async fn read_string_exact(&mut self, chars: usize) -> Result<String> {
        let result = read::read_text(&mut self.source, chars, &mut self.decoder, &self.cancel).await;
        self.observe(result)
    }

    pub async fn read_block(&mut self, dst: &mut [u8]) -> Result<()> {
        let result = read::read_block(&mut self.source, dst, &self.cancel).await;
        self.observe(result)
    }

    pub async fn read_up_to(&mut self, dst: &mut [u8]) -> Result<usize> {
        let result = read::read_up_to(&mut self.source, dst, &self.cancel).await;
        self.observe(result)
    }

    pub async fn hash_exact<D: StreamingDigest>(&mut self, digest: &mut D, len: u64) -> Result<u64> {
        let result = read::hash_exact(&mut self.source, digest, len, &self.cancel).await;
        self.observe(result)
    }

    pub async fn hash_to_end<D: StreamingDigest>(&mut self, digest: &mut D) -> Result<u64> {
        let result = read::hash_to_end(&mut self.source, digest, &self.cancel).await;
        self.observe(result)
    }

    /// Hash exactly `len` bytes with a fresh `D` and write the digest to `out`
    ///
    /// # Errors
    /// `InvalidConfiguration` if `out` is not exactly the digest size. This
    /// is checked before anything is read.
    #[instrument(level = "debug", skip(self, out), fields(out_len = out.len()))]
    pub async fn digest_exact<D>(&mut self, len: u64, out: &mut [u8]) -> Result<()>
    where
        D: StreamingDigest + Default,
    {
        let mut digest = D::default();
        check_output_len(out, digest.output_len())?;
        self.hash_exact(&mut digest, len).await?;
        digest.finalize_into(out)
    }

    /// Forward `limit` bytes (or everything left) into `sink`
    pub async fn copy_to<S>(&mut self, sink: &mut S, limit: Option<u64>) -> Result<u64>
    where
        S: ByteSink + ?Sized,
    {
        let result =
            read::copy_to_sink(&mut self.source, sink, limit, self.segment_size, &self.cancel)
                .await;
        self.observe(result)
    }

    pub fn get_ref(&self) -> &R {
        &self.source
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_mixed_reads() {
        let data: &[u8] = &[0x2A, 0, 0, 0, 0x00, 0x01, 0xAC, 0x02, 0x02, b'h', b'i'];
        let mut reader = WireReader::new(data);
        assert_eq!(reader.read_le::<u32>().await.expect("u32"), 42);
        assert_eq!(reader.read_be::<u16>().await.expect("u16"), 1);
        assert_eq!(reader.read_varint().await.expect("varint"), 300);
        assert_eq!(reader.read_string().await.expect("text"), "hi");
    }

    #[tokio::test]
    async fn test_declared_length_above_limit() {
        let config = CodecConfig::default_with_overrides(|c| c.text.max_chars = 4);
        let data: &[u8] = &[0x05, b'a', b'b', b'c', b'd', b'e'];
        let mut reader = WireReader::with_config(data, &config);
        assert!(matches!(
            reader.read_string().await,
            Err(CodecError::InvalidLength(5))
        ));
        // Only the prefix was consumed
        assert_eq!(reader.get_ref().len(), 5);
    }

    #[tokio::test]
    async fn test_digest_output_checked_before_reading() {
        let data: &[u8] = b"payload";
        let mut reader = WireReader::new(data);
        let mut out = [0u8; 16];
        let result = reader.digest_exact::<sha2::Sha256>(7, &mut out).await;
        assert!(matches!(result, Err(CodecError::InvalidConfiguration(_))));
        assert_eq!(reader.get_ref().len(), 7);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_metrics_count_end_of_input() {
        let metrics = Arc::new(CodecMetrics::new());
        let data: &[u8] = &[1, 2];
        let mut reader = WireReader::new(data).with_metrics(Arc::clone(&metrics));
        assert!(reader.read::<u32>().await.is_err());
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reads_total, 1);
        assert_eq!(snapshot.end_of_input, 1);
    }
}
