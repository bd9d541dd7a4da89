//! # Write Engine
//!
//! Encoding of primitives, variable-length integers, length prefixes, text and
//! raw byte sequences into a [`ByteSink`], with a flush after each unit of
//! work.
//!
//! Every call returns the sink's [`FlushStatus`]. Once a sink reports
//! `Completed`, its consumer is gone and further writes for the same message
//! are invalid; the caller decides what that means for its protocol.
//!
//! ## Text
//! ```text
//! [prefix?][payload]
//! ```
//! Payloads whose encoded size is below the configured threshold are written
//! into one region and flushed once. Larger payloads, or any payload when no
//! threshold is set, are encoded chunk by chunk with a flush per chunk, so a
//! slow consumer applies backpressure and cancellation is observed between
//! chunks.

use crate::core::parser::ensure_active;
use crate::core::sink::{ByteSink, FlushStatus};
use crate::core::text::EncodeContext;
use crate::error::{constants, CodecError, Result};
use crate::utils::endian::{Endian, Primitive};
use crate::utils::length::{encode_length, LengthPrefix};
use crate::utils::varint::{self, MAX_VARINT_LEN};
use bytes::Buf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

/// Text write tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWriteOptions {
    /// Encoded size (bytes) below which the payload goes out in one region
    pub threshold: Option<usize>,
    /// Region size requested per chunk on the chunked path
    pub segment_size: usize,
}

impl Default for TextWriteOptions {
    fn default() -> Self {
        Self {
            threshold: Some(crate::config::DEFAULT_TEXT_THRESHOLD),
            segment_size: crate::config::DEFAULT_SEGMENT_SIZE,
        }
    }
}

/// Flush `sink`, giving up as soon as `cancel` fires
pub async fn flush_sink<S>(sink: &mut S, cancel: &CancellationToken) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CodecError::Canceled),
        status = sink.flush() => status,
    }
}

/// Copy `bytes` into one sink region and flush
async fn write_raw<S>(
    sink: &mut S,
    bytes: &[u8],
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
{
    ensure_active(cancel)?;
    let region = sink.writable(bytes.len());
    region[..bytes.len()].copy_from_slice(bytes);
    sink.advance(bytes.len());
    flush_sink(sink, cancel).await
}

/// Write one fixed-layout value in native byte order
pub async fn write_primitive<S, T>(
    sink: &mut S,
    value: T,
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
    T: Primitive,
{
    let bytes = value.to_ne_bytes();
    write_raw(sink, bytes.as_ref(), cancel).await
}

/// Write one fixed-layout value in `endian` order
pub async fn write_endian<S, T>(
    sink: &mut S,
    value: T,
    endian: Endian,
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
    T: Primitive,
{
    write_primitive(sink, endian.normalize(value), cancel).await
}

/// Write a 7-bit variable-length `u32`
pub async fn write_varint<S>(
    sink: &mut S,
    value: u32,
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
{
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = varint::encode(value, &mut buf);
    write_raw(sink, &buf[..len], cancel).await
}

/// Write `len` as a prefix in `format`
///
/// # Errors
/// `InvalidConfiguration` for `LengthPrefix::None`; `InvalidLength` if `len`
/// does not fit the format. Both are reported before touching the sink.
pub async fn write_length<S>(
    sink: &mut S,
    len: usize,
    format: LengthPrefix,
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
{
    let mut buf = [0u8; MAX_VARINT_LEN];
    let used = encode_length(len, format, &mut buf)?;
    write_raw(sink, &buf[..used], cancel).await
}

/// Write `text`, preceded by its character count unless `format` is `None`
///
/// # Errors
/// - `EndOfInput` if the sink completes while part of the text is unwritten
/// - `Canceled` if `cancel` fires before or between chunks
#[instrument(level = "debug", skip(sink, text, ctx, options, cancel), fields(bytes = text.len()))]
pub async fn write_text<S>(
    sink: &mut S,
    text: &str,
    format: LengthPrefix,
    ctx: &mut EncodeContext,
    options: &TextWriteOptions,
    cancel: &CancellationToken,
) -> Result<FlushStatus>
where
    S: ByteSink + ?Sized,
{
    ensure_active(cancel)?;

    let mut status = FlushStatus::Ready;
    if format != LengthPrefix::None {
        status = write_length(sink, text.chars().count(), format, cancel).await?;
    }
    if text.is_empty() {
        return Ok(status);
    }
    if status.is_completed() {
        return Err(CodecError::EndOfInput);
    }

    let encoding = ctx.encoding();
    let encoded_len = encoding.encoded_len(text);

    if options.threshold.is_some_and(|threshold| encoded_len < threshold) {
        trace!(encoded_len, "Single-region text write");
        let region = &mut sink.writable(encoded_len)[..encoded_len];
        let (_, written) = ctx.encode(text, region);
        debug_assert_eq!(written, encoded_len);
        sink.advance(written);
        return flush_sink(sink, cancel).await;
    }

    let chunk = options.segment_size.max(encoding.max_char_len());
    let mut rest = text;
    let mut chunks = 0usize;
    while !rest.is_empty() {
        if status.is_completed() {
            debug!(unwritten = rest.len(), "Sink completed mid-text");
            return Err(CodecError::EndOfInput);
        }

        let region = sink.writable(chunk);
        let (consumed, written) = ctx.encode(rest, region);
        if consumed == 0 {
            return Err(CodecError::InvalidConfiguration(
                constants::ERR_REGION_TOO_SMALL.to_string(),
            ));
        }
        sink.advance(written);
        rest = &rest[consumed..];
        chunks += 1;

        status = flush_sink(sink, cancel).await?;
    }

    trace!(chunks, encoded_len, "Chunked text write");
    Ok(status)
}

/// Write every chunk of `data`, flushing after each one
///
/// Stops early without error when the sink completes. Returns the number of
/// bytes written.
pub async fn write_buf<S, B>(sink: &mut S, mut data: B, cancel: &CancellationToken) -> Result<u64>
where
    S: ByteSink + ?Sized,
    B: Buf,
{
    let mut total = 0u64;

    while data.has_remaining() {
        ensure_active(cancel)?;

        let chunk = data.chunk();
        let len = chunk.len();
        sink.writable(len)[..len].copy_from_slice(chunk);
        sink.advance(len);
        data.advance(len);
        total += len as u64;

        if flush_sink(sink, cancel).await?.is_completed() {
            debug!(total, left = data.remaining(), "Sink completed before sequence end");
            break;
        }
    }

    Ok(total)
}
