//! # Read Entry Points
//!
//! Typed reads built on [`drive`]. Each call constructs a fresh parser,
//! drives it to completion, and returns the finished value. Nothing is
//! buffered here; unconsumed bytes stay in the source for the next call.
//!
//! ## Cancellation
//! Every read observes its `CancellationToken` while waiting for input. Once
//! canceled, the partially filled parser is dropped and `Canceled` is
//! returned; bytes already consumed are not given back.

use crate::config::MAX_TEXT_PRESIZE;
use crate::core::digest::StreamingDigest;
use crate::core::parser::{drive, ensure_active};
use crate::core::parsers::{
    BlockParser, FixedParser, HashParser, LengthParser, TextParser, VarintParser,
};
use crate::core::sink::ByteSink;
use crate::core::text::DecodeContext;
use crate::core::write::flush_sink;
use crate::error::{CodecError, Result};
use crate::utils::endian::{Endian, Primitive};
use crate::utils::length::LengthPrefix;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Read one fixed-layout value in native byte order
pub async fn read_primitive<R, T>(source: &mut R, cancel: &CancellationToken) -> Result<T>
where
    R: AsyncBufRead + Unpin + ?Sized,
    T: Primitive,
{
    drive(source, FixedParser::<T>::new(), cancel).await
}

/// Read one fixed-layout value stored in `endian` order
pub async fn read_endian<R, T>(
    source: &mut R,
    endian: Endian,
    cancel: &CancellationToken,
) -> Result<T>
where
    R: AsyncBufRead + Unpin + ?Sized,
    T: Primitive,
{
    let raw = read_primitive::<R, T>(source, cancel).await?;
    Ok(endian.normalize(raw))
}

/// Fill `dst` completely
pub async fn read_block<R>(
    source: &mut R,
    dst: &mut [u8],
    cancel: &CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    drive(source, BlockParser::exact(dst), cancel).await?;
    Ok(())
}

/// Fill as much of `dst` as the source provides, returning the count
pub async fn read_up_to<R>(
    source: &mut R,
    dst: &mut [u8],
    cancel: &CancellationToken,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    drive(source, BlockParser::up_to(dst), cancel).await
}

/// Read a 7-bit variable-length `u32`
pub async fn read_varint<R>(source: &mut R, cancel: &CancellationToken) -> Result<u32>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    drive(source, VarintParser::new(), cancel).await
}

/// Read a length prefix
///
/// # Errors
/// `InvalidConfiguration` for `LengthPrefix::None`, before touching the source.
pub async fn read_length<R>(
    source: &mut R,
    format: LengthPrefix,
    cancel: &CancellationToken,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let parser = LengthParser::new(format)?;
    drive(source, parser, cancel).await
}

/// Read exactly `chars` characters
///
/// Zero characters returns immediately without touching the source.
pub async fn read_text<R>(
    source: &mut R,
    chars: usize,
    ctx: &mut DecodeContext,
    cancel: &CancellationToken,
) -> Result<String>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    if chars == 0 {
        return Ok(String::new());
    }
    let parser = TextParser::new(ctx, chars, chars.min(MAX_TEXT_PRESIZE));
    drive(source, parser, cancel).await
}

/// Read a length prefix in `format` followed by that many characters
///
/// Lengths above `max_chars` fail with `InvalidLength` before any text is read.
#[instrument(level = "debug", skip(source, format, ctx, cancel), fields(format = format.name()))]
pub async fn read_prefixed_text<R>(
    source: &mut R,
    format: LengthPrefix,
    max_chars: usize,
    ctx: &mut DecodeContext,
    cancel: &CancellationToken,
) -> Result<String>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let chars = read_length(source, format, cancel).await?;
    if chars > max_chars {
        debug!(chars, max_chars, "Declared text length exceeds limit");
        return Err(CodecError::InvalidLength(
            i64::try_from(chars).unwrap_or(i64::MAX),
        ));
    }
    read_text(source, chars, ctx, cancel).await
}

/// Hash exactly `len` bytes, returning the count hashed
pub async fn hash_exact<R, D>(
    source: &mut R,
    digest: &mut D,
    len: u64,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin + ?Sized,
    D: StreamingDigest,
{
    drive(source, HashParser::bounded(digest, len), cancel).await
}

/// Hash everything until the source is exhausted, returning the count hashed
pub async fn hash_to_end<R, D>(
    source: &mut R,
    digest: &mut D,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin + ?Sized,
    D: StreamingDigest,
{
    drive(source, HashParser::unbounded(digest), cancel).await
}

/// Forward bytes from `source` into `sink`, one region per round
///
/// With `limit`, exactly that many bytes are copied and running out of input
/// (or the sink completing) first is `EndOfInput`. Without it everything is
/// copied until the source is exhausted or the sink completes. Returns the
/// number of bytes forwarded.
#[instrument(level = "debug", skip(source, sink, cancel))]
pub async fn copy_to_sink<R, S>(
    source: &mut R,
    sink: &mut S,
    limit: Option<u64>,
    segment_size: usize,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin + ?Sized,
    S: ByteSink + ?Sized,
{
    ensure_active(cancel)?;
    let segment_size = segment_size.max(1);
    let mut total = 0u64;

    loop {
        let want = match limit {
            Some(limit) if total >= limit => break,
            Some(limit) => usize::try_from(limit - total)
                .map_or(segment_size, |left| left.min(segment_size)),
            None => segment_size,
        };

        let region = &mut sink.writable(want)[..want];
        let parser = match limit {
            Some(_) => BlockParser::exact(region),
            None => BlockParser::up_to(region),
        };
        let filled = drive(source, parser, cancel).await?;
        sink.advance(filled);
        total += filled as u64;

        let status = flush_sink(sink, cancel).await?;
        if filled < want {
            break;
        }
        if status.is_completed() {
            if limit.is_some_and(|limit| total < limit) {
                return Err(CodecError::EndOfInput);
            }
            break;
        }
    }

    debug!(total, "Forwarding finished");
    Ok(total)
}
