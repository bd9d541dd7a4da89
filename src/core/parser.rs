//! # Incremental Parsing
//!
//! The parser contract and the engine that drives it against a byte source.
//!
//! A parser is a small value holding its remaining demand and whatever it has
//! accumulated so far. The engine hands it each segment the source makes
//! available, releases exactly the prefix the parser consumed, and stops once
//! the demand reaches zero or the source runs dry.
//!
//! ```text
//! fill_buf() ──► step(segment) ──► consume(n) ──┐
//!      ▲                                        │
//!      └──────────── demand > 0 ◄───────────────┘
//! ```
//!
//! Any `AsyncBufRead` is a byte source: `fill_buf` awaits the next segment
//! (empty once exhausted) and `consume` releases a prefix of it.

use crate::error::{CodecError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A step-wise consumer of bytes producing one value
pub trait Parse {
    type Output;

    /// Units still required before the parser is satisfied
    ///
    /// Unbounded parsers report a hint here and never complete on demand.
    fn remaining(&self) -> usize;

    /// Whether the parser needs no further input
    fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume a prefix of `segment`, returning how many bytes were used
    fn step(&mut self, segment: &[u8]) -> Result<usize>;

    /// Called when the source is exhausted before the parser completed
    fn end_of_input(&mut self) -> Result<()> {
        Err(CodecError::EndOfInput)
    }

    /// Produce the parsed value; consumes the parser
    fn finish(self) -> Result<Self::Output>;
}

/// Fail fast if the operation has already been canceled
#[inline]
pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(CodecError::Canceled)
    } else {
        Ok(())
    }
}

/// Drive `parser` against `source` until it is satisfied
///
/// # Errors
/// - `CodecError::Canceled` if `cancel` fires while waiting for a segment
/// - `CodecError::EndOfInput` if a bounded parser runs out of input
/// - any error the parser or the source reports
pub async fn drive<R, P>(
    source: &mut R,
    mut parser: P,
    cancel: &CancellationToken,
) -> Result<P::Output>
where
    R: AsyncBufRead + Unpin + ?Sized,
    P: Parse,
{
    while !parser.is_complete() {
        let segment = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CodecError::Canceled),
            segment = source.fill_buf() => segment?,
        };

        if segment.is_empty() {
            trace!(remaining = parser.remaining(), "Source exhausted");
            parser.end_of_input()?;
            break;
        }

        let offered = segment.len();
        let consumed = parser.step(segment)?;
        debug_assert!(consumed <= offered);
        source.consume(consumed);
        trace!(offered, consumed, remaining = parser.remaining(), "Parser step");
    }

    parser.finish()
}
