//! Concrete parsers: fixed-layout values, raw blocks, variable-length
//! integers, length prefixes, text and streaming digests.

use crate::config::HASH_CHUNK_SIZE;
use crate::core::digest::StreamingDigest;
use crate::core::parser::Parse;
use crate::core::text::DecodeContext;
use crate::error::{CodecError, Result};
use crate::utils::endian::{Endian, Primitive};
use crate::utils::length::{checked_plain_length, LengthPrefix};
use crate::utils::varint::{CONTINUATION_BIT, LAST_BYTE_MAX, MAX_VARINT_LEN, VALUE_MASK};

/// Reads one fixed-layout value in native byte order
pub struct FixedParser<T: Primitive> {
    buf: T::Bytes,
    filled: usize,
}

impl<T: Primitive> FixedParser<T> {
    pub fn new() -> Self {
        Self {
            buf: T::Bytes::default(),
            filled: 0,
        }
    }
}

impl<T: Primitive> Default for FixedParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Primitive> std::fmt::Debug for FixedParser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedParser")
            .field("size", &T::SIZE)
            .field("filled", &self.filled)
            .finish()
    }
}

impl<T: Primitive> Parse for FixedParser<T> {
    type Output = T;

    fn remaining(&self) -> usize {
        T::SIZE - self.filled
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        let n = self.remaining().min(segment.len());
        self.buf.as_mut()[self.filled..self.filled + n].copy_from_slice(&segment[..n]);
        self.filled += n;
        Ok(n)
    }

    fn finish(self) -> Result<T> {
        if self.filled < T::SIZE {
            return Err(CodecError::EndOfInput);
        }
        Ok(T::from_ne_bytes(self.buf))
    }
}

/// Copies bytes into a caller-supplied region
///
/// In exact mode the region must be filled completely; in up-to mode running
/// out of input is fine and the filled count is returned.
#[derive(Debug)]
pub struct BlockParser<'a> {
    dst: &'a mut [u8],
    filled: usize,
    exact: bool,
}

impl<'a> BlockParser<'a> {
    pub fn exact(dst: &'a mut [u8]) -> Self {
        Self {
            dst,
            filled: 0,
            exact: true,
        }
    }

    pub fn up_to(dst: &'a mut [u8]) -> Self {
        Self {
            dst,
            filled: 0,
            exact: false,
        }
    }
}

impl Parse for BlockParser<'_> {
    type Output = usize;

    fn remaining(&self) -> usize {
        self.dst.len() - self.filled
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        let n = self.remaining().min(segment.len());
        self.dst[self.filled..self.filled + n].copy_from_slice(&segment[..n]);
        self.filled += n;
        Ok(n)
    }

    fn end_of_input(&mut self) -> Result<()> {
        if self.exact {
            Err(CodecError::EndOfInput)
        } else {
            Ok(())
        }
    }

    fn finish(self) -> Result<usize> {
        Ok(self.filled)
    }
}

/// Reads a 7-bit variable-length `u32`
///
/// The byte budget counts down with every byte; a clear continuation flag
/// ends the value immediately.
#[derive(Debug)]
pub struct VarintParser {
    value: u32,
    shift: u32,
    budget: usize,
    done: bool,
}

impl VarintParser {
    pub fn new() -> Self {
        Self {
            value: 0,
            shift: 0,
            budget: MAX_VARINT_LEN,
            done: false,
        }
    }
}

impl Default for VarintParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parse for VarintParser {
    type Output = u32;

    fn remaining(&self) -> usize {
        self.budget
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        let mut consumed = 0;
        for &byte in segment {
            if self.budget == 0 {
                break;
            }
            consumed += 1;
            self.budget -= 1;

            let more = byte & CONTINUATION_BIT != 0;
            let bits = byte & VALUE_MASK;
            if self.budget == 0 && (more || bits > LAST_BYTE_MAX) {
                return Err(CodecError::MalformedVarint);
            }

            self.value |= u32::from(bits) << self.shift;
            self.shift += 7;

            if !more {
                self.budget = 0;
                self.done = true;
                break;
            }
        }
        Ok(consumed)
    }

    fn finish(self) -> Result<u32> {
        if !self.done {
            return Err(CodecError::EndOfInput);
        }
        Ok(self.value)
    }
}

/// Reads a length prefix in any format that carries one
#[derive(Debug)]
pub enum LengthParser {
    Plain(FixedParser<i32>, Endian),
    Compressed(VarintParser),
}

impl LengthParser {
    /// Fails with `InvalidConfiguration` for `LengthPrefix::None`
    pub fn new(format: LengthPrefix) -> Result<Self> {
        let format = format.require_prefix()?;
        Ok(match format.endian() {
            Some(endian) => LengthParser::Plain(FixedParser::new(), endian),
            None => LengthParser::Compressed(VarintParser::new()),
        })
    }
}

impl Parse for LengthParser {
    type Output = usize;

    fn remaining(&self) -> usize {
        match self {
            LengthParser::Plain(parser, _) => parser.remaining(),
            LengthParser::Compressed(parser) => parser.remaining(),
        }
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        match self {
            LengthParser::Plain(parser, _) => parser.step(segment),
            LengthParser::Compressed(parser) => parser.step(segment),
        }
    }

    fn finish(self) -> Result<usize> {
        match self {
            LengthParser::Plain(parser, endian) => {
                checked_plain_length(endian.normalize(parser.finish()?))
            }
            LengthParser::Compressed(parser) => {
                let value = parser.finish()?;
                usize::try_from(value).map_err(|_| CodecError::InvalidLength(i64::from(value)))
            }
        }
    }
}

/// Reads a fixed number of characters through a decode context
#[derive(Debug)]
pub struct TextParser<'c> {
    ctx: &'c mut DecodeContext,
    out: String,
    remaining: usize,
}

impl<'c> TextParser<'c> {
    /// `capacity` is the number of bytes to reserve up front
    pub fn new(ctx: &'c mut DecodeContext, chars: usize, capacity: usize) -> Self {
        ctx.reset();
        Self {
            ctx,
            out: String::with_capacity(capacity),
            remaining: chars,
        }
    }
}

impl Parse for TextParser<'_> {
    type Output = String;

    fn remaining(&self) -> usize {
        self.remaining
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        let (consumed, produced) = self.ctx.decode(segment, &mut self.out, self.remaining);
        self.remaining -= produced;
        Ok(consumed)
    }

    fn end_of_input(&mut self) -> Result<()> {
        // A decoded character may still be held back by the context.
        let (_, produced) = self.ctx.decode(&[], &mut self.out, self.remaining);
        self.remaining -= produced;
        if self.remaining > 0 {
            Err(CodecError::EndOfInput)
        } else {
            Ok(())
        }
    }

    fn finish(self) -> Result<String> {
        if self.remaining > 0 {
            return Err(CodecError::EndOfInput);
        }
        Ok(self.out)
    }
}

/// How much input a hash parser takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Exactly this many bytes
    Bounded(u64),
    /// Everything until the source is exhausted
    Unbounded,
}

/// Feeds every consumed byte into a streaming digest
///
/// Returns the number of bytes hashed; the caller finalizes the digest.
#[derive(Debug)]
pub struct HashParser<'d, D> {
    digest: &'d mut D,
    mode: HashMode,
    hashed: u64,
}

impl<'d, D: StreamingDigest> HashParser<'d, D> {
    pub fn bounded(digest: &'d mut D, len: u64) -> Self {
        Self {
            digest,
            mode: HashMode::Bounded(len),
            hashed: 0,
        }
    }

    pub fn unbounded(digest: &'d mut D) -> Self {
        Self {
            digest,
            mode: HashMode::Unbounded,
            hashed: 0,
        }
    }

    fn bounded_remaining(&self, len: u64) -> u64 {
        len - self.hashed
    }
}

impl<D: StreamingDigest> Parse for HashParser<'_, D> {
    type Output = u64;

    fn remaining(&self) -> usize {
        match self.mode {
            HashMode::Bounded(len) => {
                usize::try_from(self.bounded_remaining(len)).unwrap_or(usize::MAX)
            }
            HashMode::Unbounded => HASH_CHUNK_SIZE,
        }
    }

    fn is_complete(&self) -> bool {
        match self.mode {
            HashMode::Bounded(len) => self.bounded_remaining(len) == 0,
            HashMode::Unbounded => false,
        }
    }

    fn step(&mut self, segment: &[u8]) -> Result<usize> {
        let n = match self.mode {
            HashMode::Bounded(len) => {
                let left = self.bounded_remaining(len);
                usize::try_from(left).map_or(segment.len(), |left| left.min(segment.len()))
            }
            HashMode::Unbounded => segment.len(),
        };
        self.digest.update(&segment[..n]);
        self.hashed += n as u64;
        Ok(n)
    }

    fn end_of_input(&mut self) -> Result<()> {
        match self.mode {
            HashMode::Bounded(_) => Err(CodecError::EndOfInput),
            HashMode::Unbounded => Ok(()),
        }
    }

    fn finish(self) -> Result<u64> {
        if let HashMode::Bounded(len) = self.mode {
            if self.hashed < len {
                return Err(CodecError::EndOfInput);
            }
        }
        Ok(self.hashed)
    }
}
