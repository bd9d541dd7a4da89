//! # Text Frame Codec
//!
//! A `tokio_util` codec for length-prefixed text frames, for use with
//! `Framed`, `FramedRead` and `FramedWrite`.
//!
//! The decoder keeps its in-progress length parser and decode context between
//! calls, so each call consumes everything usable from the buffer instead of
//! waiting for a whole frame to arrive.
//!
//! ## Wire Format
//! ```text
//! [character count as LengthPrefix][encoded characters]
//! ```

use crate::config::{MAX_TEXT_CHARS, MAX_TEXT_PRESIZE};
use crate::core::parser::Parse;
use crate::core::parsers::LengthParser;
use crate::core::text::{DecodeContext, EncodeContext, TextEncoding};
use crate::error::{CodecError, Result};
use crate::utils::length::{encode_length, LengthPrefix};
use crate::utils::varint::MAX_VARINT_LEN;
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

#[derive(Debug)]
enum FrameState {
    Length(LengthParser),
    Payload { remaining: usize, text: String },
}

/// Codec for `[length][text]` frames
#[derive(Debug)]
pub struct TextFrameCodec {
    format: LengthPrefix,
    max_chars: usize,
    decoder: DecodeContext,
    encoder: EncodeContext,
    state: FrameState,
    in_frame: bool,
}

impl TextFrameCodec {
    /// # Errors
    /// `InvalidConfiguration` if `format` is `LengthPrefix::None`
    pub fn new(format: LengthPrefix, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            format,
            max_chars: MAX_TEXT_CHARS,
            decoder: DecodeContext::new(encoding),
            encoder: EncodeContext::new(encoding),
            state: FrameState::Length(LengthParser::new(format)?),
            in_frame: false,
        })
    }

    /// Reject frames declaring more than `max_chars` characters
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    fn reset_frame(&mut self) -> Result<()> {
        self.state = FrameState::Length(LengthParser::new(self.format)?);
        self.decoder.reset();
        self.in_frame = false;
        Ok(())
    }
}

impl Decoder for TextFrameCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            match &mut self.state {
                FrameState::Length(parser) => {
                    let consumed = parser.step(&src[..])?;
                    src.advance(consumed);
                    self.in_frame |= consumed > 0;
                    if !parser.is_complete() {
                        return Ok(None);
                    }

                    let parser = std::mem::replace(
                        parser,
                        LengthParser::new(self.format)?,
                    );
                    let chars = parser.finish()?;
                    if chars > self.max_chars {
                        return Err(CodecError::InvalidLength(
                            i64::try_from(chars).unwrap_or(i64::MAX),
                        ));
                    }
                    if chars == 0 {
                        self.reset_frame()?;
                        return Ok(Some(String::new()));
                    }
                    trace!(chars, "Frame header decoded");
                    self.state = FrameState::Payload {
                        remaining: chars,
                        text: String::with_capacity(chars.min(MAX_TEXT_PRESIZE)),
                    };
                }
                FrameState::Payload { remaining, text } => {
                    let (consumed, produced) = self.decoder.decode(&src[..], text, *remaining);
                    src.advance(consumed);
                    *remaining -= produced;
                    if *remaining > 0 {
                        return Ok(None);
                    }

                    let text = std::mem::take(text);
                    self.reset_frame()?;
                    return Ok(Some(text));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.in_frame || !src.is_empty() => Err(CodecError::EndOfInput),
            None => Ok(None),
        }
    }
}

impl Encoder<&str> for TextFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<()> {
        let mut prefix = [0u8; MAX_VARINT_LEN];
        let used = encode_length(item.chars().count(), self.format, &mut prefix)?;
        let encoded_len = self.encoder.encoding().encoded_len(item);

        dst.reserve(used + encoded_len);
        dst.extend_from_slice(&prefix[..used]);

        let start = dst.len();
        dst.resize(start + encoded_len, 0);
        let (_, written) = self.encoder.encode(item, &mut dst[start..]);
        dst.truncate(start + written);
        Ok(())
    }
}

impl Encoder<String> for TextFrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&str>::encode(self, item.as_str(), dst)
    }
}
