//! # Text Conversion
//!
//! Incremental text decoding and encoding for length-prefixed strings.
//!
//! Characters are Unicode scalar values. A [`DecodeContext`] carries partial
//! multi-byte sequences between calls, so a character may straddle any number
//! of segment boundaries. Decoding stops at the requested character count and
//! never consumes bytes belonging to whatever follows the text on the wire.
//! The one exception is a UTF-16LE text ending in an unpaired high surrogate
//! where the segment ends right after the low byte of the following unit; that
//! byte cannot be judged without taking it.
//!
//! ## Encodings
//! - **UTF-8**: 1-4 bytes per character
//! - **UTF-16LE / UTF-16BE**: 2 or 4 bytes per character
//! - **Latin-1**: 1 byte per character, unmappable characters become `?`
//!
//! Malformed input decodes to U+FFFD rather than failing.

use serde::{Deserialize, Serialize};

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;
const LATIN1_FALLBACK: u8 = b'?';

/// Supported text encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
            TextEncoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Largest number of bytes a single character can occupy
    pub fn max_char_len(self) -> usize {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf16Le | TextEncoding::Utf16Be => 4,
            TextEncoding::Latin1 => 1,
        }
    }

    /// Exact number of bytes `text` occupies in this encoding
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            TextEncoding::Utf8 => text.len(),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => text.encode_utf16().count() * 2,
            TextEncoding::Latin1 => text.chars().count(),
        }
    }
}

/// Width of a UTF-8 sequence from its lead byte, 0 if the byte cannot lead
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Incremental decoder state for one logical text stream
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    encoding: TextEncoding,
    pending: [u8; 4],
    pending_len: usize,
    expected: usize,
    high_surrogate: Option<u16>,
    deferred: Option<char>,
}

impl DecodeContext {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether a partial character is carried over from earlier input
    pub fn has_pending(&self) -> bool {
        self.pending_len > 0 || self.high_surrogate.is_some() || self.deferred.is_some()
    }

    /// Drop any partial character state
    pub fn reset(&mut self) {
        *self = Self::new(self.encoding);
    }

    /// Decode up to `max_chars` characters from `input` into `out`
    ///
    /// Returns `(bytes_consumed, chars_produced)`. Bytes of an incomplete
    /// trailing sequence are consumed and held until the next call.
    pub fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> (usize, usize) {
        match self.encoding {
            TextEncoding::Utf8 => self.decode_utf8(input, out, max_chars),
            TextEncoding::Utf16Le => self.decode_utf16(input, out, max_chars, true),
            TextEncoding::Utf16Be => self.decode_utf16(input, out, max_chars, false),
            TextEncoding::Latin1 => {
                let count = input.len().min(max_chars);
                out.extend(input[..count].iter().map(|&b| char::from(b)));
                (count, count)
            }
        }
    }

    fn decode_utf8(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> (usize, usize) {
        let mut consumed = 0;
        let mut produced = 0;

        while consumed < input.len() && produced < max_chars {
            let byte = input[consumed];

            if self.pending_len == 0 {
                if byte.is_ascii() {
                    // ASCII run
                    let run = input[consumed..]
                        .iter()
                        .take(max_chars - produced)
                        .take_while(|b| b.is_ascii())
                        .count();
                    out.extend(input[consumed..consumed + run].iter().map(|&b| char::from(b)));
                    consumed += run;
                    produced += run;
                    continue;
                }
                match utf8_width(byte) {
                    0 => {
                        out.push(REPLACEMENT);
                        produced += 1;
                    }
                    width => {
                        self.pending[0] = byte;
                        self.pending_len = 1;
                        self.expected = width;
                    }
                }
                consumed += 1;
                continue;
            }

            if byte & 0xC0 != 0x80 {
                // Truncated sequence; the current byte is reprocessed as a lead.
                out.push(REPLACEMENT);
                produced += 1;
                self.pending_len = 0;
                continue;
            }

            self.pending[self.pending_len] = byte;
            self.pending_len += 1;
            consumed += 1;

            if self.pending_len == self.expected {
                let ch = std::str::from_utf8(&self.pending[..self.pending_len])
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or(REPLACEMENT);
                out.push(ch);
                produced += 1;
                self.pending_len = 0;
            }
        }

        (consumed, produced)
    }

    fn decode_utf16(
        &mut self,
        input: &[u8],
        out: &mut String,
        max_chars: usize,
        little_endian: bool,
    ) -> (usize, usize) {
        let mut consumed = 0;
        let mut produced = 0;

        while produced < max_chars {
            if let Some(ch) = self.deferred.take() {
                out.push(ch);
                produced += 1;
                continue;
            }
            if consumed == input.len() {
                break;
            }

            // A replacement for an unpaired high surrogate may be the last
            // character; a unit that cannot pair with it stays in the input.
            if self.high_surrogate.is_some()
                && self.pending_len == 0
                && produced + 1 == max_chars
                && Self::next_is_low(&input[consumed..], little_endian) == Some(false)
            {
                self.high_surrogate = None;
                out.push(REPLACEMENT);
                produced += 1;
                break;
            }

            let byte = input[consumed];
            consumed += 1;
            if self.pending_len == 0 {
                self.pending[0] = byte;
                self.pending_len = 1;
                continue;
            }
            self.pending_len = 0;

            let pair = [self.pending[0], byte];
            let unit = if little_endian {
                u16::from_le_bytes(pair)
            } else {
                u16::from_be_bytes(pair)
            };

            if let Some(ch) = self.push_utf16_unit(unit) {
                out.push(ch);
                produced += 1;
            }
        }

        (consumed, produced)
    }

    fn push_utf16_unit(&mut self, unit: u16) -> Option<char> {
        let is_high = (0xD800..=0xDBFF).contains(&unit);
        let is_low = (0xDC00..=0xDFFF).contains(&unit);

        match self.high_surrogate.take() {
            Some(high) if is_low => {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                Some(char::from_u32(code).unwrap_or(REPLACEMENT))
            }
            Some(_) => {
                // Unpaired high surrogate; the current unit still counts.
                if is_high {
                    self.high_surrogate = Some(unit);
                } else {
                    self.deferred = Some(Self::bmp_char(unit, is_low));
                }
                Some(REPLACEMENT)
            }
            None if is_high => {
                self.high_surrogate = Some(unit);
                None
            }
            None => Some(Self::bmp_char(unit, is_low)),
        }
    }

    /// Whether the next UTF-16 unit in `rest` is a low surrogate
    ///
    /// `None` when the byte that decides it is not available yet.
    fn next_is_low(rest: &[u8], little_endian: bool) -> Option<bool> {
        let high_byte = match (rest, little_endian) {
            ([_, high, ..], true) => *high,
            ([lead, ..], false) => *lead,
            _ => return None,
        };
        Some((0xDC..=0xDF).contains(&high_byte))
    }

    fn bmp_char(unit: u16, is_low: bool) -> char {
        if is_low {
            REPLACEMENT
        } else {
            char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT)
        }
    }
}

/// Encoder for one logical text stream
///
/// Input arrives as `&str`, which never splits a character, so no partial
/// state needs to survive between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeContext {
    encoding: TextEncoding,
}

impl EncodeContext {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Encode as many whole characters of `text` as fit into `out`
    ///
    /// Returns `(bytes_of_text_consumed, bytes_written)`.
    pub fn encode(&mut self, text: &str, out: &mut [u8]) -> (usize, usize) {
        match self.encoding {
            TextEncoding::Utf8 => {
                let mut len = text.len().min(out.len());
                while !text.is_char_boundary(len) {
                    len -= 1;
                }
                out[..len].copy_from_slice(&text.as_bytes()[..len]);
                (len, len)
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                let little_endian = self.encoding == TextEncoding::Utf16Le;
                let mut consumed = 0;
                let mut written = 0;
                let mut units = [0u16; 2];
                for ch in text.chars() {
                    let encoded = ch.encode_utf16(&mut units);
                    let needed = encoded.len() * 2;
                    if written + needed > out.len() {
                        break;
                    }
                    for unit in encoded.iter() {
                        let bytes = if little_endian {
                            unit.to_le_bytes()
                        } else {
                            unit.to_be_bytes()
                        };
                        out[written..written + 2].copy_from_slice(&bytes);
                        written += 2;
                    }
                    consumed += ch.len_utf8();
                }
                (consumed, written)
            }
            TextEncoding::Latin1 => {
                let mut consumed = 0;
                let mut written = 0;
                for ch in text.chars() {
                    if written == out.len() {
                        break;
                    }
                    out[written] = u8::try_from(u32::from(ch)).unwrap_or(LATIN1_FALLBACK);
                    written += 1;
                    consumed += ch.len_utf8();
                }
                (consumed, written)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_split(encoding: TextEncoding, bytes: &[u8], chars: usize, split: usize) -> String {
        let mut ctx = DecodeContext::new(encoding);
        let mut out = String::new();
        let (first, produced) = ctx.decode(&bytes[..split], &mut out, chars);
        assert_eq!(first, split);
        let (_, rest) = ctx.decode(&bytes[split..], &mut out, chars - produced);
        assert_eq!(produced + rest, chars);
        out
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let text = "héllo €";
        let bytes = text.as_bytes();
        for split in 0..bytes.len() {
            assert_eq!(decode_split(TextEncoding::Utf8, bytes, 7, split), text);
        }
    }

    #[test]
    fn test_utf8_stops_at_character_target() {
        let mut ctx = DecodeContext::new(TextEncoding::Utf8);
        let mut out = String::new();
        let (consumed, produced) = ctx.decode("añb".as_bytes(), &mut out, 2);
        assert_eq!((consumed, produced), (3, 2));
        assert_eq!(out, "añ");
        assert!(!ctx.has_pending());
    }

    #[test]
    fn test_utf8_invalid_bytes_become_replacement() {
        let mut ctx = DecodeContext::new(TextEncoding::Utf8);
        let mut out = String::new();
        let (consumed, produced) = ctx.decode(&[0xFF, b'a', 0xC3, b'b'], &mut out, 4);
        assert_eq!((consumed, produced), (4, 4));
        assert_eq!(out, "\u{FFFD}a\u{FFFD}b");
    }

    #[test]
    fn test_utf16_surrogate_pair_split() {
        let text = "a😀b";
        let mut bytes = Vec::new();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        for split in 0..bytes.len() {
            assert_eq!(decode_split(TextEncoding::Utf16Le, &bytes, 3, split), text);
        }
    }

    #[test]
    fn test_utf16_unpaired_high_surrogate() {
        let mut bytes = Vec::new();
        for unit in [0xD800u16, 0x0041] {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let mut ctx = DecodeContext::new(TextEncoding::Utf16Be);
        let mut out = String::new();
        let (consumed, produced) = ctx.decode(&bytes, &mut out, 2);
        assert_eq!((consumed, produced), (4, 2));
        assert_eq!(out, "\u{FFFD}A");
        assert!(!ctx.has_pending());
    }

    #[test]
    fn test_utf16_unpaired_high_surrogate_ends_text() {
        for little_endian in [true, false] {
            let (encoding, bytes) = if little_endian {
                (TextEncoding::Utf16Le, [0x00, 0xD8, 0x41, 0x00])
            } else {
                (TextEncoding::Utf16Be, [0xD8, 0x00, 0x00, 0x41])
            };
            let mut ctx = DecodeContext::new(encoding);
            let mut out = String::new();
            let (consumed, produced) = ctx.decode(&bytes, &mut out, 1);
            assert_eq!((consumed, produced), (2, 1));
            assert_eq!(out, "\u{FFFD}");
            assert!(!ctx.has_pending());
        }
    }

    #[test]
    fn test_utf16_be_lead_byte_decides_without_consuming() {
        let mut ctx = DecodeContext::new(TextEncoding::Utf16Be);
        let mut out = String::new();
        let (consumed, produced) = ctx.decode(&[0xD8, 0x00], &mut out, 1);
        assert_eq!((consumed, produced), (2, 0));
        // Only the lead byte of the following unit has arrived
        let (consumed, produced) = ctx.decode(&[0x00], &mut out, 1);
        assert_eq!((consumed, produced), (0, 1));
        assert_eq!(out, "\u{FFFD}");
    }

    #[test]
    fn test_encode_never_splits_characters() {
        let mut ctx = EncodeContext::new(TextEncoding::Utf8);
        let mut out = [0u8; 3];
        let (consumed, written) = ctx.encode("a€", &mut out);
        assert_eq!((consumed, written), (1, 1));
    }

    #[test]
    fn test_encode_utf16_be() {
        let mut ctx = EncodeContext::new(TextEncoding::Utf16Be);
        let mut out = [0u8; 8];
        let (consumed, written) = ctx.encode("hi", &mut out);
        assert_eq!((consumed, written), (2, 4));
        assert_eq!(&out[..4], &[0, b'h', 0, b'i']);
    }

    #[test]
    fn test_latin1_fallback() {
        let mut ctx = EncodeContext::new(TextEncoding::Latin1);
        let mut out = [0u8; 4];
        let (consumed, written) = ctx.encode("é€", &mut out);
        assert_eq!(written, 2);
        assert_eq!(consumed, "é€".len());
        assert_eq!(&out[..2], &[0xE9, b'?']);
    }

    #[test]
    fn test_encoded_len_matches_encoder() {
        let text = "mixed ascii, ünïcode and 😀";
        for encoding in [
            TextEncoding::Utf8,
            TextEncoding::Utf16Le,
            TextEncoding::Utf16Be,
            TextEncoding::Latin1,
        ] {
            let mut ctx = EncodeContext::new(encoding);
            let mut out = vec![0u8; 256];
            let (consumed, written) = ctx.encode(text, &mut out);
            assert_eq!(consumed, text.len());
            assert_eq!(written, encoding.encoded_len(text), "{}", encoding.name());
        }
    }
}
