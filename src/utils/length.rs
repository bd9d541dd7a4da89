//! # Length Prefixes
//!
//! The closed set of ways a payload's size can be framed on the wire.
//!
//! ## Wire Format
//! ```text
//! None               [payload]
//! Plain              [i32 native order][payload]
//! PlainLittleEndian  [i32 little endian][payload]
//! PlainBigEndian     [i32 big endian][payload]
//! Compressed         [varint, 1-5 bytes][payload]
//! ```

use crate::error::{constants, CodecError, Result};
use crate::utils::endian::Endian;
use crate::utils::varint::{self, MAX_VARINT_LEN};
use serde::{Deserialize, Serialize};

/// Size of a plain (fixed-width) length prefix
pub const PLAIN_PREFIX_LEN: usize = 4;

/// Supported length-prefix formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPrefix {
    /// No prefix; the length is agreed out of band
    None,
    /// 4-byte signed integer in native order
    Plain,
    /// 4-byte signed integer, little endian
    PlainLittleEndian,
    /// 4-byte signed integer, big endian
    PlainBigEndian,
    /// 7-bit variable-length integer
    #[default]
    Compressed,
}

impl LengthPrefix {
    /// Get the format identifier byte
    pub fn format_byte(self) -> u8 {
        match self {
            LengthPrefix::None => 0x00,
            LengthPrefix::Plain => 0x01,
            LengthPrefix::PlainLittleEndian => 0x02,
            LengthPrefix::PlainBigEndian => 0x03,
            LengthPrefix::Compressed => 0x04,
        }
    }

    /// Byte order of a plain prefix, `None` for the other formats
    pub fn endian(self) -> Option<Endian> {
        match self {
            LengthPrefix::Plain => Some(Endian::Native),
            LengthPrefix::PlainLittleEndian => Some(Endian::Little),
            LengthPrefix::PlainBigEndian => Some(Endian::Big),
            LengthPrefix::None | LengthPrefix::Compressed => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            LengthPrefix::None => "none",
            LengthPrefix::Plain => "plain",
            LengthPrefix::PlainLittleEndian => "plain-le",
            LengthPrefix::PlainBigEndian => "plain-be",
            LengthPrefix::Compressed => "compressed",
        }
    }

    /// Fails unless this format can carry a length
    pub fn require_prefix(self) -> Result<Self> {
        match self {
            LengthPrefix::None => Err(CodecError::InvalidConfiguration(
                constants::ERR_NO_LENGTH_PREFIX.to_string(),
            )),
            other => Ok(other),
        }
    }
}

impl TryFrom<u8> for LengthPrefix {
    type Error = CodecError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(LengthPrefix::None),
            0x01 => Ok(LengthPrefix::Plain),
            0x02 => Ok(LengthPrefix::PlainLittleEndian),
            0x03 => Ok(LengthPrefix::PlainBigEndian),
            0x04 => Ok(LengthPrefix::Compressed),
            other => Err(CodecError::InvalidConfiguration(format!(
                "{}: {other:#04x}",
                constants::ERR_UNKNOWN_LENGTH_PREFIX
            ))),
        }
    }
}

/// Validate a decoded plain prefix
pub fn checked_plain_length(raw: i32) -> Result<usize> {
    usize::try_from(raw).map_err(|_| CodecError::InvalidLength(i64::from(raw)))
}

/// Encode `len` as a prefix in `format` into `out`, returning the bytes used
pub fn encode_length(
    len: usize,
    format: LengthPrefix,
    out: &mut [u8; MAX_VARINT_LEN],
) -> Result<usize> {
    let format = format.require_prefix()?;
    let too_long = || CodecError::InvalidLength(i64::try_from(len).unwrap_or(i64::MAX));

    match format.endian() {
        Some(endian) => {
            let value = i32::try_from(len).map_err(|_| too_long())?;
            let bytes = endian.normalize(value).to_ne_bytes();
            out[..PLAIN_PREFIX_LEN].copy_from_slice(&bytes);
            Ok(PLAIN_PREFIX_LEN)
        }
        None => {
            let value = u32::try_from(len).map_err(|_| too_long())?;
            Ok(varint::encode(value, out))
        }
    }
}
