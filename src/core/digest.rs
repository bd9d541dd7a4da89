//! Streaming digests fed by the hash parser.
//!
//! Implemented for the SHA-2 family from [`sha2`] and for CRC-32 from
//! [`crc32fast`]. CRC-32 output is written big endian.

use crate::error::{constants, CodecError, Result};
use sha2::Digest;

/// A hash or checksum that can be updated incrementally
pub trait StreamingDigest {
    /// Size of the finalized output in bytes
    fn output_len(&self) -> usize;

    fn update(&mut self, bytes: &[u8]);

    /// Write the finalized digest into `out`, which must be exactly
    /// [`output_len`](Self::output_len) bytes
    fn finalize_into(self, out: &mut [u8]) -> Result<()>;
}

/// Fails unless `out` can hold exactly `expected` bytes
pub(crate) fn check_output_len(out: &[u8], expected: usize) -> Result<()> {
    if out.len() == expected {
        Ok(())
    } else {
        Err(CodecError::InvalidConfiguration(format!(
            "{}: expected {expected} bytes, got {}",
            constants::ERR_DIGEST_OUTPUT_SIZE,
            out.len()
        )))
    }
}

macro_rules! impl_sha2_digest {
    ($($t:ty),* $(,)?) => {
        $(
            impl StreamingDigest for $t {
                fn output_len(&self) -> usize {
                    <$t as Digest>::output_size()
                }

                fn update(&mut self, bytes: &[u8]) {
                    Digest::update(self, bytes);
                }

                fn finalize_into(self, out: &mut [u8]) -> Result<()> {
                    check_output_len(out, <$t as Digest>::output_size())?;
                    out.copy_from_slice(&Digest::finalize(self));
                    Ok(())
                }
            }
        )*
    };
}

impl_sha2_digest!(sha2::Sha224, sha2::Sha256, sha2::Sha384, sha2::Sha512);

impl StreamingDigest for crc32fast::Hasher {
    fn output_len(&self) -> usize {
        4
    }

    fn update(&mut self, bytes: &[u8]) {
        crc32fast::Hasher::update(self, bytes);
    }

    fn finalize_into(self, out: &mut [u8]) -> Result<()> {
        check_output_len(out, 4)?;
        out.copy_from_slice(&self.finalize().to_be_bytes());
        Ok(())
    }
}
