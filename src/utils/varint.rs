//! Variable-length integer helpers.
//!
//! Wire format: 7 value bits per byte, lowest group first, bit 7 set when
//! more bytes follow. A 32-bit value needs at most [`MAX_VARINT_LEN`] bytes.

/// Maximum encoded size of a 32-bit value
pub const MAX_VARINT_LEN: usize = 5;

/// Continuation flag
pub const CONTINUATION_BIT: u8 = 0x80;

/// Value bits carried by each byte
pub const VALUE_MASK: u8 = 0x7F;

/// Highest value the final (5th) byte may carry without overflowing 32 bits
pub const LAST_BYTE_MAX: u8 = 0x0F;

/// Number of bytes needed to encode `value`
pub fn encoded_len(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Encode `value` into `out`, returning the number of bytes used
pub fn encode(mut value: u32, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;
    while value >= u32::from(CONTINUATION_BIT) {
        out[len] = (value as u8 & VALUE_MASK) | CONTINUATION_BIT;
        value >>= 7;
        len += 1;
    }
    out[len] = value as u8;
    len + 1
}
