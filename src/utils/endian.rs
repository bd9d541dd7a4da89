//! # Byte Order
//!
//! Fixed-layout primitives and byte-order normalization.
//!
//! Values are always moved to and from the wire in native byte order and then
//! normalized with [`Endian::normalize`]. The swap is its own inverse, so the
//! same call serves the read path and the write path. Native order is only
//! consulted to decide whether the swap is a no-op.

use serde::{Deserialize, Serialize};

/// Byte order of a multi-byte value on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endian {
    /// Whatever order the executing platform uses
    #[default]
    Native,
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl Endian {
    /// Returns true if values in this order need no swap on this platform
    pub fn is_native(self) -> bool {
        match self {
            Endian::Native => true,
            Endian::Little => cfg!(target_endian = "little"),
            Endian::Big => cfg!(target_endian = "big"),
        }
    }

    /// Convert between native order and this wire order
    #[inline]
    pub fn normalize<T: Primitive>(self, value: T) -> T {
        if self.is_native() {
            value
        } else {
            value.swap_bytes()
        }
    }
}

/// A fixed-layout value that can be copied to and from raw bytes
pub trait Primitive: Copy + Send + Sync + 'static {
    /// Size on the wire in bytes
    const SIZE: usize;

    /// Byte array holding one value
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default + Copy + Send + Sync;

    fn from_ne_bytes(bytes: Self::Bytes) -> Self;

    fn to_ne_bytes(self) -> Self::Bytes;

    fn swap_bytes(self) -> Self;
}

macro_rules! impl_primitive_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Primitive for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                type Bytes = [u8; std::mem::size_of::<$t>()];

                #[inline]
                fn from_ne_bytes(bytes: Self::Bytes) -> Self {
                    <$t>::from_ne_bytes(bytes)
                }

                #[inline]
                fn to_ne_bytes(self) -> Self::Bytes {
                    <$t>::to_ne_bytes(self)
                }

                #[inline]
                fn swap_bytes(self) -> Self {
                    <$t>::swap_bytes(self)
                }
            }
        )*
    };
}

macro_rules! impl_primitive_float {
    ($($t:ty),* $(,)?) => {
        $(
            impl Primitive for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                type Bytes = [u8; std::mem::size_of::<$t>()];

                #[inline]
                fn from_ne_bytes(bytes: Self::Bytes) -> Self {
                    <$t>::from_ne_bytes(bytes)
                }

                #[inline]
                fn to_ne_bytes(self) -> Self::Bytes {
                    <$t>::to_ne_bytes(self)
                }

                #[inline]
                fn swap_bytes(self) -> Self {
                    <$t>::from_bits(self.to_bits().swap_bytes())
                }
            }
        )*
    };
}

impl_primitive_int!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128);
impl_primitive_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_never_swaps() {
        let value = 0x0102_0304_u32;
        assert_eq!(Endian::Native.normalize(value), value);
    }

    #[test]
    fn test_exactly_one_explicit_order_is_native() {
        assert_ne!(Endian::Little.is_native(), Endian::Big.is_native());
    }

    #[test]
    fn test_normalize_matches_std_conversions() {
        let value = 0x0102_0304_0506_0708_u64;
        let le = Endian::Little.normalize(value).to_ne_bytes();
        let be = Endian::Big.normalize(value).to_ne_bytes();
        assert_eq!(le, value.to_le_bytes());
        assert_eq!(be, value.to_be_bytes());
    }

    #[test]
    fn test_normalize_is_involution() {
        let value = -12345.678_f64;
        let swapped = Endian::Big.normalize(Endian::Big.normalize(value));
        assert_eq!(swapped.to_bits(), value.to_bits());
    }

    #[test]
    fn test_single_byte_is_unaffected() {
        assert_eq!(Endian::Big.normalize(0xAB_u8), 0xAB);
        assert_eq!(<i8 as Primitive>::SIZE, 1);
    }
}
