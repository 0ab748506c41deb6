//! Fixed-width storage words.
//!
//! Every buffer in this crate stores bits in words of `W` bits, MSB-first:
//! the first bit written to a word lands in its most significant bit.
//! [`Word`] abstracts over the supported widths (`u32` and `u64`).
//!
//! ## Shift Widths
//! Shifting an integer by its full bit width overflows. Callers of
//! [`Word::shr_bits`] and [`Word::shl_bits`] must keep the shift strictly below
//! [`Word::BITS`]; helpers that can be asked for a zero-width or full-width
//! shift ([`Word::high_mask`], [`Word::left_align`]) branch on it explicitly.

#![allow(clippy::cast_possible_truncation)]

use std::fmt;
use std::hash::Hash;

/// Unsigned machine word used as the unit of packed storage.
pub trait Word: Copy + Default + Eq + Hash + fmt::Debug + fmt::LowerHex + Send + Sync + 'static {
    /// Width in bits.
    const BITS: usize;
    /// Width in bytes.
    const BYTES: usize;
    /// All bits clear.
    const ZERO: Self;
    /// All bits set.
    const ONES: Self;

    /// Logical right shift. `n` must be below `BITS`.
    fn shr_bits(self, n: usize) -> Self;

    /// Left shift. `n` must be below `BITS`.
    fn shl_bits(self, n: usize) -> Self;

    /// Bitwise or.
    fn or(self, rhs: Self) -> Self;

    /// Bitwise and.
    fn and(self, rhs: Self) -> Self;

    /// Truncate a `u64` to this width, keeping the low bits.
    fn from_u64(value: u64) -> Self;

    /// Append the big-endian encoding of the word.
    fn extend_be_bytes(self, out: &mut Vec<u8>);

    /// Mask with the top `bits` bits set.
    ///
    /// `bits == 0` yields [`Word::ZERO`] and `bits >= BITS` yields [`Word::ONES`].
    #[inline]
    fn high_mask(bits: usize) -> Self {
        if bits == 0 {
            Self::ZERO
        } else if bits >= Self::BITS {
            Self::ONES
        } else {
            Self::ONES.shl_bits(Self::BITS - bits)
        }
    }

    /// Move the low `bits` bits of `value` to the top of a word.
    ///
    /// This is the form [`BitBuffer::write_const`](crate::BitBuffer::write_const)
    /// expects: meaningful bits MSB-first, everything below them zero.
    #[inline]
    fn left_align(value: u64, bits: usize) -> Self {
        debug_assert!(bits <= Self::BITS);
        if bits == 0 {
            Self::ZERO
        } else {
            Self::from_u64(value).shl_bits(Self::BITS - bits)
        }
    }
}

macro_rules! impl_word {
    ($t:ty) => {
        impl Word for $t {
            const BITS: usize = <$t>::BITS as usize;
            const BYTES: usize = std::mem::size_of::<$t>();
            const ZERO: Self = 0;
            const ONES: Self = <$t>::MAX;

            #[inline]
            fn shr_bits(self, n: usize) -> Self {
                debug_assert!(n < <Self as Word>::BITS);
                self >> n
            }

            #[inline]
            fn shl_bits(self, n: usize) -> Self {
                debug_assert!(n < <Self as Word>::BITS);
                self << n
            }

            #[inline]
            fn or(self, rhs: Self) -> Self {
                self | rhs
            }

            #[inline]
            fn and(self, rhs: Self) -> Self {
                self & rhs
            }

            #[inline]
            fn from_u64(value: u64) -> Self {
                value as $t
            }

            #[inline]
            fn extend_be_bytes(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        }
    };
}

impl_word!(u32);
impl_word!(u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(<u32 as Word>::BITS, 32);
        assert_eq!(<u32 as Word>::BYTES, 4);
        assert_eq!(<u64 as Word>::BITS, 64);
        assert_eq!(<u64 as Word>::BYTES, 8);
    }

    #[test]
    fn test_high_mask_edges() {
        assert_eq!(u32::high_mask(0), 0);
        assert_eq!(u32::high_mask(1), 0x8000_0000);
        assert_eq!(u32::high_mask(31), 0xFFFF_FFFE);
        assert_eq!(u32::high_mask(32), u32::MAX);
        assert_eq!(u64::high_mask(64), u64::MAX);
        assert_eq!(u64::high_mask(4), 0xF000_0000_0000_0000);
    }

    #[test]
    fn test_left_align() {
        assert_eq!(u32::left_align(0b101, 3), 0xA000_0000);
        assert_eq!(u32::left_align(0xDEAD_BEEF, 32), 0xDEAD_BEEF);
        // Bits above `bits` are shifted out
        assert_eq!(u32::left_align(0x1FF, 8), 0xFF00_0000);
        assert_eq!(u64::left_align(1, 1), 1 << 63);
        assert_eq!(u64::left_align(u64::MAX, 0), 0);
    }

    #[test]
    fn test_shifts_up_to_width_minus_one() {
        assert_eq!(u32::MAX.shr_bits(31), 1);
        assert_eq!(1u32.shl_bits(31), 0x8000_0000);
        assert_eq!(u64::MAX.shr_bits(63), 1);
        assert_eq!(1u64.shl_bits(63), 1 << 63);
        assert_eq!(0xF0u32.shr_bits(0), 0xF0);
    }

    #[test]
    fn test_extend_be_bytes() {
        let mut out = Vec::new();
        0xDEAD_BEEFu32.extend_be_bytes(&mut out);
        0x0102_0304_0506_0708u64.extend_be_bytes(&mut out);
        assert_eq!(
            out,
            vec![0xDE, 0xAD, 0xBE, 0xEF, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }
}
