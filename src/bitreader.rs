//! Sequential MSB-first bit reader.
//!
//! Reads back the byte stream an [`OutputChannel`](crate::OutputChannel)
//! produces. Words are serialised big-endian, so the stream is read bit by bit
//! from the most significant bit of each byte, independent of word width.

#![allow(clippy::cast_possible_truncation)]

use crate::error::BitReadError;
use crate::word::Word;

/// Sequential bit reader over a byte slice.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    /// Source data.
    data: &'a [u8],
    /// Total number of valid bits.
    num_bits: usize,
    /// Current bit position.
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over every bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_len(data, data.len() * 8)
    }

    /// Create a reader over the first `num_bits` bits of `data`.
    ///
    /// # Panics
    /// Panics if `data` holds fewer than `num_bits` bits.
    pub fn with_len(data: &'a [u8], num_bits: usize) -> Self {
        assert!(num_bits <= data.len() * 8);
        Self {
            data,
            num_bits,
            bit_pos: 0,
        }
    }

    /// Current bit position.
    #[inline]
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Number of unread bits.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.num_bits - self.bit_pos
    }

    /// Check if any bits are left.
    #[inline]
    pub fn has_bits(&self) -> bool {
        self.bit_pos < self.num_bits
    }

    /// Read a single bit (0 or 1).
    #[inline]
    pub fn read_bit(&mut self) -> Result<u8, BitReadError> {
        if self.bit_pos >= self.num_bits {
            return Err(BitReadError::Underflow);
        }

        let byte_index = self.bit_pos >> 3;
        let bit_index = self.bit_pos & 7;
        let bit = (self.data[byte_index] >> (7 - bit_index)) & 1;

        self.bit_pos += 1;
        Ok(bit)
    }

    /// Read `num_bits` bits (1-64), right-justified.
    pub fn read_bits(&mut self, num_bits: usize) -> Result<u64, BitReadError> {
        if num_bits == 0 || num_bits > 64 {
            return Err(BitReadError::InvalidLength(num_bits));
        }
        if self.remaining() < num_bits {
            return Err(BitReadError::Underflow);
        }

        let mut value = 0u64;
        let mut bits_remaining = num_bits;

        while bits_remaining > 0 {
            let byte_index = self.bit_pos >> 3;
            let bit_offset = self.bit_pos & 7;
            let bits_in_byte = 8 - bit_offset;
            let bits_to_read = bits_remaining.min(bits_in_byte);

            let shift = bits_in_byte - bits_to_read;
            let mask = ((1u16 << bits_to_read) - 1) as u8;
            let bits = (self.data[byte_index] >> shift) & mask;

            // `bits_to_read` is at most 8, so the shift stays below 64.
            value = (value << bits_to_read) | u64::from(bits);
            self.bit_pos += bits_to_read;
            bits_remaining -= bits_to_read;
        }

        Ok(value)
    }

    /// Read `num_bits` bits (1 to `W::BITS`) as a left-aligned word, the form
    /// [`BitBuffer::write_const`](crate::BitBuffer::write_const) accepts.
    pub fn read_word<W: Word>(&mut self, num_bits: usize) -> Result<W, BitReadError> {
        if num_bits > W::BITS {
            return Err(BitReadError::InvalidLength(num_bits));
        }
        let value = self.read_bits(num_bits)?;
        Ok(W::left_align(value, num_bits))
    }

    /// Skip `count` bits.
    pub fn skip(&mut self, count: usize) -> Result<(), BitReadError> {
        if self.remaining() < count {
            return Err(BitReadError::Underflow);
        }
        self.bit_pos += count;
        Ok(())
    }

    /// Skip to the next multiple of `W::BITS`, e.g. past output padding.
    pub fn align_word<W: Word>(&mut self) {
        let offset = self.bit_pos % W::BITS;
        if offset != 0 {
            self.bit_pos = (self.bit_pos + W::BITS - offset).min(self.num_bits);
        }
    }
}
