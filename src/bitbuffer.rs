//! Growable packed-bit buffer.
//!
//! Bits are stored MSB-first in a contiguous array of [`Word`]s and written at
//! a bit cursor (`bitpos`). Writes OR bits into place, so two invariants hold
//! at all times:
//!
//! - **Zero tail**: every storage bit at or beyond `bitpos` is zero.
//! - **Margin**: the cursor never enters the last storage word before the
//!   owner grows or flushes, so a write spilling into the following word
//!   stays in bounds.
//!
//! A buffer is either *streaming* (drained through [`BitBuffer::flush_with`],
//! see [`OutputChannel`](crate::OutputChannel)) or *accumulating* (grown on
//! demand through [`BitBuffer::append`] / [`BitBuffer::append_array`] and
//! later spliced into another buffer).

use tracing::{debug, trace};

use crate::word::Word;

/// Default initial capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4096 * 8;

/// Growable packed-bit buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitBuffer<W: Word = u64> {
    /// Word storage, zero beyond `bitpos`.
    data: Vec<W>,
    /// Write cursor in bits.
    bitpos: usize,
}

impl<W: Word> Default for BitBuffer<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Word> BitBuffer<W> {
    /// Create an empty buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer holding at least `bytes` bytes.
    ///
    /// The capacity is rounded up to whole words, and to no fewer than two.
    pub fn with_capacity(bytes: usize) -> Self {
        let words = bytes.div_ceil(W::BYTES).max(2);
        Self {
            data: vec![W::ZERO; words],
            bitpos: 0,
        }
    }

    /// Capacity in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len() * W::BYTES
    }

    /// Number of bits written.
    #[inline]
    pub fn bit_pos(&self) -> usize {
        self.bitpos
    }

    /// Check if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitpos == 0
    }

    /// Check if the cursor sits on a word boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bitpos % W::BITS == 0
    }

    /// Check if the cursor has reached the last storage word.
    ///
    /// Streaming owners flush and accumulating owners grow when this is set.
    #[inline]
    pub fn near_end(&self) -> bool {
        self.bitpos >= self.data.len() * W::BITS - W::BITS
    }

    /// The whole backing storage, including the zero tail.
    #[inline]
    pub fn storage(&self) -> &[W] {
        &self.data
    }

    /// Words that are completely written.
    #[inline]
    pub fn complete_words(&self) -> &[W] {
        &self.data[..self.bitpos / W::BITS]
    }

    /// The trailing partially written word and its bit count, if any.
    pub fn partial_word(&self) -> Option<(W, usize)> {
        let bits = self.bitpos % W::BITS;
        if bits == 0 {
            None
        } else {
            Some((self.data[self.bitpos / W::BITS], bits))
        }
    }

    /// Write the top `bits` bits of `word` at the cursor.
    ///
    /// The low `W - bits` bits of `word` must be zero. Returns `true` when the
    /// cursor has moved into the last storage word.
    ///
    /// # Panics
    /// Panics if the write runs past the storage, i.e. the caller ignored a
    /// previous `true` return.
    #[inline]
    pub fn write_const(&mut self, word: W, bits: usize) -> bool {
        debug_assert!(bits <= W::BITS);
        debug_assert_eq!(word.and(W::high_mask(bits)), word);

        let word_index = self.bitpos / W::BITS;
        let offset = self.bitpos % W::BITS;

        if offset == 0 {
            // Aligned: nothing spills into the next word, and the spill shift
            // would be a full-width shift.
            self.data[word_index] = self.data[word_index].or(word);
        } else {
            self.data[word_index] = self.data[word_index].or(word.shr_bits(offset));
            self.data[word_index + 1] =
                self.data[word_index + 1].or(word.shl_bits(W::BITS - offset));
        }

        self.bitpos += bits;
        self.near_end()
    }

    /// Write the first `bits` bits of `words` at the cursor.
    ///
    /// At a word boundary this is a block copy; otherwise it degrades to one
    /// [`write_const`](Self::write_const) per source word. Bits of the last
    /// source word beyond `bits` are masked off. Returns the near-end signal.
    ///
    /// # Panics
    /// Panics if `words` holds fewer than `bits` bits or the storage is too
    /// small; [`append_array`](Self::append_array) grows first.
    pub fn write_array(&mut self, words: &[W], bits: usize) -> bool {
        let full = bits / W::BITS;
        let rem = bits % W::BITS;

        if self.is_aligned() {
            let start = self.bitpos / W::BITS;
            self.data[start..start + full].copy_from_slice(&words[..full]);
            if rem != 0 {
                self.data[start + full] = words[full].and(W::high_mask(rem));
            }
            self.bitpos += bits;
        } else {
            for &word in &words[..full] {
                self.write_const(word, W::BITS);
            }
            if rem != 0 {
                self.write_const(words[full].and(W::high_mask(rem)), rem);
            }
        }

        self.near_end()
    }

    /// Write like [`write_const`](Self::write_const), doubling the storage
    /// instead of signalling when the cursor nears the end.
    #[inline]
    pub fn append(&mut self, word: W, bits: usize) {
        if self.write_const(word, bits) {
            self.grow(1);
        }
    }

    /// Write like [`write_array`](Self::write_array), growing first if needed.
    pub fn append_array(&mut self, words: &[W], bits: usize) {
        let shift = self.growth_shift(self.bitpos + bits);
        if shift > 0 {
            self.grow(shift);
        }
        self.write_array(words, bits);
    }

    /// Append everything written to `src`.
    pub fn concat(&mut self, src: &BitBuffer<W>) {
        self.append_array(&src.data, src.bitpos);
    }

    /// Clear written bits and rewind the cursor, keeping the storage.
    pub fn reset(&mut self) {
        let used = self.bitpos.div_ceil(W::BITS);
        self.data[..used].fill(W::ZERO);
        self.bitpos = 0;
    }

    /// Multiply the storage by `2^shift`, keeping written bits.
    pub fn grow(&mut self, shift: u32) {
        let new_len = self.data.len() << shift;
        debug!(
            from = self.size(),
            to = new_len * W::BYTES,
            "growing bit buffer"
        );
        self.data.resize(new_len, W::ZERO);
    }

    /// Bit count at which [`append_array`](Self::append_array) grows a buffer
    /// of `size` bytes.
    ///
    /// The margin is `(size - 1) * W * word_bytes`, which scales a byte count
    /// by both the bit and the byte width of a word.
    pub fn append_threshold(size: usize) -> usize {
        size.saturating_sub(1) * W::BITS * W::BYTES
    }

    /// Smallest shift that fits `total_bits` under both the threshold formula
    /// and the storage margin.
    fn growth_shift(&self, total_bits: usize) -> u32 {
        let size = self.size();
        let mut shift = 0;

        if total_bits >= Self::append_threshold(size) {
            shift = 1;
            while total_bits >= Self::append_threshold(size << shift) {
                shift += 1;
            }
        }

        // The written bits plus one spare word must stay inside the storage.
        while total_bits >= ((self.data.len() << shift) - 1) * W::BITS {
            shift += 1;
        }

        shift
    }

    /// Hand complete words to `emit`, then carry the partial word to the front.
    ///
    /// Emitted words are zeroed and the cursor is rebased onto word 0. Without
    /// a complete word this is a no-op; the carry-over would otherwise
    /// overwrite the only partial word. If `emit` fails the buffer is left as
    /// it was. Returns the number of words emitted.
    pub fn flush_with<E, F>(&mut self, emit: F) -> Result<usize, E>
    where
        F: FnOnce(&[W]) -> Result<(), E>,
    {
        let word_index = self.bitpos / W::BITS;
        if word_index == 0 {
            return Ok(0);
        }

        emit(&self.data[..word_index])?;

        self.data[..word_index].fill(W::ZERO);
        if let Some(partial) = self.data.get(word_index).copied() {
            self.data[0] = partial;
            self.data[word_index] = W::ZERO;
        }
        self.bitpos -= word_index * W::BITS;

        trace!(words = word_index, carried = self.bitpos, "flushed bit buffer");
        Ok(word_index)
    }

    /// Written bits as big-endian bytes, the last byte zero-padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let num_bytes = self.bitpos.div_ceil(8);
        let num_words = self.bitpos.div_ceil(W::BITS);

        let mut result = Vec::with_capacity(num_words * W::BYTES);
        for &word in &self.data[..num_words] {
            word.extend_be_bytes(&mut result);
        }
        result.truncate(num_bytes);

        result
    }
}
