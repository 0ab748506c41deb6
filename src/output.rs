//! Output channel: a streaming bit buffer bound to a byte sink.
//!
//! The channel owns a fixed-capacity [`BitBuffer`] (configured size plus one
//! margin word). It never grows. When a write moves the cursor into the margin
//! word the complete words are flushed to the sink and the partial word is
//! carried to the front, so memory stays bounded regardless of output size.
//!
//! ## Alignment Paths
//! Bulk writes ([`OutputChannel::write_buffer`],
//! [`OutputChannel::write_array_direct`]) check the cursor first. On a word
//! boundary the channel is drained and the source's whole words go straight to
//! the sink. Otherwise every word is shifted into place through
//! [`OutputChannel::write_const`]. Both paths emit the same bytes.

use std::io::Write;

use tracing::debug;

use crate::bitbuffer::BitBuffer;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::word::Word;

/// Byte sink plus a reusable staging area for serialising words.
#[derive(Debug)]
struct WordSink<S> {
    inner: S,
    staging: Vec<u8>,
    bytes_written: u64,
}

impl<S: Write> WordSink<S> {
    fn emit<W: Word>(&mut self, words: &[W]) -> Result<(), RuntimeError> {
        self.staging.clear();
        for &word in words {
            word.extend_be_bytes(&mut self.staging);
        }
        self.inner
            .write_all(&self.staging)
            .map_err(RuntimeError::Write)?;
        self.bytes_written += self.staging.len() as u64;
        Ok(())
    }
}

/// Streaming bit output bound to a sink.
#[derive(Debug)]
pub struct OutputChannel<S: Write, W: Word = u64> {
    buf: BitBuffer<W>,
    sink: WordSink<S>,
}

impl<S: Write, W: Word> OutputChannel<S, W> {
    /// Create a channel holding `capacity` bytes before it flushes.
    pub fn new(sink: S, capacity: usize) -> Self {
        let buf = BitBuffer::with_capacity(capacity + W::BYTES);
        Self {
            sink: WordSink {
                inner: sink,
                staging: Vec::with_capacity(buf.size()),
                bytes_written: 0,
            },
            buf,
        }
    }

    /// Create a channel sized by `config`.
    pub fn with_config(sink: S, config: &RuntimeConfig) -> Self {
        Self::new(sink, config.output_buffer_size)
    }

    /// Bits buffered but not yet flushed.
    #[inline]
    pub fn bit_pos(&self) -> usize {
        self.buf.bit_pos()
    }

    /// Check if the cursor sits on a word boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.buf.is_aligned()
    }

    /// Bytes handed to the sink so far.
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written
    }

    /// The channel's buffer.
    pub fn buffer(&self) -> &BitBuffer<W> {
        &self.buf
    }

    /// The sink.
    pub fn get_ref(&self) -> &S {
        &self.sink.inner
    }

    /// Consume the channel, returning the sink. Buffered bits are dropped.
    pub fn into_inner(self) -> S {
        self.sink.inner
    }

    /// Write complete words to the sink and carry the partial word over.
    ///
    /// A no-op until at least one word is complete.
    pub fn flush(&mut self) -> Result<(), RuntimeError> {
        let sink = &mut self.sink;
        self.buf.flush_with(|words| sink.emit(words))?;
        Ok(())
    }

    /// Write the top `bits` bits of `word`; the rest of `word` must be zero.
    #[inline]
    pub fn write_const(&mut self, word: W, bits: usize) -> Result<(), RuntimeError> {
        if self.buf.write_const(word, bits) {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the first `bits` bits of `words`.
    ///
    /// On a word boundary whole words are block-copied into the channel, in
    /// chunks that fit before the margin word, flushing between chunks.
    pub fn write_array(&mut self, words: &[W], bits: usize) -> Result<(), RuntimeError> {
        if !self.buf.is_aligned() {
            return self.write_shifted(words, bits);
        }

        let mut words = words;
        let mut bits = bits;
        while bits > 0 {
            let room = self.buf.storage().len() - 1 - self.buf.bit_pos() / W::BITS;
            let take = bits.min(room * W::BITS);
            if self.buf.write_array(words, take) {
                self.flush()?;
            }
            words = &words[take / W::BITS..];
            bits -= take;
        }

        Ok(())
    }

    /// Write everything written to `src`. `src` is left untouched.
    pub fn write_buffer(&mut self, src: &BitBuffer<W>) -> Result<(), RuntimeError> {
        self.write_array_direct(src.storage(), src.bit_pos())
    }

    /// Write the first `bits` bits of `words`, sending whole words straight to
    /// the sink when the cursor is aligned.
    pub fn write_array_direct(&mut self, words: &[W], bits: usize) -> Result<(), RuntimeError> {
        if !self.buf.is_aligned() {
            return self.write_shifted(words, bits);
        }

        // Only whole words are buffered, so draining leaves the channel empty
        // and direct writes keep the output order.
        self.flush()?;
        let full = bits / W::BITS;
        if full > 0 {
            self.sink.emit(&words[..full])?;
        }

        let rem = bits % W::BITS;
        if rem != 0 {
            self.write_const(words[full].and(W::high_mask(rem)), rem)?;
        }

        Ok(())
    }

    /// Zero-fill up to the next word boundary.
    pub fn pad(&mut self) -> Result<(), RuntimeError> {
        let offset = self.buf.bit_pos() % W::BITS;
        if offset != 0 {
            self.write_const(W::ZERO, W::BITS - offset)?;
        }
        Ok(())
    }

    /// Pad, flush every buffered bit and flush the sink.
    pub fn finish(&mut self) -> Result<(), RuntimeError> {
        self.pad()?;
        self.flush()?;
        self.flush_sink()?;
        debug!(bytes = self.sink.bytes_written, "output finished");
        Ok(())
    }

    /// Flush the sink itself without touching buffered bits.
    pub fn flush_sink(&mut self) -> Result<(), RuntimeError> {
        self.sink.inner.flush().map_err(RuntimeError::Write)
    }

    fn write_shifted(&mut self, words: &[W], bits: usize) -> Result<(), RuntimeError> {
        let full = bits / W::BITS;
        for &word in &words[..full] {
            self.write_const(word, W::BITS)?;
        }
        let rem = bits % W::BITS;
        if rem != 0 {
            self.write_const(words[full].and(W::high_mask(rem)), rem)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn channel(capacity: usize) -> OutputChannel<Vec<u8>, u32> {
        OutputChannel::new(Vec::new(), capacity)
    }

    /// Sink that rejects every write.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_const_flushes_at_margin() {
        // 8 bytes + margin = 3 words; the margin word starts at bit 64.
        let mut out = channel(8);
        out.write_const(0x1122_3344, 32).unwrap();
        assert!(out.get_ref().is_empty());

        out.write_const(0x5566_7788, 32).unwrap();
        assert_eq!(
            out.get_ref(),
            &vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        assert_eq!(out.bit_pos(), 0);
        assert_eq!(out.bytes_written(), 8);
    }

    #[test]
    fn test_flush_without_complete_word_keeps_bits() {
        let mut split = channel(64);
        split.write_const(u32::left_align(0xABCDE, 20), 20).unwrap();
        split.flush().unwrap();
        assert!(split.get_ref().is_empty());
        assert_eq!(split.bit_pos(), 20);
        split.write_const(u32::left_align(0x123, 12), 12).unwrap();
        split.write_const(0xFF00_0000, 8).unwrap();
        split.finish().unwrap();

        let mut whole = channel(64);
        whole.write_const(0xABCD_E123, 32).unwrap();
        whole.write_const(0xFF00_0000, 8).unwrap();
        whole.finish().unwrap();

        assert_eq!(split.into_inner(), whole.into_inner());
    }

    #[test]
    fn test_finish_pads_partial_word() {
        let mut out = channel(16);
        out.write_const(0xAB00_0000, 8).unwrap();
        out.finish().unwrap();
        assert_eq!(out.into_inner(), vec![0xAB, 0, 0, 0]);
    }

    #[test]
    fn test_finish_when_aligned_adds_nothing() {
        let mut out = channel(16);
        out.write_const(0xDEAD_BEEF, 32).unwrap();
        out.finish().unwrap();
        assert_eq!(out.into_inner(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_write_buffer_alignment_paths_agree() {
        let mut src = BitBuffer::<u32>::with_capacity(16);
        src.append(0xCAFE_BABE, 32);
        src.append(u32::left_align(0x5A, 8), 8);

        // Aligned: direct path after a whole word.
        let mut aligned = channel(16);
        aligned.write_const(0x0123_4567, 32).unwrap();
        aligned.write_buffer(&src).unwrap();
        aligned.finish().unwrap();

        let mut reference = channel(16);
        reference.write_const(0x0123_4567, 32).unwrap();
        reference.write_const(0xCAFE_BABE, 32).unwrap();
        reference.write_const(0x5A00_0000, 8).unwrap();
        reference.finish().unwrap();
        assert_eq!(aligned.into_inner(), reference.into_inner());

        // Misaligned: shifted path after 3 bits.
        let mut misaligned = channel(16);
        misaligned.write_const(0xA000_0000, 3).unwrap();
        misaligned.write_buffer(&src).unwrap();
        misaligned.finish().unwrap();

        let mut reference = channel(16);
        reference.write_const(0xA000_0000, 3).unwrap();
        reference.write_const(0xCAFE_BABE, 32).unwrap();
        reference.write_const(0x5A00_0000, 8).unwrap();
        reference.finish().unwrap();
        assert_eq!(misaligned.into_inner(), reference.into_inner());

        // The source is not consumed.
        assert_eq!(src.bit_pos(), 40);
    }

    #[test]
    fn test_write_array_direct_short_aligned() {
        // Fewer bits than a word on the aligned path still reach the output.
        let mut out = channel(16);
        out.write_array_direct(&[0xFFC0_0000], 10).unwrap();
        assert_eq!(out.bit_pos(), 10);
        out.finish().unwrap();
        assert_eq!(out.into_inner(), vec![0xFF, 0xC0, 0, 0]);
    }

    #[test]
    fn test_write_array_chunks_through_small_channel() {
        // One word plus margin: every whole word forces a flush.
        let mut out = channel(4);
        let words = [1u32, 2, 3, 4, 0x5000_0000];
        out.write_array(&words, 4 * 32 + 4).unwrap();
        out.finish().unwrap();

        let bytes = out.into_inner();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..16], &[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4]);
        assert_eq!(&bytes[16..], &[0x50, 0, 0, 0]);
    }

    #[test]
    fn test_write_array_misaligned() {
        let mut out = channel(4);
        out.write_const(0x8000_0000, 1).unwrap();
        out.write_array(&[u32::MAX, 0xFFFF_0000], 48).unwrap();
        out.finish().unwrap();
        assert_eq!(
            out.into_inner(),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x80, 0]
        );
    }

    #[test]
    fn test_write_error_is_reported() {
        let mut out: OutputChannel<BrokenPipe, u32> = OutputChannel::new(BrokenPipe, 4);
        out.write_const(0xFFFF_0000, 16).unwrap();
        let err = out.write_const(0xFFFF_0000, 16).unwrap_err();
        assert!(matches!(err, RuntimeError::Write(_)));
    }

    #[test]
    fn test_u64_words_are_big_endian() {
        let mut out: OutputChannel<Vec<u8>, u64> = OutputChannel::new(Vec::new(), 64);
        out.write_const(u64::left_align(0x0102, 16), 16).unwrap();
        out.finish().unwrap();
        assert_eq!(out.into_inner(), vec![1, 2, 0, 0, 0, 0, 0, 0]);
    }
}
