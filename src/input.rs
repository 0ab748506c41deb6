//! Input window: bounded lookahead over a byte source.
//!
//! The window is a `2 * B` byte array split at the midpoint `B`. Fresh blocks
//! are always read into the second half. When a refill is needed the
//! unconsumed bytes are moved to the end of the first half, so they stay
//! contiguous with the new block and a lookahead straddling the refill reads as
//! one slice. Only that remainder (shorter than the requested lookahead) is
//! ever copied.
//!
//! ```text
//!  0                 B                  2B
//!  |      carried ###|### fresh block   |
//!              ^ B + cursor (cursor <= 0 right after a refill)
//! ```

#![allow(clippy::cast_possible_wrap)]

use std::io::{self, Read};

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

/// Sliding lookahead window over a byte source.
#[derive(Debug)]
pub struct InputWindow<R: Read> {
    source: R,
    /// Window storage, `2 * block` bytes.
    buf: Box<[u8]>,
    /// Block size (B), also the midpoint offset.
    block: usize,
    /// Index of the first unconsumed byte.
    start: usize,
    /// Index one past the last valid byte.
    end: usize,
    /// Bytes consumed over the whole run.
    count: u64,
}

impl<R: Read> InputWindow<R> {
    /// Create a window reading `block_size` bytes per refill.
    ///
    /// # Panics
    /// Panics if `block_size` is zero.
    pub fn new(source: R, block_size: usize) -> Self {
        assert!(block_size > 0, "input block size must be non-zero");
        Self {
            source,
            buf: vec![0u8; 2 * block_size].into_boxed_slice(),
            block: block_size,
            start: block_size,
            end: block_size,
            count: 0,
        }
    }

    /// Create a window sized by `config`.
    pub fn with_config(source: R, config: &RuntimeConfig) -> Self {
        Self::new(source, config.input_block_size)
    }

    /// Block size (B).
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block
    }

    /// Number of valid unconsumed bytes.
    #[inline]
    pub fn avail(&self) -> usize {
        self.end - self.start
    }

    /// Position of the first unconsumed byte relative to the midpoint.
    ///
    /// Negative while bytes carried over from the previous block remain.
    #[inline]
    pub fn cursor(&self) -> isize {
        self.start as isize - self.block as isize
    }

    /// Bytes delivered by the most recent read.
    #[inline]
    pub fn in_size(&self) -> usize {
        self.end - self.block
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The valid unconsumed bytes.
    #[inline]
    pub fn lookahead(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    /// Check if the lookahead starts with `literal`.
    #[inline]
    pub fn compare(&self, literal: &[u8]) -> bool {
        self.lookahead().starts_with(literal)
    }

    /// The source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Consume the window, returning the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Make at least `min_count` bytes available, refilling if fewer than
    /// `max_count` are.
    ///
    /// Returns `Ok(false)` when the source cannot supply `min_count` bytes.
    /// That is a normal end-of-input signal, not an error.
    ///
    /// # Panics
    /// Panics if `min_count > max_count` or `max_count` exceeds the block size.
    pub fn refill_if_needed(
        &mut self,
        min_count: usize,
        max_count: usize,
    ) -> Result<bool, RuntimeError> {
        assert!(
            min_count <= max_count,
            "minimum lookahead {min_count} exceeds maximum {max_count}"
        );
        assert!(
            max_count <= self.block,
            "lookahead of {max_count} bytes exceeds block size {}",
            self.block
        );

        if self.avail() < max_count {
            let remaining = self.avail();
            let dest = self.block - remaining;
            self.buf.copy_within(self.start..self.end, dest);
            self.start = dest;
            self.end = self.block;

            let read = self.fill_block()?;
            self.end = self.block + read;
            debug!(carried = remaining, read, "refilled input window");
        }

        Ok(self.avail() >= min_count)
    }

    /// Advance past `c` bytes.
    ///
    /// # Panics
    /// Panics if `c` exceeds [`avail`](Self::avail).
    #[inline]
    pub fn consume(&mut self, c: usize) {
        assert!(
            c <= self.avail(),
            "consumed {c} bytes with only {} available",
            self.avail()
        );
        self.start += c;
        self.count += c as u64;
    }

    /// Read into the second half until it is full or the source is exhausted.
    fn fill_block(&mut self) -> Result<usize, RuntimeError> {
        let block = &mut self.buf[self.block..];
        let mut filled = 0;

        while filled < block.len() {
            match self.source.read(&mut block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(RuntimeError::Read(e)),
            }
        }

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Source delivering at most `chunk` bytes per read, interrupted once.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        interrupted: bool,
        reads: usize,
    }

    impl Trickle {
        fn new(data: Vec<u8>, chunk: usize) -> Self {
            Self {
                data,
                pos: 0,
                chunk,
                interrupted: false,
                reads: 0,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device error"))
        }
    }

    fn window(data: &[u8], block: usize) -> InputWindow<Cursor<Vec<u8>>> {
        InputWindow::new(Cursor::new(data.to_vec()), block)
    }

    #[test]
    fn test_initial_state() {
        let win = window(b"abc", 4);
        assert_eq!(win.avail(), 0);
        assert_eq!(win.cursor(), 0);
        assert_eq!(win.in_size(), 0);
        assert_eq!(win.count(), 0);
        assert!(win.lookahead().is_empty());
    }

    #[test]
    fn test_refill_reads_block() {
        let data: Vec<u8> = (0..10).collect();
        let mut win = window(&data, 4);

        assert!(win.refill_if_needed(1, 4).unwrap());
        assert_eq!(win.avail(), 4);
        assert_eq!(win.in_size(), 4);
        assert_eq!(win.cursor(), 0);
        assert_eq!(win.lookahead(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_carry_over_gives_negative_cursor() {
        let data: Vec<u8> = (0..10).collect();
        let mut win = window(&data, 4);

        win.refill_if_needed(1, 4).unwrap();
        win.consume(3);
        assert!(win.refill_if_needed(2, 4).unwrap());
        assert_eq!(win.cursor(), -1);
        assert_eq!(win.avail(), 5);
        assert_eq!(win.lookahead(), &[3, 4, 5, 6, 7]);
        assert_eq!(win.count(), 3);
    }

    #[test]
    fn test_no_refill_when_enough_available() {
        let mut win = InputWindow::new(Trickle::new((0..16).collect(), 16), 8);
        win.refill_if_needed(1, 8).unwrap();
        let reads = win.get_ref().reads;

        win.consume(2);
        assert!(win.refill_if_needed(1, 6).unwrap());
        assert_eq!(win.get_ref().reads, reads);
        assert_eq!(win.lookahead(), &[2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_short_reads_fill_whole_block() {
        let mut win = InputWindow::new(Trickle::new((0..10).collect(), 3), 8);
        assert!(win.refill_if_needed(8, 8).unwrap());
        assert_eq!(win.lookahead(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_insufficient_at_end_of_input() {
        let mut win = window(b"xyz", 4);
        assert!(!win.refill_if_needed(4, 4).unwrap());
        assert_eq!(win.avail(), 3);
        // Still exposes what is there.
        assert!(win.refill_if_needed(1, 4).unwrap());
        assert_eq!(win.lookahead(), b"xyz");

        win.consume(3);
        assert!(!win.refill_if_needed(1, 1).unwrap());
        assert_eq!(win.count(), 3);
    }

    #[test]
    fn test_compare() {
        let mut win = window(b"GET /index", 8);
        win.refill_if_needed(4, 8).unwrap();
        assert!(win.compare(b"GET "));
        assert!(!win.compare(b"PUT "));
        win.consume(4);
        assert!(win.compare(b"/ind"));
        // Longer than the lookahead
        assert!(!win.compare(b"/index.html"));
    }

    #[test]
    fn test_read_error() {
        let mut win = InputWindow::new(Failing, 4);
        let err = win.refill_if_needed(1, 1).unwrap_err();
        assert!(matches!(err, RuntimeError::Read(_)));
        assert_eq!(win.avail(), 0);
    }

    #[test]
    #[should_panic(expected = "only 2 available")]
    fn test_consume_past_avail_panics() {
        let mut win = window(b"ab", 4);
        win.refill_if_needed(1, 4).unwrap();
        win.consume(3);
    }

    #[test]
    #[should_panic(expected = "exceeds block size")]
    fn test_lookahead_beyond_block_panics() {
        let mut win = window(b"abcdef", 4);
        let _ = win.refill_if_needed(1, 5);
    }
}
