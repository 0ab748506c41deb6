//! Runtime sizing.

use crate::error::ConfigError;
use crate::word::Word;

/// Default input block size (B): bytes read from the source per refill.
pub const DEFAULT_INPUT_BLOCK_SIZE: usize = 16 * 1024;

/// Default output channel capacity in bytes, excluding the margin word.
pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 16 * 1024;

/// Default initial capacity of accumulating buffers in bytes.
pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4096 * 8;

/// Sizes of the buffers owned by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Input window half size (B). The window itself is `2 * B` bytes.
    pub input_block_size: usize,
    /// Output channel capacity in bytes. One margin word is added on top.
    pub output_buffer_size: usize,
    /// Initial capacity of scratch buffers in bytes.
    pub initial_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            input_block_size: DEFAULT_INPUT_BLOCK_SIZE,
            output_buffer_size: DEFAULT_OUTPUT_BUFFER_SIZE,
            initial_buffer_size: DEFAULT_INITIAL_BUFFER_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Create a configuration with default sizes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input block size.
    #[must_use]
    pub fn with_input_block_size(mut self, bytes: usize) -> Self {
        self.input_block_size = bytes;
        self
    }

    /// Set the output channel capacity.
    #[must_use]
    pub fn with_output_buffer_size(mut self, bytes: usize) -> Self {
        self.output_buffer_size = bytes;
        self
    }

    /// Set the initial scratch buffer capacity.
    #[must_use]
    pub fn with_initial_buffer_size(mut self, bytes: usize) -> Self {
        self.initial_buffer_size = bytes;
        self
    }

    /// Output channel storage in bytes, margin word included.
    pub fn output_capacity<W: Word>(&self) -> usize {
        self.output_buffer_size + W::BYTES
    }

    /// Check the sizes against word width `W`.
    ///
    /// The output channel needs at least one word plus its margin word, and a
    /// scratch buffer needs two words so a misaligned write always has a
    /// following word to spill into.
    pub fn validate<W: Word>(&self) -> Result<(), ConfigError> {
        if self.input_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }

        check_words::<W>("output_buffer_size", self.output_buffer_size, W::BYTES)?;
        check_words::<W>(
            "initial_buffer_size",
            self.initial_buffer_size,
            2 * W::BYTES,
        )?;

        Ok(())
    }
}

fn check_words<W: Word>(name: &'static str, size: usize, min: usize) -> Result<(), ConfigError> {
    if size < min {
        return Err(ConfigError::TooSmall { name, size, min });
    }
    if size % W::BYTES != 0 {
        return Err(ConfigError::NotWordMultiple {
            name,
            size,
            word_bytes: W::BYTES,
        });
    }
    Ok(())
}
