//! Error types for the bit I/O runtime.

use std::io;

use thiserror::Error;

/// Errors that end a run.
///
/// Recognition failure is not an error: it is reported through
/// [`Outcome::Fail`](crate::Outcome::Fail).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Writing to the output sink failed.
    #[error("error writing to output: {0}")]
    Write(#[source] io::Error),

    /// Reading from the input source failed.
    #[error("error reading from input: {0}")]
    Read(#[source] io::Error),

    /// The runtime was configured with unusable sizes.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Invalid [`RuntimeConfig`](crate::RuntimeConfig) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Input block size of zero.
    #[error("input block size must be non-zero")]
    ZeroBlockSize,

    /// A buffer size is not a whole number of words.
    #[error("{name} ({size} bytes) must be a multiple of the {word_bytes}-byte word size")]
    NotWordMultiple {
        name: &'static str,
        size: usize,
        word_bytes: usize,
    },

    /// A buffer size is below the minimum the flush/grow logic needs.
    #[error("{name} ({size} bytes) must be at least {min} bytes")]
    TooSmall {
        name: &'static str,
        size: usize,
        min: usize,
    },
}

/// Errors from [`BitReader`](crate::BitReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitReadError {
    /// Not enough bits remaining in input.
    #[error("not enough bits remaining in input")]
    Underflow,

    /// Requested bit count outside 1..=64.
    #[error("invalid bit count: {0}")]
    InvalidLength(usize),
}
