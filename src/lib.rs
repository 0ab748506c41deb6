//! # bitrt
//!
//! Runtime support for generated binary-matching and transcoding programs.
//!
//! A separate compiler produces a recognizer: a state machine that consumes
//! input bytes, decides whether they match, and emits packed output bits. This
//! crate is the bit-granular I/O the recognizer runs on top of.
//!
//! ## Design
//!
//! - **Safe Rust** - `#![forbid(unsafe_code)]`
//! - **Word-generic** - buffers pack bits MSB-first into `u32` or `u64` words
//! - **Explicit state** - every run owns its input window and output channel;
//!   nothing is global
//! - **Bounded memory** - the output channel flushes instead of growing, the
//!   input window never holds more than two blocks
//!
//! ## API Overview
//!
//! ### Buffering Engine
//!
//! - [`BitBuffer`] - Growable packed-bit buffer, streaming or accumulating
//! - [`OutputChannel`] - Fixed-size bit buffer that drains to a byte sink
//! - [`InputWindow`] - Double-buffered lookahead over a byte source
//!
//! ### Execution
//!
//! - [`Recognizer`] - Contract a generated state machine implements
//! - [`Driver`] / [`run()`] - One end-to-end run, yielding an [`Outcome`]
//! - [`cli::main`] - Process entry point for generated programs
//!
//! ### Support
//!
//! - [`Word`] - Storage word abstraction
//! - [`BitReader`] - MSB-first reader for the emitted byte stream
//! - [`RuntimeConfig`] - Block and buffer sizes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::io::{Read, Write};
//! use bitrt::{Context, Recognizer, RuntimeError, Verdict, Word};
//!
//! /// Emits the low nibble of every input byte.
//! struct LowNibbles;
//!
//! impl Recognizer for LowNibbles {
//!     fn recognize<R: Read, S: Write>(
//!         &mut self,
//!         ctx: &mut Context<R, S>,
//!     ) -> Result<Verdict, RuntimeError> {
//!         while ctx.input.refill_if_needed(1, 64)? {
//!             let n = ctx.input.avail();
//!             for &byte in ctx.input.lookahead() {
//!                 ctx.output.write_const(u64::left_align(u64::from(byte), 4), 4)?;
//!             }
//!             ctx.input.consume(n);
//!         }
//!         Ok(Verdict::Accept)
//!     }
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     bitrt::cli::main(LowNibbles, "low-nibble extractor")
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod bitbuffer;
mod bitreader;
pub mod cli;
mod config;
mod driver;
mod error;
mod input;
mod output;
mod word;

pub use bitbuffer::{BitBuffer, DEFAULT_CAPACITY};
pub use bitreader::BitReader;
pub use config::{
    RuntimeConfig, DEFAULT_INITIAL_BUFFER_SIZE, DEFAULT_INPUT_BLOCK_SIZE,
    DEFAULT_OUTPUT_BUFFER_SIZE,
};
pub use driver::{run, Context, Driver, Outcome, Recognizer, Verdict};
pub use error::{BitReadError, ConfigError, RuntimeError};
pub use input::InputWindow;
pub use output::OutputChannel;
pub use word::Word;
