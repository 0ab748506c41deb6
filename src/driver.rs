//! Execution driver and the recognizer contract.
//!
//! A generated recognizer implements [`Recognizer`]. The [`Driver`] owns the
//! run's state in a [`Context`] and hands it to the recognizer explicitly:
//!
//! 1. The recognizer calls [`InputWindow::refill_if_needed`] before inspecting
//!    bytes and [`InputWindow::consume`] once it commits to them.
//! 2. It emits bits through the [`OutputChannel`], directly or via scratch
//!    [`BitBuffer`]s spliced in later.
//! 3. It ends with [`Verdict::Accept`] or [`Verdict::Fail`].
//!
//! On accept the driver pads the last partial word and flushes everything. On
//! failure it reports the number of bytes consumed and leaves buffered bits
//! unflushed; whatever already reached the sink is valid output for the bytes
//! matched so far.

use std::io::{Read, Write};

use tracing::{info, warn};

use crate::bitbuffer::BitBuffer;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::input::InputWindow;
use crate::output::OutputChannel;
use crate::word::Word;

/// Terminal state reached by a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Input matched.
    Accept,
    /// Input did not match at the current position.
    Fail,
}

/// Result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Input matched and all output was flushed.
    Accept,
    /// Input did not match after consuming `position` bytes.
    Fail { position: u64 },
}

/// State shared between the driver and a recognizer for one run.
#[derive(Debug)]
pub struct Context<R: Read, S: Write, W: Word = u64> {
    /// Lookahead over the input source.
    pub input: InputWindow<R>,
    /// Bit output bound to the sink.
    pub output: OutputChannel<S, W>,
    config: RuntimeConfig,
}

impl<R: Read, S: Write, W: Word> Context<R, S, W> {
    /// Sizes this run was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// New accumulating buffer with the configured initial capacity.
    pub fn scratch_buffer(&self) -> BitBuffer<W> {
        BitBuffer::with_capacity(self.config.initial_buffer_size)
    }
}

/// A generated state machine driving one transduction.
pub trait Recognizer<W: Word = u64> {
    /// Consume input and emit output until a terminal state is reached.
    ///
    /// I/O errors from the context propagate out and end the run.
    fn recognize<R: Read, S: Write>(
        &mut self,
        ctx: &mut Context<R, S, W>,
    ) -> Result<Verdict, RuntimeError>;
}

/// Runs a recognizer between a source and a sink.
#[derive(Debug)]
pub struct Driver<R: Read, S: Write, W: Word = u64> {
    ctx: Context<R, S, W>,
}

impl<R: Read, S: Write, W: Word> Driver<R, S, W> {
    /// Create a driver after validating `config` for word width `W`.
    pub fn new(config: RuntimeConfig, source: R, sink: S) -> Result<Self, RuntimeError> {
        config.validate::<W>()?;
        Ok(Self {
            ctx: Context {
                input: InputWindow::with_config(source, &config),
                output: OutputChannel::with_config(sink, &config),
                config,
            },
        })
    }

    /// The run's context.
    pub fn context(&self) -> &Context<R, S, W> {
        &self.ctx
    }

    /// Run `recognizer` to completion.
    ///
    /// Recognition failure is an [`Outcome`], not an error; only I/O failures
    /// return `Err`.
    pub fn run<Z: Recognizer<W>>(&mut self, recognizer: &mut Z) -> Result<Outcome, RuntimeError> {
        match recognizer.recognize(&mut self.ctx)? {
            Verdict::Accept => {
                self.ctx.output.finish()?;
                info!(
                    consumed = self.ctx.input.count(),
                    written = self.ctx.output.bytes_written(),
                    "input accepted"
                );
                Ok(Outcome::Accept)
            }
            Verdict::Fail => {
                let position = self.ctx.input.count();
                // Bytes already flushed are valid output; push them out of any
                // sink-side buffering.
                self.ctx.output.flush_sink()?;
                warn!(position, "match error");
                Ok(Outcome::Fail { position })
            }
        }
    }

    /// Consume the driver, returning the source and sink.
    pub fn into_parts(self) -> (R, S) {
        (self.ctx.input.into_inner(), self.ctx.output.into_inner())
    }
}

/// Create a [`Driver`] and run `recognizer` once.
pub fn run<R, S, W, Z>(
    config: RuntimeConfig,
    source: R,
    sink: S,
    recognizer: &mut Z,
) -> Result<Outcome, RuntimeError>
where
    R: Read,
    S: Write,
    W: Word,
    Z: Recognizer<W>,
{
    Driver::<R, S, W>::new(config, source, sink)?.run(recognizer)
}
