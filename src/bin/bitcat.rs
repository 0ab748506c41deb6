//! bitcat: identity transducer built on the bitrt runtime.
//!
//! Copies stdin to stdout through the full buffering engine: bytes are
//! gathered into a scratch buffer per lookahead window and spliced into the
//! output channel. Output is zero-padded to a whole 64-bit word.
//!
//! Usage:
//!   bitcat < infile > outfile
//!   bitcat -i      # compilation info
//!   bitcat -t      # report elapsed time on stderr

use std::io::{Read, Write};
use std::process::ExitCode;

use bitrt::{BitBuffer, Context, Recognizer, RuntimeError, Verdict, Word};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bytes inspected per lookahead.
const WINDOW: usize = 256;

struct Identity {
    scratch: Option<BitBuffer<u64>>,
}

impl Recognizer<u64> for Identity {
    fn recognize<R: Read, S: Write>(
        &mut self,
        ctx: &mut Context<R, S, u64>,
    ) -> Result<Verdict, RuntimeError> {
        let mut scratch = self
            .scratch
            .take()
            .unwrap_or_else(|| ctx.scratch_buffer());

        while ctx.input.refill_if_needed(1, WINDOW)? {
            let taken = ctx.input.avail().min(WINDOW);
            for &byte in &ctx.input.lookahead()[..taken] {
                scratch.append(u64::left_align(u64::from(byte), 8), 8);
            }
            ctx.output.write_buffer(&scratch)?;
            scratch.reset();
            ctx.input.consume(taken);
        }

        self.scratch = Some(scratch);
        Ok(Verdict::Accept)
    }
}

fn main() -> ExitCode {
    let info = format!("bitcat {VERSION}\nword: 64 bits\nrecognizer: identity");
    bitrt::cli::main(Identity { scratch: None }, &info)
}
