//! Process-level entry point for generated programs.
//!
//! A generated program's `main` hands its recognizer and compilation info to
//! [`main`]:
//!
//! ```text
//! prog              read stdin to end, write transformed bits to stdout
//! prog -i           print compilation info
//! prog -t           run, then print "time (ms): N" to stderr if accepted
//! ```
//!
//! Anything else prints the usage text. Logging goes to stderr through
//! `tracing`, filtered by the `BITRT_LOG` environment variable.

use std::ffi::OsString;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;
use crate::driver::{Driver, Outcome, Recognizer};
use crate::error::RuntimeError;
use crate::word::Word;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BITRT_LOG";

/// Process exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Input accepted, output complete.
    Success,
    /// Reading the input or writing the output failed.
    Error,
    /// Compilation info printed.
    Info,
    /// Malformed invocation.
    Usage,
    /// The recognizer rejected the input.
    MatchError,
}

impl ExitStatus {
    /// Numeric exit code.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::Info => 2,
            Self::Usage => 64,
            Self::MatchError => 65,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// What the invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Transform stdin to stdout, optionally reporting elapsed time.
    Run { timing: bool },
    /// Print compilation info.
    Info,
}

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Print compilation info
    #[arg(short = 'i', conflicts_with = "timing")]
    info: bool,

    /// Print elapsed time to stderr
    #[arg(short = 't')]
    timing: bool,
}

/// Parse the command line, program name first.
///
/// Only no arguments, `-i` or `-t` are accepted; a bare `--` is rejected too.
pub fn parse_mode<I, T>(args: I) -> Result<Mode, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.iter().skip(1).any(|arg| arg == "--") {
        return Err(clap::Error::raw(
            ErrorKind::UnknownArgument,
            "unexpected argument '--'\n",
        ));
    }

    let args = Args::try_parse_from(args)?;
    if args.info {
        Ok(Mode::Info)
    } else {
        Ok(Mode::Run {
            timing: args.timing,
        })
    }
}

/// Usage text for program `name`.
pub fn usage(name: &str) -> String {
    format!(
        "Normal usage: {name} < infile > outfile\n\
         - \"{name}\": reads from stdin and writes to stdout.\n\
         - \"{name} -i\": prints compilation info.\n\
         - \"{name} -t\": runs normally, but prints timing to stderr.\n"
    )
}

/// Install the stderr log subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Carry out `mode` over the given streams and report the exit status.
///
/// Info text goes to `sink`, the same stream transformed output goes to.
/// Diagnostics go to `diag`.
pub fn execute<R, S, W, Z, D>(
    mode: Mode,
    recognizer: &mut Z,
    info: &str,
    config: RuntimeConfig,
    source: R,
    mut sink: S,
    diag: &mut D,
) -> ExitStatus
where
    R: Read,
    S: Write,
    W: Word,
    Z: Recognizer<W>,
    D: Write,
{
    let timing = match mode {
        Mode::Info => {
            return match writeln!(sink, "{info}").and_then(|()| sink.flush()) {
                Ok(()) => ExitStatus::Info,
                Err(e) => report_error(diag, &RuntimeError::Write(e)),
            };
        }
        Mode::Run { timing } => timing,
    };

    let started = Instant::now();
    let result = Driver::<R, S, W>::new(config, source, sink).and_then(|mut d| d.run(recognizer));

    match result {
        Ok(Outcome::Accept) => {
            if timing {
                let _ = writeln!(diag, "time (ms): {}", started.elapsed().as_millis());
            }
            ExitStatus::Success
        }
        Ok(Outcome::Fail { position }) => {
            let _ = writeln!(diag, "Match error at input symbol {position}!");
            ExitStatus::MatchError
        }
        Err(e) => report_error(diag, &e),
    }
}

fn report_error<D: Write>(diag: &mut D, err: &RuntimeError) -> ExitStatus {
    let _ = writeln!(diag, "Error: {err}");
    ExitStatus::Error
}

fn program_name(args: &[OsString]) -> String {
    args.first()
        .and_then(|arg| Path::new(arg).file_name())
        .map_or_else(|| "prog".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Run a generated program over stdin and stdout.
pub fn main<W, Z>(mut recognizer: Z, info: &str) -> ExitCode
where
    W: Word,
    Z: Recognizer<W>,
{
    init_tracing();

    let args: Vec<OsString> = std::env::args_os().collect();
    let mode = match parse_mode(&args) {
        Ok(mode) => mode,
        Err(e) => {
            debug!(error = %e, "rejected arguments");
            print!("{}", usage(&program_name(&args)));
            return ExitStatus::Usage.into();
        }
    };

    let config = RuntimeConfig::default();
    let source = io::stdin().lock();
    let sink = BufWriter::with_capacity(config.output_capacity::<W>(), io::stdout().lock());
    let mut diag = io::stderr().lock();

    execute::<_, _, W, _, _>(mode, &mut recognizer, info, config, source, sink, &mut diag).into()
}
