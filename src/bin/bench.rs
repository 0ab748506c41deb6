//! Throughput benchmarks for the bit buffering engine.
//!
//! Measures raw write, splice and lookahead throughput for regression testing
//! during development. All data is generated in memory and output goes to
//! `io::sink()`, so results reflect the engine rather than the disk.
//!
//! Usage:
//!   cargo run --release --bin bench          # Run with default 50 iterations
//!   cargo run --release --bin bench -- 500   # Run with custom iteration count

#![allow(clippy::cast_precision_loss)]

use std::env;
use std::hint::black_box;
use std::io::{self, Cursor, Read, Write};
use std::time::Instant;

use bitrt::{
    BitBuffer, Context, Driver, InputWindow, OutputChannel, Recognizer, RuntimeConfig,
    RuntimeError, Verdict, Word,
};

const DEFAULT_ITERATIONS: usize = 50;
const INPUT_BYTES: usize = 1 << 20;

struct BenchConfig {
    name: &'static str,
    run: fn(&[u8]) -> Result<(), RuntimeError>,
}

const BENCHMARKS: &[BenchConfig] = &[
    BenchConfig {
        name: "write_const 13-bit",
        run: write_const_13,
    },
    BenchConfig {
        name: "write_const 64-bit",
        run: write_const_64,
    },
    BenchConfig {
        name: "write_buffer offset",
        run: write_buffer_misaligned,
    },
    BenchConfig {
        name: "window scan",
        run: window_scan,
    },
    BenchConfig {
        name: "identity run",
        run: identity_run,
    },
];

/// One 13-bit code per input byte pair.
fn write_const_13(input: &[u8]) -> Result<(), RuntimeError> {
    let mut out: OutputChannel<_, u64> = OutputChannel::new(io::sink(), 16 * 1024);
    for pair in input.chunks_exact(2) {
        let code = u64::from(u16::from_be_bytes([pair[0], pair[1]])) & 0x1FFF;
        out.write_const(u64::left_align(code, 13), 13)?;
    }
    out.finish()
}

fn write_const_64(input: &[u8]) -> Result<(), RuntimeError> {
    let mut out: OutputChannel<_, u64> = OutputChannel::new(io::sink(), 16 * 1024);
    for chunk in input.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        out.write_const(u64::from_be_bytes(word), 64)?;
    }
    out.finish()
}

/// Splice 1 KiB scratch buffers into a channel sitting 3 bits off a boundary.
fn write_buffer_misaligned(input: &[u8]) -> Result<(), RuntimeError> {
    let mut out: OutputChannel<_, u64> = OutputChannel::new(io::sink(), 16 * 1024);
    let mut scratch = BitBuffer::<u64>::with_capacity(2048);
    out.write_const(u64::left_align(0b101, 3), 3)?;

    for chunk in input.chunks(1024) {
        for &byte in chunk {
            scratch.append(u64::left_align(u64::from(byte), 8), 8);
        }
        out.write_buffer(&scratch)?;
        scratch.reset();
    }
    out.finish()
}

/// Count newlines with 64-byte lookahead.
fn window_scan(input: &[u8]) -> Result<(), RuntimeError> {
    let mut win = InputWindow::new(Cursor::new(input), 16 * 1024);
    let mut lines = 0usize;
    while win.refill_if_needed(1, 64)? {
        let n = win.avail().min(64);
        lines += win.lookahead()[..n].iter().filter(|&&b| b == b'\n').count();
        win.consume(n);
    }
    black_box(lines);
    Ok(())
}

struct Identity;

impl Recognizer<u64> for Identity {
    fn recognize<R: Read, S: Write>(
        &mut self,
        ctx: &mut Context<R, S, u64>,
    ) -> Result<Verdict, RuntimeError> {
        while ctx.input.refill_if_needed(1, 256)? {
            let n = ctx.input.avail().min(256);
            for &byte in &ctx.input.lookahead()[..n] {
                ctx.output
                    .write_const(u64::left_align(u64::from(byte), 8), 8)?;
            }
            ctx.input.consume(n);
        }
        Ok(Verdict::Accept)
    }
}

fn identity_run(input: &[u8]) -> Result<(), RuntimeError> {
    let mut driver =
        Driver::<_, _, u64>::new(RuntimeConfig::default(), Cursor::new(input), io::sink())?;
    driver.run(&mut Identity)?;
    Ok(())
}

/// Deterministic pseudo-random input (xorshift).
fn make_input(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state.to_be_bytes()[0]
        })
        .collect()
}

fn bench(config: &BenchConfig, input: &[u8], iterations: usize) {
    // Warmup run
    if let Err(e) = (config.run)(input) {
        println!("{:<22} SKIP ({e})", config.name);
        return;
    }

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box((config.run)(black_box(input)));
    }

    let elapsed = start.elapsed();
    let per_iter_us = elapsed.as_secs_f64() * 1_000_000.0 / iterations as f64;
    let throughput_mbps = input.len() as f64 / per_iter_us;

    println!(
        "{:<22} {:>10.2} µs/iter  {:>8.1} MB/s",
        config.name, per_iter_us, throughput_mbps
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let iterations = if args.len() >= 2 {
        args[1].parse().unwrap_or(DEFAULT_ITERATIONS)
    } else {
        DEFAULT_ITERATIONS
    };

    let input = make_input(INPUT_BYTES);

    println!("bitrt Benchmarks");
    println!("================");
    println!("Iterations: {iterations}");
    println!("Input size: {INPUT_BYTES} bytes\n");

    println!("{:<22} {:>17}  {:>12}", "Test", "Time", "Throughput");
    println!("{:<22} {:>17}  {:>12}", "----", "----", "----------");

    for config in BENCHMARKS {
        bench(config, &input, iterations);
    }

    println!("\nUse these results for relative comparisons only.");
}
