//! Convert `perf script` output to a Chrome trace.
//!
//! This binary reads the per-sample text dump produced by
//! `perf script -F comm,pid,tid,cpu,time` and writes a Chrome Trace Event
//! Format JSON document, loadable in `chrome://tracing` or Perfetto.
//!
//! # Usage
//!
//! ```bash
//! perf script -F comm,pid,tid,cpu,time > out-perf-script.txt
//! perf_to_trace out-perf-script.txt > trace.json
//! perf_to_trace out-perf-script.txt -o trace.json --duration 50
//! ```

use clap::Parser;
use env_logger::Env;
use log::{LevelFilter, info};
use perf_to_trace::perf::{ConverterConfig, PerfConverter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "perf_to_trace")]
#[command(about = "Convert perf script output to Chrome Trace Event Format")]
#[command(version)]
struct Args {
    /// Input file produced by `perf script`
    input: PathBuf,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Category tag for every event
    #[arg(short, long, default_value = "PERF")]
    category: String,

    /// Duration of every event in microseconds
    #[arg(short, long, default_value = "10")]
    duration: u64,

    /// Enable verbose logging (overrides the global level from RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConverterConfig {
        category: args.category,
        duration_us: args.duration,
    };

    info!("Processing {}...", args.input.display());

    // Open input
    let input_file = File::open(&args.input).map_err(|e| {
        format!(
            "Failed to open input file '{}': {}",
            args.input.display(),
            e
        )
    })?;
    let reader = BufReader::new(input_file);

    // Parse
    let mut converter = PerfConverter::with_config(config);
    converter.parse(reader)?;

    // Nothing is written until the whole input has been read
    match args.output {
        Some(path) => {
            let output_file = File::create(&path).map_err(|e| {
                format!("Failed to create output file '{}': {}", path.display(), e)
            })?;
            let mut writer = BufWriter::new(output_file);
            converter.write_trace(&mut writer)?;
            writer.flush()?;
            info!("Wrote trace to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            converter.write_trace(&mut writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
