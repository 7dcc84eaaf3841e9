//! Convert Linux `perf script` output to Chrome Trace Event Format.
//!
//! This crate turns the per-sample text dump produced by
//! `perf script -F comm,pid,tid,cpu,time` into a JSON trace that timeline
//! viewers such as `chrome://tracing` or Perfetto can load.
//!
//! # Modules
//!
//! - [`perf`] - Parse `perf script` lines into trace events
//! - [`trace`] - The trace document and its JSON reader/writer
//!
//! # Example
//!
//! ```no_run
//! use perf_to_trace::perf::PerfConverter;
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! let input = BufReader::new(File::open("out-perf-script.txt").unwrap());
//! let output = BufWriter::new(File::create("trace.json").unwrap());
//!
//! let mut converter = PerfConverter::new();
//! converter.parse(input).unwrap();
//! converter.write_trace(output).unwrap();
//! ```

pub mod perf;
pub mod trace;
