//! Convert Linux `perf script` output to Chrome Trace Event Format.
//!
//! This module parses the text output from
//! `perf script -F comm,pid,tid,cpu,time` and turns every sample line into
//! a complete trace event, one timeline slice per sample.
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

use crate::trace::{EventArgs, PHASE_COMPLETE, TraceDocument, TraceError, TraceEvent};
use log::{debug, info, warn};
use regex::{Captures, Regex};
use std::io::{BufRead, BufReader, Read, Write};
use std::sync::LazyLock;
use thiserror::Error;

/// Unmatched lines at or before this line number are reported.
const REPORT_UNMATCHED_UP_TO_LINE: usize = 4;

/// `comm pid[/tid] [cpu] seconds.fraction:` at the start of a line.
///
/// The command name is non-greedy so names containing spaces are split at
/// the earliest position where the id/cpu/timestamp suffix fits.
static SAMPLE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s+([0-9]+(?:/[0-9]+)?)\s+\[([0-9]+)\]\s+([0-9]+\.[0-9]+):")
        .expect("Invalid sample line regex pattern")
});

/// Errors that can occur during perf script conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace output error: {0}")]
    Trace(#[from] TraceError),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Settings applied to every emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Value of the `cat` field.
    pub category: String,
    /// Value of the `dur` field, in microseconds.
    pub duration_us: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            category: "PERF".to_string(),
            duration_us: 10,
        }
    }
}

/// Line counters for a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Every line read, including blank and comment lines.
    pub lines_read: usize,
    /// Lines that produced an event.
    pub lines_matched: usize,
}

/// A parsed sample line from perf script output.
#[derive(Debug, Clone, PartialEq)]
struct PerfSample {
    comm: String,
    pid: u64,
    tid: u64,
    cpu: u32,
    timestamp: f64,
}

/// Outcome of looking at one input line.
#[derive(Debug, PartialEq)]
enum LineKind {
    Blank,
    Comment,
    Sample(PerfSample),
    /// The line has the sample shape but an id does not fit its integer type.
    OutOfRange,
    Unmatched,
}

/// Converter from perf script output to a trace document.
pub struct PerfConverter {
    config: ConverterConfig,
    document: TraceDocument,
    stats: ConvertStats,
}

impl PerfConverter {
    /// Create a new converter with the default category and duration.
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    /// Create a new converter with custom settings.
    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            config,
            document: TraceDocument::default(),
            stats: ConvertStats::default(),
        }
    }

    /// Parse perf script output from a reader.
    ///
    /// Lines that do not look like samples are skipped. Only I/O errors
    /// abort parsing.
    pub fn parse<R: Read>(&mut self, reader: R) -> Result<()> {
        let buf_reader = BufReader::new(reader);
        let mut line_num = 0;

        for line_result in buf_reader.lines() {
            line_num += 1;
            self.stats.lines_read += 1;
            let line = line_result?;

            match Self::classify_line(&line) {
                LineKind::Blank | LineKind::Comment => continue,
                LineKind::Sample(sample) => {
                    debug!(
                        "line {}: {} pid={} tid={} cpu={}",
                        line_num, sample.comm, sample.pid, sample.tid, sample.cpu
                    );
                    self.add_sample(sample);
                }
                LineKind::OutOfRange => {
                    warn!(
                        "Identifier out of range on line {}: {}",
                        line_num,
                        line.trim()
                    );
                }
                LineKind::Unmatched => {
                    if line_num <= REPORT_UNMATCHED_UP_TO_LINE {
                        warn!("Failed to match line: {}", line.trim());
                    }
                }
            }
        }

        info!(
            "Processed {} lines, matched {} events.",
            self.stats.lines_read, self.stats.lines_matched
        );

        Ok(())
    }

    fn add_sample(&mut self, sample: PerfSample) {
        self.stats.lines_matched += 1;
        self.document.trace_events.push(TraceEvent {
            name: sample.comm,
            cat: self.config.category.clone(),
            ph: PHASE_COMPLETE.to_string(),
            ts: sample.timestamp * 1_000_000.0,
            dur: self.config.duration_us,
            pid: sample.pid,
            tid: sample.tid,
            args: EventArgs { cpu: sample.cpu },
        });
    }

    fn classify_line(line: &str) -> LineKind {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else if let Some(caps) = SAMPLE_LINE_RE.captures(line) {
            match Self::sample_from_captures(&caps) {
                Some(sample) => LineKind::Sample(sample),
                None => LineKind::OutOfRange,
            }
        } else {
            LineKind::Unmatched
        }
    }

    /// Build a sample from the captures of a sample line.
    /// Format: `comm pid[/tid] [cpu] seconds:` followed by anything.
    /// Examples:
    ///   `firefox 1234 [0] 100.500000: cycles:`
    ///   `Chrome_ChildIOThread 1991576/1991578 [3] 55.123456: sched:sched_switch`
    fn sample_from_captures(caps: &Captures<'_>) -> Option<PerfSample> {
        let (pid, tid) = Self::parse_pid_tid(&caps[2])?;
        let cpu = caps[3].parse().ok()?;
        let timestamp = caps[4].parse().ok()?;

        Some(PerfSample {
            comm: caps[1].trim().to_string(),
            pid,
            tid,
            cpu,
            timestamp,
        })
    }

    fn parse_pid_tid(s: &str) -> Option<(u64, u64)> {
        if let Some((pid, tid)) = s.split_once('/') {
            Some((pid.parse().ok()?, tid.parse().ok()?))
        } else {
            let pid = s.parse().ok()?;
            Some((pid, pid)) // single-threaded: tid is the pid
        }
    }

    /// Line counters accumulated so far.
    pub fn stats(&self) -> ConvertStats {
        self.stats
    }

    /// Events produced so far, in input order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.document.trace_events
    }

    /// Consume the converter and return the trace document.
    pub fn into_document(self) -> TraceDocument {
        self.document
    }

    /// Write the events parsed so far as a trace document.
    pub fn write_trace<W: Write>(&self, writer: W) -> Result<()> {
        self.document.write_json(writer)?;
        Ok(())
    }
}

impl Default for PerfConverter {
    fn default() -> Self {
        Self::new()
    }
}
