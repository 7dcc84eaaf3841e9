//! Chrome Trace Event Format documents.
//!
//! A trace document is a JSON object holding an ordered `traceEvents`
//! array. Each event produced here is a complete event (`"ph":"X"`) with an
//! explicit start timestamp and duration, both in microseconds.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use perf_to_trace::trace::validate;
//!
//! let file = File::open("trace.json").unwrap();
//! let summary = validate(file).unwrap();
//!
//! println!("Events: {}", summary.events);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use thiserror::Error;

/// Phase marker for complete events.
pub const PHASE_COMPLETE: &str = "X";

/// Fields every event must carry to be placed on a timeline.
pub const REQUIRED_EVENT_FIELDS: [&str; 5] = ["name", "ph", "ts", "pid", "tid"];

/// Errors that can occur while reading or writing trace documents.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing 'traceEvents' array")]
    MissingTraceEvents,

    #[error("event {index} is not an object")]
    InvalidEvent { index: usize },

    #[error("event {index} missing field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Result type for trace document operations.
pub type Result<T> = std::result::Result<T, TraceError>;

/// Per-event arguments shown in the viewer's detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgs {
    /// CPU the sample was taken on.
    pub cpu: u32,
}

/// A single timeline event.
///
/// Field order matches the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Display name (process or thread command name).
    pub name: String,
    /// Category tag.
    pub cat: String,
    /// Event phase.
    pub ph: String,
    /// Start timestamp in microseconds.
    pub ts: f64,
    /// Duration in microseconds.
    pub dur: u64,
    /// Process ID.
    pub pid: u64,
    /// Thread ID.
    pub tid: u64,
    pub args: EventArgs,
}

/// The top-level trace container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceDocument {
    /// Events in input order.
    pub trace_events: Vec<TraceEvent>,
}

impl TraceDocument {
    /// Create a document from an ordered list of events.
    pub fn new(trace_events: Vec<TraceEvent>) -> Self {
        Self { trace_events }
    }

    /// Read a document previously written by [`TraceDocument::write_json`].
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the document as compact single-line JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Counts gathered while validating a trace document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceSummary {
    pub events: usize,
    pub processes: usize,
    pub threads: usize,
}

/// Check that a trace document has a `traceEvents` array and that every
/// event carries the fields in [`REQUIRED_EVENT_FIELDS`].
///
/// Only field presence is checked; values are not interpreted beyond
/// collecting distinct process and thread identifiers.
pub fn validate<R: Read>(reader: R) -> Result<TraceSummary> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let events = value
        .get("traceEvents")
        .and_then(|v| v.as_array())
        .ok_or(TraceError::MissingTraceEvents)?;

    let mut processes = HashSet::new();
    let mut threads = HashSet::new();

    for (index, event) in events.iter().enumerate() {
        let obj = event
            .as_object()
            .ok_or(TraceError::InvalidEvent { index })?;
        for field in REQUIRED_EVENT_FIELDS {
            if !obj.contains_key(field) {
                return Err(TraceError::MissingField { index, field });
            }
        }
        processes.insert(obj["pid"].to_string());
        threads.insert((obj["pid"].to_string(), obj["tid"].to_string()));
    }

    Ok(TraceSummary {
        events: events.len(),
        processes: processes.len(),
        threads: threads.len(),
    })
}
