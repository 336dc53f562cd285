//! Execution log sink.
//!
//! Collects every attempted invocation and free-text trace line of a session
//! in insertion order. The in-memory log is always kept; optionally each
//! entry is also written through to a writer as it is appended, either as the
//! bracketed text trace or as one JSON object per line:
//!
//! ```text
//! [module] sample
//! [function] greet
//! [return value] "hello world"
//! [class] Counter
//! [instance methods] Counter
//! [method] increment
//! [return value] 1
//! [skipped members] VERSION
//! ```
//!
//! Writer failures never end a session: the writer is dropped with a warning
//! and the in-memory log carries on.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{InvocationRecord, Outcome};

/// Representation the text format leaves out of `[return value]` lines.
const NOTHING_REPR: &str = "nothing";

/// One entry of the execution log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Trace { line: String },
    Invocation(InvocationRecord),
}

/// On-disk format of a write-through sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Jsonl,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{other}' (expected text or jsonl)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Closed execution log: ordered entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionLog {
    entries: Vec<LogEntry>,
}

impl ExecutionLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &InvocationRecord> {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Invocation(record) => Some(record),
            LogEntry::Trace { .. } => None,
        })
    }

    pub fn traces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            LogEntry::Trace { line } => Some(line.as_str()),
            LogEntry::Invocation(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole log rendered in the text format.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            for line in render_text(entry) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

struct LogWriter {
    out: Box<dyn Write + Send>,
    format: LogFormat,
}

/// Append-only sink for one or more exploration sessions.
pub struct ExecutionLogSink {
    id: String,
    log: ExecutionLog,
    invocations: u64,
    writer: Option<LogWriter>,
}

impl Default for ExecutionLogSink {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ExecutionLogSink {
    /// A sink that only keeps the in-memory log.
    pub fn in_memory() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            log: ExecutionLog::default(),
            invocations: 0,
            writer: None,
        }
    }

    /// Also write every entry through to `out`.
    pub fn with_writer(out: impl Write + Send + 'static, format: LogFormat) -> Self {
        let mut sink = Self::in_memory();
        sink.writer = Some(LogWriter {
            out: Box::new(out),
            format,
        });
        sink
    }

    /// Write through to the file at `path`, opened in append mode.
    pub fn open(path: &Path, format: LogFormat) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open execution log {}", path.display()))?;
        Ok(Self::with_writer(BufWriter::new(file), format))
    }

    /// Unique id of this sink, shared by all sessions written into it.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sequence number the next appended invocation should carry.
    pub fn next_seq(&self) -> u64 {
        self.invocations + 1
    }

    pub fn trace(&mut self, line: impl Into<String>) {
        self.push(LogEntry::Trace { line: line.into() });
    }

    pub fn append(&mut self, record: InvocationRecord) {
        self.invocations += 1;
        self.push(LogEntry::Invocation(record));
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Flush the writer (if any) and hand back the collected log.
    pub fn close(mut self) -> ExecutionLog {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.out.flush() {
                tracing::warn!("failed to flush execution log: {}", e);
            }
        }
        self.log
    }

    fn push(&mut self, entry: LogEntry) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = write_entry(writer, &entry) {
                tracing::warn!("execution log writer failed, keeping in-memory log only: {}", e);
                self.writer = None;
            }
        }
        self.log.entries.push(entry);
    }
}

fn write_entry(writer: &mut LogWriter, entry: &LogEntry) -> Result<()> {
    match writer.format {
        LogFormat::Text => {
            for line in render_text(entry) {
                writeln!(writer.out, "{}", strip_control_chars(&line))?;
            }
        }
        LogFormat::Jsonl => {
            let line = serde_json::to_string(entry)?;
            writeln!(writer.out, "{}", strip_control_chars(&line))?;
        }
    }
    // Flushed per entry so the file is complete even if a worker outlives the session.
    writer.out.flush()?;
    Ok(())
}

/// Text lines for one entry. Invocation headers are traces of their own, so a
/// record renders only its outcome.
fn render_text(entry: &LogEntry) -> Vec<String> {
    match entry {
        LogEntry::Trace { line } => line.lines().map(str::to_string).collect(),
        LogEntry::Invocation(record) => match &record.outcome {
            Outcome::Success { value } if value == NOTHING_REPR => Vec::new(),
            Outcome::Success { value } => vec![format!("[return value] {value}")],
            Outcome::Fault { kind, message, .. } => vec![format!("{kind}: {message}")],
            Outcome::Timeout { error } => vec![format!("Timeout: {error}")],
        },
    }
}

/// Drop control characters other than tab and newline.
pub fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || *c == '\t' || *c == '\n')
        .collect()
}
