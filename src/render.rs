//! Terminal rendering of a job console.
//!
//! Lines are shown as `[sequence] text` and tinted by a keyword heuristic:
//!
//! | Contains | Kind | Colour |
//! |----------|------|--------|
//! | `Error` | [`LineKind::Error`] | red |
//! | `Success` or `Saved` | [`LineKind::Success`] | green |
//! | `Found` | [`LineKind::Info`] | blue |
//! | anything else | [`LineKind::Plain`] | default |
//!
//! Matching is case-sensitive and the first row that matches wins. The
//! heuristic only affects presentation, never the session status.

use crate::console::ConsoleEvent;
use crate::models::{JobStatus, LogLine};
use std::io::{self, Write};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Error,
    Success,
    Info,
    Plain,
}

impl LineKind {
    pub fn classify(text: &str) -> Self {
        if text.contains("Error") {
            LineKind::Error
        } else if text.contains("Success") || text.contains("Saved") {
            LineKind::Success
        } else if text.contains("Found") {
            LineKind::Info
        } else {
            LineKind::Plain
        }
    }

    fn color(self) -> Option<&'static str> {
        match self {
            LineKind::Error => Some(RED),
            LineKind::Success => Some(GREEN),
            LineKind::Info => Some(BLUE),
            LineKind::Plain => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable console.
    Text,
    /// One JSON `LogLine` object per line.
    Json,
}

pub fn status_text(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Idle => "Idle",
        JobStatus::Running => "Job in progress...",
        JobStatus::Finished => "Job finished",
        JobStatus::Errored => "Job failed",
        JobStatus::Cancelled => "Job cancelled",
    }
}

/// Writes console events to a terminal (or any writer).
#[derive(Debug)]
pub struct LogView {
    format: OutputFormat,
    color: bool,
}

impl LogView {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    pub fn format_line(&self, line: &LogLine) -> String {
        let prefix = format!("[{}]", line.sequence);
        if !self.color {
            return format!("{prefix} {}", line.text);
        }
        match LineKind::classify(&line.text).color() {
            Some(color) => format!("{DIM}{prefix}{RESET} {color}{}{RESET}", line.text),
            None => format!("{DIM}{prefix}{RESET} {}", line.text),
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Render one event. The caller flushes.
    pub fn render<W: Write>(&self, event: &ConsoleEvent, out: &mut W) -> io::Result<()> {
        match (self.format, event) {
            (OutputFormat::Json, ConsoleEvent::Line(line)) => {
                serde_json::to_writer(&mut *out, line)?;
                writeln!(out)?;
            }
            (OutputFormat::Json, _) => {}
            (OutputFormat::Text, ConsoleEvent::Opened { job_id, label }) => {
                let title = if label.is_empty() { job_id } else { label };
                writeln!(out, "Scraping {title}")?;
            }
            (OutputFormat::Text, ConsoleEvent::StatusChanged(JobStatus::Running)) => {
                writeln!(out, "{}", self.dim(status_text(JobStatus::Running)))?;
                writeln!(out, "{}", self.dim("Initializing connection..."))?;
            }
            (OutputFormat::Text, ConsoleEvent::StatusChanged(status)) => {
                writeln!(out, "{}", self.dim("── End of Log ──"))?;
                writeln!(out, "{}", status_text(*status))?;
            }
            (OutputFormat::Text, ConsoleEvent::Line(line)) => {
                writeln!(out, "{}", self.format_line(line))?;
            }
        }
        Ok(())
    }
}
