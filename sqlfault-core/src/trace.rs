//! Execution traces captured when a failure is raised.
//!
//! A [`CapturedTrace`] is raw diagnostic material: its frames may carry the
//! literal source text of the failing call and names derived from dynamic
//! SQL. It must pass through [`crate::sanitizer`] before leaving the process.

use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;

/// File name used for frames the backtrace could not resolve to a location.
pub const UNKNOWN_FILE: &str = "<unknown>";

/// Symbol prefixes of the capturing machinery itself, dropped from captures.
const CAPTURE_FRAME_PREFIXES: &[&str] = &[
    "std::backtrace::",
    "std::backtrace_rs::",
    "sqlfault_core::trace::CapturedTrace::capture",
];

/// One stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedFrame {
    /// Function or symbol name
    pub function: String,
    /// Source file path
    pub file: String,
    /// Line number, 0 when unknown
    pub line: u32,
    /// Literal source line, present only before sanitization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl CapturedFrame {
    /// Creates a frame without source text.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
            source_text: None,
        }
    }

    /// Builder method to attach the literal source line.
    pub fn with_source_text(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = Some(source_text.into());
        self
    }
}

/// Ordered frames, oldest call first. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapturedTrace {
    frames: Vec<CapturedFrame>,
}

impl CapturedTrace {
    /// Creates a trace from frames ordered oldest call first.
    pub const fn new(frames: Vec<CapturedFrame>) -> Self {
        Self { frames }
    }

    /// A trace with no frames.
    pub const fn empty() -> Self {
        Self { frames: Vec::new() }
    }

    /// Captures the calling thread's stack.
    ///
    /// Symbol resolution depends on the build's debug info; the result is
    /// empty when nothing can be resolved.
    ///
    /// Frames are recovered by parsing the `Display` rendering of
    /// [`Backtrace`], whose format the standard library does not guarantee.
    /// A toolchain that changes it yields fewer or coarser frames, never an
    /// error.
    pub fn capture() -> Self {
        let backtrace = Backtrace::force_capture();
        Self::from_backtrace_text(&backtrace.to_string())
    }

    /// Parses the standard library's backtrace rendering.
    ///
    /// The rendering lists the innermost frame first as `N: symbol` lines,
    /// each optionally followed by an `at file:line:column` line. The result
    /// is reversed to oldest-first, with the capture machinery removed.
    pub fn from_backtrace_text(text: &str) -> Self {
        let mut innermost_first: Vec<CapturedFrame> = Vec::new();

        for raw_line in text.lines() {
            let line = raw_line.trim_start();
            if let Some(location) = line.strip_prefix("at ") {
                if let Some(frame) = innermost_first.last_mut() {
                    if frame.file == UNKNOWN_FILE {
                        let (file, line_number) = parse_location(location);
                        frame.file = file;
                        frame.line = line_number;
                    }
                }
            } else if let Some((index, symbol)) = line.split_once(": ") {
                if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                    innermost_first.push(CapturedFrame::new(symbol.trim(), UNKNOWN_FILE, 0));
                }
            }
        }

        let machinery = innermost_first
            .iter()
            .take_while(|frame| {
                CAPTURE_FRAME_PREFIXES
                    .iter()
                    .any(|prefix| frame.function.starts_with(prefix))
            })
            .count();

        let frames = innermost_first.into_iter().skip(machinery).rev().collect();
        Self { frames }
    }

    /// Frames, oldest call first.
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the trace has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<CapturedFrame>> for CapturedTrace {
    fn from(frames: Vec<CapturedFrame>) -> Self {
        Self::new(frames)
    }
}

impl FromIterator<CapturedFrame> for CapturedTrace {
    fn from_iter<I: IntoIterator<Item = CapturedFrame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Splits `file:line:column` (or `file:line`) into file and line.
fn parse_location(location: &str) -> (String, u32) {
    let location = location.trim();
    let Some((head, last)) = location.rsplit_once(':') else {
        return (location.to_string(), 0);
    };

    if let Some((file, line)) = head.rsplit_once(':') {
        if let (Ok(line), Ok(_column)) = (line.parse::<u32>(), last.parse::<u32>()) {
            return (file.to_string(), line);
        }
    }

    match last.parse::<u32>() {
        Ok(line) => (head.to_string(), line),
        Err(_) => (location.to_string(), 0),
    }
}
