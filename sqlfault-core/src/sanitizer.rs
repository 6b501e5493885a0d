//! Stack sanitization against a deny-list of secret literals.
//!
//! The sanitizer is a deny-list scrub, not a detector: callers hand it the
//! exact literals at risk (normally the verbatim query text) and it guarantees
//! that none of them survives, as a case-sensitive substring, in anything it
//! produces.
//!
//! # Security Guarantees
//! - Source text is dropped from every frame, never partially redacted
//! - Frame names containing a secret are replaced as a whole
//! - Every result is re-scanned before it is returned
//! - Secret literals are held in `Zeroizing` containers and never printed

use crate::trace::CapturedTrace;
use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

/// Default replacement for redacted fields and text.
pub const REDACTED_PLACEHOLDER: &str = "<redacted>";

/// Upper bound on replacement passes in [`scrub_text`].
pub const MAX_SCRUB_PASSES: usize = 8;

/// Sanitization failures. Messages never include secret text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// Replacement kept splicing new occurrences together
    #[error("secret literal still present after {passes} scrub passes")]
    ScrubIncomplete { passes: usize },

    /// A produced field still contains a secret literal
    #[error("sanitized output leaks a secret literal in {field}")]
    LeakDetected { field: String },
}

/// Literals that must never leave the process.
///
/// Empty strings are ignored (they would match everything) and duplicates are
/// stored once. The literals are zeroed in memory when the set is dropped.
///
/// # Example
/// ```rust
/// use sqlfault_core::SensitiveLiteralSet;
///
/// let secrets = SensitiveLiteralSet::from_query("SELECT * FROM users WHERE ssn = '123'");
/// assert!(secrets.leaks_into("failed: SELECT * FROM users WHERE ssn = '123'"));
/// assert!(!format!("{:?}", secrets).contains("ssn"));
/// ```
#[derive(Clone, Default)]
pub struct SensitiveLiteralSet {
    literals: Vec<Zeroizing<String>>,
}

impl SensitiveLiteralSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            literals: Vec::new(),
        }
    }

    /// Creates a set holding the query text of a failed statement.
    pub fn from_query(query: impl Into<String>) -> Self {
        Self::new().with_literal(query)
    }

    /// Adds a literal. Returns false if it was empty or already present.
    pub fn insert(&mut self, literal: impl Into<String>) -> bool {
        let literal = Zeroizing::new(literal.into());
        if literal.is_empty() || self.literals.iter().any(|known| **known == *literal) {
            return false;
        }
        self.literals.push(literal);
        true
    }

    /// Builder method to add a literal.
    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.insert(literal);
        self
    }

    /// Number of distinct non-empty literals.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns true if the set holds no literal.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Iterates over the literals.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.literals.iter().map(|literal| literal.as_str())
    }

    /// Returns true if any literal occurs in `text`.
    pub fn leaks_into(&self, text: &str) -> bool {
        self.iter().any(|literal| text.contains(literal))
    }

    /// Returns `placeholder`, or the empty string if the placeholder itself
    /// contains a literal.
    pub fn safe_placeholder<'a>(&self, placeholder: &'a str) -> &'a str {
        if self.leaks_into(placeholder) {
            ""
        } else {
            placeholder
        }
    }
}

impl std::fmt::Debug for SensitiveLiteralSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveLiteralSet")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<S: Into<String>> FromIterator<S> for SensitiveLiteralSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for literal in iter {
            set.insert(literal);
        }
        set
    }
}

/// One sanitized frame. There is no source text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedFrame {
    function: String,
    file: String,
    line: u32,
}

impl SanitizedFrame {
    /// Creates a frame from already-sanitized parts.
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Function name, or the placeholder if it contained a secret.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// File path, or the placeholder if it contained a secret.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line number.
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// A trace safe to export, oldest call first.
///
/// Serializes as `[{"function", "file", "line"}]`; `Display` renders a
/// traceback-style text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedTrace {
    frames: Vec<SanitizedFrame>,
}

impl SanitizedTrace {
    /// A trace with no frames.
    pub const fn empty() -> Self {
        Self { frames: Vec::new() }
    }

    /// Frames, oldest call first.
    pub fn frames(&self) -> &[SanitizedFrame] {
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

    /// Keeps only the `max_frames` innermost frames.
    pub fn keep_innermost(mut self, max_frames: usize) -> Self {
        let excess = self.frames.len().saturating_sub(max_frames);
        self.frames.drain(..excess);
        self
    }

    /// Checks that no produced string contains a secret.
    ///
    /// Only the `function` and `file` strings are scanned. Line numbers and
    /// the serialized structure (keys, quotes, separators) are not secret
    /// material, so a literal such as `"42"` may still appear next to
    /// `"line":42` in the JSON form.
    ///
    /// # Errors
    /// Returns [`SanitizeError::LeakDetected`] naming the first offending field.
    pub fn verify(&self, secrets: &SensitiveLiteralSet) -> Result<(), SanitizeError> {
        for (index, frame) in self.frames.iter().enumerate() {
            if secrets.leaks_into(&frame.function) {
                return Err(SanitizeError::LeakDetected {
                    field: format!("trace[{}].function", index),
                });
            }
            if secrets.leaks_into(&frame.file) {
                return Err(SanitizeError::LeakDetected {
                    field: format!("trace[{}].file", index),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<SanitizedFrame>> for SanitizedTrace {
    fn from(frames: Vec<SanitizedFrame>) -> Self {
        Self { frames }
    }
}

impl std::fmt::Display for SanitizedTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "Traceback (most recent call last):")?;
        for frame in &self.frames {
            writeln!(
                f,
                "  File \"{}\", line {}, in {}",
                frame.file, frame.line, frame.function
            )?;
        }
        Ok(())
    }
}

/// Turns a captured trace into a sanitized one.
///
/// Implementations must uphold the post-condition that no non-empty secret
/// occurs in any produced string.
pub trait TraceSanitizer {
    /// Sanitizes `trace` against `secrets`.
    ///
    /// # Errors
    /// Returns [`SanitizeError`] if the post-condition cannot be met.
    fn sanitize(
        &self,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
    ) -> Result<SanitizedTrace, SanitizeError>;
}

/// Exact-substring sanitizer that replaces secret-bearing fields as a whole.
#[derive(Debug, Clone)]
pub struct LiteralSanitizer {
    placeholder: String,
}

impl Default for LiteralSanitizer {
    fn default() -> Self {
        Self::new(REDACTED_PLACEHOLDER)
    }
}

impl LiteralSanitizer {
    /// Creates a sanitizer using `placeholder` for redacted fields.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    /// Placeholder used for redacted fields.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

impl TraceSanitizer for LiteralSanitizer {
    fn sanitize(
        &self,
        trace: &CapturedTrace,
        secrets: &SensitiveLiteralSet,
    ) -> Result<SanitizedTrace, SanitizeError> {
        let placeholder = secrets.safe_placeholder(&self.placeholder);
        let mut redacted_fields = 0_usize;
        let mut frames = Vec::with_capacity(trace.len());

        for frame in trace.frames() {
            let mut redact = |value: &str| {
                if secrets.leaks_into(value) {
                    redacted_fields = redacted_fields.saturating_add(1);
                    placeholder.to_string()
                } else {
                    value.to_string()
                }
            };
            let function = redact(&frame.function);
            let file = redact(&frame.file);
            frames.push(SanitizedFrame::new(function, file, frame.line));
        }

        let sanitized = SanitizedTrace { frames };
        if let Err(e) = sanitized.verify(secrets) {
            tracing::error!(error = %e, "trace sanitization post-condition violated");
            return Err(e);
        }

        if redacted_fields > 0 {
            tracing::debug!(
                frames = sanitized.len(),
                redacted_fields,
                "redacted secret-bearing frame fields"
            );
        }
        Ok(sanitized)
    }
}

/// Sanitizes a trace with the default [`LiteralSanitizer`].
///
/// # Errors
/// Returns [`SanitizeError`] if the post-condition cannot be met.
///
/// # Example
/// ```rust
/// use sqlfault_core::{CapturedFrame, CapturedTrace, SensitiveLiteralSet, sanitize};
///
/// let query = "SELECT * FROOOM TEST";
/// let trace = CapturedTrace::new(vec![
///     CapturedFrame::new("execute", "cursor.rs", 42).with_source_text(query),
/// ]);
/// let sanitized = sanitize(&trace, &SensitiveLiteralSet::from_query(query)).unwrap();
///
/// assert_eq!(sanitized.frames()[0].function(), "execute");
/// assert!(!sanitized.to_string().contains(query));
/// ```
pub fn sanitize(
    trace: &CapturedTrace,
    secrets: &SensitiveLiteralSet,
) -> Result<SanitizedTrace, SanitizeError> {
    LiteralSanitizer::default().sanitize(trace, secrets)
}

/// Replaces every occurrence of every secret in `text` with `placeholder`.
///
/// Overlapping and adjacent occurrences collapse into one placeholder. If a
/// replacement splices a new occurrence together, the scrub repeats, up to
/// [`MAX_SCRUB_PASSES`] passes. The full text is scrubbed; callers that bound
/// its length must truncate the result, never the input.
///
/// # Errors
/// Returns [`SanitizeError::ScrubIncomplete`] if a secret survives every pass.
pub fn scrub_text(
    text: &str,
    secrets: &SensitiveLiteralSet,
    placeholder: &str,
) -> Result<String, SanitizeError> {
    let placeholder = secrets.safe_placeholder(placeholder);
    let mut scrubbed = text.to_string();

    for _ in 0..MAX_SCRUB_PASSES {
        if !secrets.leaks_into(&scrubbed) {
            return Ok(scrubbed);
        }
        scrubbed = replace_occurrences(&scrubbed, secrets, placeholder);
    }

    if secrets.leaks_into(&scrubbed) {
        Err(SanitizeError::ScrubIncomplete {
            passes: MAX_SCRUB_PASSES,
        })
    } else {
        Ok(scrubbed)
    }
}

fn replace_occurrences(text: &str, secrets: &SensitiveLiteralSet, placeholder: &str) -> String {
    let mut matches: Vec<(usize, usize)> = secrets
        .iter()
        .flat_map(|secret| {
            text.match_indices(secret)
                .map(|(start, found)| (start, start.saturating_add(found.len())))
        })
        .collect();
    matches.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(matches.len());
    for (start, end) in matches {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in merged {
        output.push_str(&text[cursor..start]);
        output.push_str(placeholder);
        cursor = end;
    }
    output.push_str(&text[cursor..]);
    output
}
