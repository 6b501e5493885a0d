//! Property tests for classification stability and scrub soundness.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use sqlfault_core::taxonomy::codes::ER_MALFORMED_CONDITION;
use sqlfault_core::{
    CapturedFrame, CapturedTrace, ErrorKind, ErrorRecord, ExceptionReporter, RawCondition,
    ReporterConfig, SanitizeError, SanitizedTrace, SensitiveLiteralSet, TraceSanitizer, classify,
    classify_json, sanitize, scrub_text,
};
use std::collections::BTreeMap;

/// Sanitizer that always reports a post-condition violation.
struct BrokenSanitizer;

impl TraceSanitizer for BrokenSanitizer {
    fn sanitize(
        &self,
        _trace: &CapturedTrace,
        _secrets: &SensitiveLiteralSet,
    ) -> Result<SanitizedTrace, SanitizeError> {
        Err(SanitizeError::LeakDetected {
            field: "trace[0].function".to_string(),
        })
    }
}

/// Query-shaped secrets; nothing in the event structure can spell them.
fn query_literal() -> impl Strategy<Value = String> {
    "SELECT [A-Z0-9_ ]{1,24}"
}

/// Secrets drawn from an alphabet the JSON structure of a trace never uses.
fn upper_literal() -> impl Strategy<Value = String> {
    "[A-Z][A-Z ]{0,11}"
}

/// Frame parts, with an index choosing which secret (if any) to embed.
fn frame_parts() -> impl Strategy<Value = (String, String, u32, Option<String>, Option<usize>)> {
    (
        ".{0,16}",
        ".{0,16}",
        any::<u32>(),
        proptest::option::of(".{0,32}"),
        proptest::option::of(0_usize..8),
    )
}

fn build_trace(
    parts: &[(String, String, u32, Option<String>, Option<usize>)],
    secrets: &[String],
) -> CapturedTrace {
    parts
        .iter()
        .map(|(prefix, suffix, line, source, pick)| {
            let embedded = match (pick, secrets.is_empty()) {
                (Some(index), false) => secrets[index % secrets.len()].as_str(),
                _ => "",
            };
            let mut frame = CapturedFrame::new(
                format!("{}{}{}", prefix, embedded, suffix),
                format!("{}{}.rs", suffix, embedded),
                *line,
            );
            if let Some(source) = source {
                frame = frame.with_source_text(format!("{}{}", source, embedded));
            }
            frame
        })
        .collect()
}

proptest! {
    #[test]
    fn classification_is_stable(code in any::<i64>(), message in ".{0,64}") {
        let first = classify(&RawCondition::new(code, message.clone()));
        let second = classify(&RawCondition::new(code, message));
        prop_assert_eq!(first.code(), second.code());
        prop_assert_eq!(first.kind(), second.kind());
    }

    #[test]
    fn classification_is_total(
        code in proptest::option::of(any::<i64>()),
        message in proptest::option::of(".{0,64}")
    ) {
        let record = classify(&RawCondition {
            fault_code: code,
            message: message.clone(),
            context: BTreeMap::new(),
        });

        match (code.and_then(|c| u32::try_from(c).ok()), message) {
            (Some(code), Some(message)) => {
                prop_assert_eq!(record.code(), code);
                prop_assert_eq!(record.message(), message.as_str());
            }
            _ => {
                prop_assert_eq!(record.kind(), ErrorKind::InternalError);
                prop_assert_eq!(record.code(), ER_MALFORMED_CONDITION);
            }
        }
    }

    #[test]
    fn classify_json_accepts_any_input(input in ".{0,128}") {
        let record = classify_json(&input);
        prop_assert!(record.code() == ER_MALFORMED_CONDITION || serde_json::from_str::<serde_json::Value>(&input).is_ok());
    }

    #[test]
    fn scrub_sanitized_trace_contains_no_secret(
        parts in proptest::collection::vec(frame_parts(), 0..8),
        literals in proptest::collection::vec(upper_literal(), 0..4)
    ) {
        let secrets: SensitiveLiteralSet = literals.iter().cloned().collect();
        let trace = build_trace(&parts, &literals);

        let sanitized = sanitize(&trace, &secrets).unwrap();
        prop_assert_eq!(sanitized.len(), trace.len());
        for frame in sanitized.frames() {
            prop_assert!(!secrets.leaks_into(frame.function()));
            prop_assert!(!secrets.leaks_into(frame.file()));
        }

        let json = serde_json::to_string(&sanitized).unwrap();
        prop_assert!(!secrets.leaks_into(&json));
        prop_assert!(!json.contains("sourceText"));
    }

    #[test]
    fn scrub_is_deterministic(
        parts in proptest::collection::vec(frame_parts(), 0..6),
        literals in proptest::collection::vec(upper_literal(), 0..3)
    ) {
        let secrets: SensitiveLiteralSet = literals.iter().cloned().collect();
        let trace = build_trace(&parts, &literals);
        prop_assert_eq!(sanitize(&trace, &secrets).unwrap(), sanitize(&trace, &secrets).unwrap());
    }

    #[test]
    fn scrub_text_removes_every_literal(
        text in ".{0,64}",
        literals in proptest::collection::vec(".{1,6}", 0..4),
        placeholder in ".{0,8}"
    ) {
        let secrets: SensitiveLiteralSet = literals.iter().cloned().collect();
        let seeded = literals.iter().fold(text, |acc, literal| format!("{}{}{}", literal, acc, literal));

        match scrub_text(&seeded, &secrets, &placeholder) {
            Ok(scrubbed) => prop_assert!(!secrets.leaks_into(&scrubbed)),
            Err(e) => {
                let is_scrub_incomplete = matches!(e, SanitizeError::ScrubIncomplete { .. });
                prop_assert!(is_scrub_incomplete);
            }
        }
    }

    #[test]
    fn scrub_reason_never_contains_query(
        prefix in ".{0,40}",
        suffix in ".{0,40}",
        query in query_literal(),
        max_bytes in 1_usize..128
    ) {
        let secrets = SensitiveLiteralSet::from_query(query.clone());
        let reporter = ExceptionReporter::new(
            ReporterConfig::default().with_reason_max_bytes(max_bytes),
        )
        .unwrap();
        let error = ErrorRecord::new(
            ErrorKind::Programming,
            1003,
            format!("{}{}{}", prefix, query, suffix),
        )
        .with_context("statement", query.clone());
        let trace = CapturedTrace::new(vec![
            CapturedFrame::new("execute", "cursor.rs", 1).with_source_text(query.clone()),
        ]);

        let event = reporter.build_event(&error, &trace, &secrets);
        prop_assert!(!event.reason().contains(query.as_str()));
        prop_assert!(event.reason().len() <= max_bytes);
        prop_assert!(!event.to_json().unwrap().contains(query.as_str()));
    }

    #[test]
    fn scrub_failure_withholds_event(
        code in any::<u32>(),
        message in ".{0,64}",
        query in query_literal(),
        max_bytes in 1_usize..64
    ) {
        let reporter = ExceptionReporter::with_sanitizer(
            ReporterConfig::default().with_reason_max_bytes(max_bytes),
            BrokenSanitizer,
        )
        .unwrap();
        let error = ErrorRecord::new(ErrorKind::Database, code, message).with_sql_state("XX000");
        let trace = CapturedTrace::new(vec![CapturedFrame::new(query.clone(), "a.rs", 1)]);

        let event = reporter.build_event(&error, &trace, &SensitiveLiteralSet::from_query(query));
        prop_assert!(event.is_withheld());
        prop_assert!(event.reason().len() <= max_bytes);
        prop_assert!("<error details withheld>".starts_with(event.reason()));
        prop_assert!(event.trace().is_empty());
        prop_assert_eq!(event.sql_state(), None);
        prop_assert_eq!(event.code(), code);
    }
}
