//! Fault classification and telemetry sanitization tool.
//!
//! This binary exposes the `sqlfault-core` pipeline to operators and to
//! driver test suites: it classifies raw fault conditions, builds sanitized
//! telemetry events from a fault plus a captured trace, and prints the
//! fault-code table.
//!
//! # Security Guarantees
//! - Query text passed with `--query` never appears in emitted events
//! - Source lines from trace files are never printed
//! - Logs go to stderr and carry codes and counts only

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sqlfault_core::taxonomy::FAULT_RANGES;
use sqlfault_core::{
    CapturedTrace, DriverInfo, ErrorKind, ExceptionReporter, JsonLinesSink, ReporterConfig,
    SensitiveLiteralSet, TelemetrySink, classify_json, init_logging,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "sqlfault")]
#[command(about = "Database fault classification and telemetry sanitization")]
#[command(version)]
#[command(long_about = "
sqlfault - Classify database faults and build query-free telemetry

Input conditions are JSON objects of the form
  {\"faultCode\": 1003, \"message\": \"...\", \"context\": {\"sqlState\": \"42000\"}}
read from a file or from stdin.

SECURITY FEATURES:
- Query text and extra literals are scrubbed from every event field
- Source lines of captured frames are never exported
- Events that fail sanitization are withheld, not emitted

EXAMPLES:
  sqlfault classify fault.json
  SQLFAULT_QUERY='SELECT * FROM t' sqlfault report fault.json --trace trace.json
  sqlfault codes --json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub reporter: ReporterArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify a raw fault condition into an error record
    Classify(ClassifyArgs),
    /// Build a sanitized telemetry event for a fault
    Report(ReportArgs),
    /// List the fault-code table
    Codes(CodesArgs),
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Condition file (reads stdin when omitted)
    #[arg(help = "JSON fault condition file; stdin if omitted")]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Condition file (reads stdin when omitted)
    #[arg(help = "JSON fault condition file; stdin if omitted")]
    pub input: Option<PathBuf>,

    /// Query text to scrub
    #[arg(
        long,
        env = "SQLFAULT_QUERY",
        hide_env_values = true,
        help = "Query text that must not appear in the event"
    )]
    pub query: Option<String>,

    /// File holding the query text
    #[arg(long, conflicts_with = "query", help = "Read the query text from a file")]
    pub query_file: Option<PathBuf>,

    /// Additional literals to scrub
    #[arg(
        long = "literal",
        help = "Additional sensitive literal, e.g. a bound parameter (repeatable)"
    )]
    pub literals: Vec<String>,

    /// Captured trace file
    #[arg(long, help = "JSON array of captured frames, oldest first")]
    pub trace: Option<PathBuf>,
}

#[derive(Args)]
pub struct CodesArgs {
    /// Emit JSON instead of a table
    #[arg(long, help = "Print the fault-code table as JSON")]
    pub json: bool,
}

#[derive(Args)]
pub struct ReporterArgs {
    /// Reporter configuration file
    #[arg(long, global = true, help = "JSON reporter configuration file")]
    pub config: Option<PathBuf>,

    /// Maximum reason size
    #[arg(
        long,
        global = true,
        help = "Maximum size of the event reason in bytes (overrides --config)"
    )]
    pub reason_max_bytes: Option<usize>,

    /// Maximum number of frames
    #[arg(
        long,
        global = true,
        help = "Maximum number of trace frames kept (overrides --config)"
    )]
    pub max_frames: Option<usize>,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all logs except errors")]
    pub quiet: bool,
}

/// One row of `codes --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CodeRangeRow {
    start: u32,
    end: u32,
    kind: ErrorKind,
    description: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Command::Classify(args) => classify_condition(args),
        Command::Report(args) => report_condition(args, &cli.reporter),
        Command::Codes(args) => list_codes(args),
    }
}

/// Reads a whole file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

/// Loads the reporter configuration and applies CLI overrides.
fn load_config(args: &ReporterArgs) -> Result<ReporterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<ReporterConfig>(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ReporterConfig::default(),
    };

    if let Some(reason_max_bytes) = args.reason_max_bytes {
        config = config.with_reason_max_bytes(reason_max_bytes);
    }
    if let Some(max_frames) = args.max_frames {
        config = config.with_max_frames(max_frames);
    }
    if config.driver.is_none() {
        config = config.with_driver(DriverInfo::new("sqlfault", env!("CARGO_PKG_VERSION")));
    }

    config.validate()?;
    Ok(config)
}

/// Collects the query and extra literals into a secret set.
fn load_secrets(args: &ReportArgs) -> Result<SensitiveLiteralSet> {
    let mut secrets: SensitiveLiteralSet = args.literals.iter().cloned().collect();

    let query = match (&args.query, &args.query_file) {
        (Some(query), _) => Some(query.clone()),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read query file {}", path.display()))?;
            Some(raw.trim_end_matches(['\r', '\n']).to_string())
        }
        (None, None) => None,
    };
    if let Some(query) = query {
        secrets.insert(query);
    }

    debug!(literals = secrets.len(), "Loaded sensitive literals");
    Ok(secrets)
}

/// Classifies a condition and prints the record as JSON.
fn classify_condition(args: &ClassifyArgs) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let record = classify_json(&input);
    info!(code = record.code(), kind = %record.kind(), "Classified fault condition");

    let json = serde_json::to_string_pretty(&record).context("Failed to serialize record")?;
    println!("{}", json);
    Ok(())
}

/// Builds a sanitized event for a condition and writes it to stdout.
fn report_condition(args: &ReportArgs, reporter_args: &ReporterArgs) -> Result<()> {
    let reporter = ExceptionReporter::new(load_config(reporter_args)?)?;
    let secrets = load_secrets(args)?;
    let record = classify_json(&read_input(args.input.as_deref())?);

    let trace = match &args.trace {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read trace {}", path.display()))?;
            serde_json::from_str::<CapturedTrace>(&raw)
                .with_context(|| format!("Invalid trace {}", path.display()))?
        }
        None => CapturedTrace::empty(),
    };
    info!(
        code = record.code(),
        kind = %record.kind(),
        frames = trace.len(),
        "Building telemetry event"
    );

    let mut sink = JsonLinesSink::new(std::io::stdout().lock());
    reporter.report(&record, &trace, &secrets, &mut sink)?;
    sink.flush()?;
    Ok(())
}

/// Prints the fault-code table.
fn list_codes(args: &CodesArgs) -> Result<()> {
    if args.json {
        let rows: Vec<CodeRangeRow> = FAULT_RANGES
            .iter()
            .map(|range| CodeRangeRow {
                start: range.start,
                end: range.end,
                kind: range.kind,
                description: range.description,
            })
            .collect();
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialize codes")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Fault code ranges:");
    for range in FAULT_RANGES {
        println!(
            "  {:>6}-{:<6}  {:<13} {}",
            range.start, range.end, range.kind, range.description
        );
    }
    println!();
    println!("Codes outside every range classify as {}.", ErrorKind::InternalError);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_and_default_driver_is_set() {
        let args = ReporterArgs {
            config: None,
            reason_max_bytes: Some(64),
            max_frames: Some(4),
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.reason_max_bytes, 64);
        assert_eq!(config.max_frames, 4);
        assert_eq!(config.driver.unwrap().name, "sqlfault");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = ReporterArgs {
            config: None,
            reason_max_bytes: Some(0),
            max_frames: None,
        };
        assert!(load_config(&args).is_err());
    }
}
