use std::fs;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use tagstream_core::{DecodeError, DecoderConfig, FileSource, StreamDecoder, UnknownTagPolicy};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "tagstream")]
#[command(version)]
#[command(
    about = "Decode a tagged binary record stream and print one line per record.",
    long_about = None,
    after_help = "Examples:\n  tagstream scene.bin\n  tagstream scene.bin --json --pretty\n  tagstream 'exports/*.bin' --warn-unknown-tags"
)]
struct Cli {
    /// Path to the binary record stream (a glob must match exactly one file)
    input: PathBuf,

    /// Print a JSON report instead of text lines
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Log a warning for every byte that is not a known tag
    #[arg(long)]
    warn_unknown_tags: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress the summary line on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cmd_decode(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<DecodeError> for CliError {
    fn from(err: DecodeError) -> Self {
        let hint = match &err {
            DecodeError::Truncated { .. } => {
                Some("the input ends inside a record; it may be cut short".to_string())
            }
            _ => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

fn cmd_decode(cli: Cli) -> Result<(), CliError> {
    let input = resolve_input_path(&cli.input)?;
    validate_input_file(&input)?;

    let config = DecoderConfig {
        unknown_tags: if cli.warn_unknown_tags {
            UnknownTagPolicy::Warn
        } else {
            UnknownTagPolicy::Ignore
        },
    };
    tracing::info!(input = %input.display(), "decoding");

    if cli.json {
        let report = tagstream_core::decode_file_with_config(&input, config)?;
        let json = serialize_report(&report, cli.pretty)?;
        println!("{}", json);
        if !cli.quiet {
            eprintln!("OK: {} records decoded", report.summary.records_total);
        }
        return Ok(());
    }

    let source = FileSource::open(&input).map_err(DecodeError::from)?;
    let mut decoder = StreamDecoder::with_config(source, config);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = print_records(&mut decoder, &mut out);
    // Records decoded before a failure are still shown.
    out.flush().context("Failed to write to stdout")?;
    result?;

    if !cli.quiet {
        let stats = decoder.stats();
        eprintln!(
            "OK: {} records decoded ({} bytes, {} unknown tag bytes skipped)",
            stats.records, stats.bytes_consumed, stats.unknown_tags
        );
    }
    Ok(())
}

fn print_records<W: Write>(
    decoder: &mut StreamDecoder<FileSource>,
    out: &mut W,
) -> Result<(), CliError> {
    for record in decoder.by_ref() {
        let record = record?;
        writeln!(out, "{}", record).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn serialize_report(
    report: &tagstream_core::DecodeReport,
    pretty: bool,
) -> Result<String, CliError> {
    if pretty {
        serde_json::to_string_pretty(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass the path to a binary record stream".to_string()),
        ));
    }
    let meta = fs::metadata(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass the path to a binary record stream".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    // An existing file wins over glob syntax, e.g. `scene[1].bin`.
    if input.is_file() {
        return Ok(input.clone());
    }
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single stream file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
