//! Rebuild `tests/golden/<case>/expected_report.json` from `input.bin`.
//!
//! Usage: `regenerate_golden [--check] [ROOT]`. `ROOT` defaults to
//! `tests/golden`. With `--check` nothing is written and the exit code is 1
//! when any report is out of date.
//!
//! A case without `expected_report.json` is a failure fixture: its input must
//! not decode, and it is left untouched.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::ExitCode;

use tagstream_core::{DecoderConfig, ReaderSource, decode_bytes, decode_source};

const INPUT_FILE: &str = "input.bin";
const REPORT_FILE: &str = "expected_report.json";

struct Options {
    root: PathBuf,
    check: bool,
}

struct GoldenCase {
    name: String,
    dir: PathBuf,
}

enum Outcome {
    Unchanged,
    Written,
    Stale,
    FailsAsExpected,
}

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("usage: regenerate_golden [--check] [ROOT]");
            return ExitCode::from(2);
        }
    };
    match run(&options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        root: PathBuf::from("tests").join("golden"),
        check: false,
    };
    let mut root_set = false;
    for arg in args {
        match arg.as_str() {
            "--check" => options.check = true,
            flag if flag.starts_with('-') => return Err(format!("unknown flag '{flag}'")),
            path if !root_set => {
                options.root = PathBuf::from(path);
                root_set = true;
            }
            extra => return Err(format!("unexpected argument '{extra}'")),
        }
    }
    Ok(options)
}

/// Returns `Ok(false)` when `--check` found stale reports.
fn run(options: &Options) -> Result<bool, String> {
    let cases = collect_cases(options)?;
    let (mut written, mut stale, mut unchanged) = (0, 0, 0);

    for case in &cases {
        match process_case(case, options.check)? {
            Outcome::Unchanged => unchanged += 1,
            Outcome::Written => {
                written += 1;
                println!("wrote   {}", case.name);
            }
            Outcome::Stale => {
                stale += 1;
                println!("stale   {}", case.name);
            }
            Outcome::FailsAsExpected => println!("failure {}", case.name),
        }
    }

    println!(
        "{} cases: {written} written, {stale} stale, {unchanged} unchanged",
        cases.len()
    );
    Ok(stale == 0)
}

fn collect_cases(options: &Options) -> Result<Vec<GoldenCase>, String> {
    let root = &options.root;
    let entries =
        fs::read_dir(root).map_err(|err| format!("cannot list {}: {err}", root.display()))?;

    let mut cases = Vec::new();
    for entry in entries {
        let dir = entry
            .map_err(|err| format!("cannot list {}: {err}", root.display()))?
            .path();
        if !dir.join(INPUT_FILE).is_file() {
            continue;
        }
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        cases.push(GoldenCase { name, dir });
    }
    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}

fn process_case(case: &GoldenCase, check: bool) -> Result<Outcome, String> {
    let input_path = case.dir.join(INPUT_FILE);
    let report_path = case.dir.join(REPORT_FILE);
    let bytes = fs::read(&input_path)
        .map_err(|err| format!("cannot read {}: {err}", input_path.display()))?;

    if !report_path.exists() {
        return match decode_bytes(&bytes) {
            Err(_) => Ok(Outcome::FailsAsExpected),
            Ok(records) => Err(format!(
                "{}: failure fixture decoded cleanly ({} records)",
                case.name,
                records.len()
            )),
        };
    }

    // Stored paths stay relative to the repository root on every platform.
    let label = format!("tests/golden/{}/{INPUT_FILE}", case.name);
    let source = ReaderSource::new(Cursor::new(bytes));
    let report = decode_source(&label, source, DecoderConfig::default())
        .map_err(|err| format!("{}: {err}", case.name))?;
    let json = serde_json::to_string(&report)
        .map_err(|err| format!("{}: JSON serialization failed: {err}", case.name))?;

    let current = fs::read_to_string(&report_path)
        .map_err(|err| format!("cannot read {}: {err}", report_path.display()))?;
    if current.trim_end() == json {
        return Ok(Outcome::Unchanged);
    }
    if check {
        return Ok(Outcome::Stale);
    }
    fs::write(&report_path, json)
        .map_err(|err| format!("cannot write {}: {err}", report_path.display()))?;
    Ok(Outcome::Written)
}
