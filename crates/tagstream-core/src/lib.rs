//! tagstream core library: a sequential decoder for tagged binary record
//! streams.
//!
//! A stream is a flat run of records, each one tag byte followed by a
//! big-endian payload whose size is fixed by the tag (`F T P L E S C Y`) or,
//! for `B` batches, by a leading vertex count. There is no file header and no
//! footer; end of file is end of stream.
//!
//! Byte sources feed the [`StreamDecoder`], which hands each fully read
//! payload to the record parsers (layout/reader/parser) and yields
//! [`Record`] values in stream order. All I/O stays in `source`; parsers are
//! pure.
//!
//! Invariants:
//! - Payload boundaries come from the tag (and the batch count) only.
//! - The decoder never backtracks and never mutates its source.
//! - A truncated payload aborts the pass without emitting a partial record.
//! - Bytes outside the tag set are skipped one at a time and counted.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use tagstream_core::decode_file;
//!
//! let report = decode_file(Path::new("scene.bin"))?;
//! for record in &report.records {
//!     println!("{record}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};

mod decoder;
pub mod records;
mod source;

pub use decoder::{DecodeError, DecodeStats, DecoderConfig, StreamDecoder, UnknownTagPolicy};
pub use records::{Batch, RawVertex, Record, Tag};
pub use source::{ByteSource, FileSource, ReaderSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Full result of one decode pass, in stream order.
///
/// # Examples
/// ```
/// use tagstream_core::make_stub_report;
///
/// let report = make_stub_report("scene.bin", 52);
/// assert_eq!(report.report_version, tagstream_core::REPORT_VERSION);
/// assert!(report.records.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Input stream metadata.
    pub input: InputInfo,
    /// Counters collected during the pass.
    pub summary: DecodeSummary,
    /// Decoded records in stream order.
    pub records: Vec<Record>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "tagstream").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input stream metadata embedded in reports.
///
/// # Examples
/// ```
/// use tagstream_core::InputInfo;
///
/// let input = InputInfo {
///     path: "scene.bin".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Pass counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeSummary {
    /// Records emitted.
    pub records_total: u64,
    /// Bytes skipped because they were not a known tag.
    pub unknown_tags: u64,
    /// Bytes consumed, tag bytes included.
    pub bytes_consumed: u64,
}

impl From<&DecodeStats> for DecodeSummary {
    fn from(stats: &DecodeStats) -> Self {
        Self {
            records_total: stats.records,
            unknown_tags: stats.unknown_tags,
            bytes_consumed: stats.bytes_consumed,
        }
    }
}

/// Build a report with base fields filled and no records.
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> DecodeReport {
    DecodeReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "tagstream".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        summary: DecodeSummary::default(),
        records: vec![],
    }
}

/// Decode a whole file into a report.
///
/// The file is opened for this pass only and closed before returning,
/// whether decoding succeeds or fails.
pub fn decode_file(path: &Path) -> Result<DecodeReport, DecodeError> {
    decode_file_with_config(path, DecoderConfig::default())
}

pub fn decode_file_with_config(
    path: &Path,
    config: DecoderConfig,
) -> Result<DecodeReport, DecodeError> {
    let source = FileSource::open(path)?;
    decode_source(&path.display().to_string(), source, config)
}

/// Drain `source` into a report labelled `input_path`.
///
/// The source need not be a file. A completed pass reads it to the end, so
/// `input.bytes` is the number of bytes consumed.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use tagstream_core::{DecoderConfig, ReaderSource, decode_source};
///
/// let source = ReaderSource::new(Cursor::new(vec![b'T', 1, 0x00]));
/// let report = decode_source("<memory>", source, DecoderConfig::default())?;
/// assert_eq!(report.input.bytes, 3);
/// assert_eq!(report.summary.unknown_tags, 1);
/// # Ok::<(), tagstream_core::DecodeError>(())
/// ```
pub fn decode_source<S: ByteSource>(
    input_path: &str,
    source: S,
    config: DecoderConfig,
) -> Result<DecodeReport, DecodeError> {
    let mut decoder = StreamDecoder::with_config(source, config);
    let records = decoder.by_ref().collect::<Result<Vec<_>, _>>()?;

    let stats = decoder.stats();
    let mut report = make_stub_report(input_path, stats.bytes_consumed);
    report.summary = DecodeSummary::from(stats);
    report.records = records;
    Ok(report)
}

/// Decode an in-memory stream.
///
/// # Examples
/// ```
/// use tagstream_core::{Record, decode_bytes};
///
/// let records = decode_bytes(&[b'T', 7, b'T', 8])?;
/// assert_eq!(records, vec![Record::T { value: 7 }, Record::T { value: 8 }]);
/// assert!(decode_bytes(&[])?.is_empty());
/// # Ok::<(), tagstream_core::DecodeError>(())
/// ```
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<Record>, DecodeError> {
    StreamDecoder::new(ReaderSource::new(Cursor::new(bytes))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_records_with_tags() {
        let mut report = make_stub_report("scene.bin", 2);
        report.records.push(Record::T { value: 1 });
        report.summary.records_total = 1;

        let value = serde_json::to_value(&report).expect("report json");
        assert_eq!(value["tool"]["name"], "tagstream");
        assert_eq!(value["summary"]["records_total"], 1);
        assert_eq!(value["records"][0]["tag"], "T");
    }

    #[test]
    fn report_round_trips_batch_records() {
        let mut report = make_stub_report("scene.bin", 52);
        report.records.push(Record::B(Batch {
            count: 3,
            header: [1.0; 6],
            vertices: vec![RawVertex([0x3f, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])],
            trailer: [2.0; 6],
            tail: -3,
        }));

        let json = serde_json::to_string(&report).expect("serialize");
        let parsed: DecodeReport = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.records, report.records);
    }

    #[test]
    fn report_round_trips_non_finite_floats() {
        let mut bytes = vec![b'F'];
        for value in [f32::NAN, 1.0, f32::INFINITY] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        let mut report = make_stub_report("scene.bin", bytes.len() as u64);
        report.records = decode_bytes(&bytes).expect("decode");
        report.records.push(Record::L {
            values: [f32::NEG_INFINITY, 0.0, 0.0, 0.0, 0.0, f32::NAN],
            tail: 2,
        });

        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains(r#""values":["NaN",1.0,"inf"]"#));

        let parsed: DecodeReport = serde_json::from_str(&json).expect("parse");
        let Record::F { values } = parsed.records[0] else {
            panic!("expected F record, got {:?}", parsed.records[0]);
        };
        assert!(values[0].is_nan());
        assert_eq!(values[1..], [1.0, f32::INFINITY]);
        let Record::L { values, tail } = parsed.records[1] else {
            panic!("expected L record, got {:?}", parsed.records[1]);
        };
        assert_eq!(values[0], f32::NEG_INFINITY);
        assert!(values[5].is_nan());
        assert_eq!(tail, 2);
    }

    #[test]
    fn decode_source_accepts_in_memory_reader() {
        let source = ReaderSource::new(Cursor::new(vec![b'T', 4, b'x', b'T', 5]));
        let report =
            decode_source("<memory>", source, DecoderConfig::default()).expect("decode source");
        assert_eq!(report.input.path, "<memory>");
        assert_eq!(report.input.bytes, 5);
        assert_eq!(report.summary.records_total, 2);
        assert_eq!(report.summary.unknown_tags, 1);
        assert_eq!(
            report.records,
            vec![Record::T { value: 4 }, Record::T { value: 5 }]
        );
    }

    #[test]
    fn decode_bytes_rejects_truncated_tail() {
        let err = decode_bytes(&[b'T', 1, b'L', 0]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { tag: Tag::L, .. }));
    }

    #[test]
    fn summary_from_stats_copies_counters() {
        let stats = DecodeStats {
            records: 3,
            unknown_tags: 1,
            bytes_consumed: 40,
        };
        let summary = DecodeSummary::from(&stats);
        assert_eq!(summary.records_total, 3);
        assert_eq!(summary.unknown_tags, 1);
        assert_eq!(summary.bytes_consumed, 40);
    }
}
