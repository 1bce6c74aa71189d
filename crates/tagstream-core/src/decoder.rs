use thiserror::Error;

use crate::records::error::RecordError;
use crate::records::layout;
use crate::records::parser::{parse_batch, parse_fixed};
use crate::records::{Batch, Record, Tag};
use crate::source::{ByteSource, SourceError};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "truncated {tag} record: {field} at offset {offset} needs {needed} bytes, only {available} available"
    )]
    Truncated {
        tag: Tag,
        field: &'static str,
        offset: u64,
        needed: usize,
        available: usize,
    },
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

/// What to do with a byte that is not a known tag.
///
/// Either way the byte is skipped as a tag with an empty payload and
/// counted in [`DecodeStats::unknown_tags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTagPolicy {
    #[default]
    Ignore,
    Warn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    pub unknown_tags: UnknownTagPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub records: u64,
    pub unknown_tags: u64,
    pub bytes_consumed: u64,
}

/// Forward-only decoder over a [`ByteSource`].
///
/// Records come out one at a time in stream order, either through
/// [`StreamDecoder::decode_next`] or the `Iterator` impl. A truncated payload
/// ends the pass; no partial record is returned for it.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use tagstream_core::{ReaderSource, Record, StreamDecoder};
///
/// let mut bytes = vec![b'F'];
/// for v in [1.0f32, 2.0, 3.0] {
///     bytes.extend_from_slice(&v.to_be_bytes());
/// }
/// let mut decoder = StreamDecoder::new(ReaderSource::new(Cursor::new(bytes)));
/// assert_eq!(
///     decoder.decode_next()?,
///     Some(Record::F { values: [1.0, 2.0, 3.0] })
/// );
/// assert_eq!(decoder.decode_next()?, None);
/// # Ok::<(), tagstream_core::DecodeError>(())
/// ```
pub struct StreamDecoder<S> {
    source: S,
    config: DecoderConfig,
    stats: DecodeStats,
    buf: Vec<u8>,
    done: bool,
}

impl<S: ByteSource> StreamDecoder<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    pub fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            source,
            config,
            stats: DecodeStats::default(),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.stats.bytes_consumed
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Decode the next record, `Ok(None)` on a clean end of stream.
    pub fn decode_next(&mut self) -> Result<Option<Record>, DecodeError> {
        loop {
            let tag_offset = self.offset();
            let mut tag_byte = [0u8; layout::TAG_LEN];
            let read = self.source.read_into(&mut tag_byte)?;
            if read == 0 {
                tracing::debug!(
                    records = self.stats.records,
                    unknown_tags = self.stats.unknown_tags,
                    bytes = self.stats.bytes_consumed,
                    "end of stream"
                );
                return Ok(None);
            }
            self.stats.bytes_consumed += read as u64;

            let Some(tag) = Tag::from_byte(tag_byte[0]) else {
                self.stats.unknown_tags += 1;
                match self.config.unknown_tags {
                    UnknownTagPolicy::Ignore => tracing::debug!(
                        offset = tag_offset,
                        byte = tag_byte[0],
                        "skipping unknown tag"
                    ),
                    UnknownTagPolicy::Warn => tracing::warn!(
                        "unknown tag 0x{:02x} at offset {}, skipped",
                        tag_byte[0],
                        tag_offset
                    ),
                }
                continue;
            };

            let record = match tag.payload_len() {
                Some(len) => {
                    self.buf.clear();
                    self.fill(tag, "payload", len)?;
                    parse_fixed(tag, &self.buf)?
                }
                None => Record::B(self.read_batch()?),
            };
            self.stats.records += 1;
            tracing::trace!(offset = tag_offset, tag = %tag, "decoded record");
            return Ok(Some(record));
        }
    }

    fn read_batch(&mut self) -> Result<Batch, DecodeError> {
        self.buf.clear();
        self.fill(Tag::B, "count", layout::BATCH_COUNT_LEN)?;
        let count = self.buf[0];
        self.fill(Tag::B, "header", layout::BATCH_HEADER_LEN)?;
        self.fill(Tag::B, "vertices", layout::batch_vertex_bytes(count))?;
        self.fill(Tag::B, "trailer", layout::BATCH_TRAILER_LEN)?;
        Ok(parse_batch(&self.buf)?)
    }

    /// Append exactly `len` bytes from the source to the payload buffer.
    fn fill(&mut self, tag: Tag, field: &'static str, len: usize) -> Result<(), DecodeError> {
        let offset = self.offset();
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        let read = self.source.read_into(&mut self.buf[start..])?;
        self.stats.bytes_consumed += read as u64;
        if read < len {
            self.buf.truncate(start + read);
            return Err(DecodeError::Truncated {
                tag,
                field,
                offset,
                needed: len,
                available: read,
            });
        }
        Ok(())
    }
}

impl<S: ByteSource> Iterator for StreamDecoder<S> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decode_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: ByteSource> std::iter::FusedIterator for StreamDecoder<S> {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{DecodeError, DecoderConfig, StreamDecoder, UnknownTagPolicy};
    use crate::records::{Record, Tag, layout};
    use crate::source::ReaderSource;

    fn decoder(bytes: Vec<u8>) -> StreamDecoder<ReaderSource<Cursor<Vec<u8>>>> {
        StreamDecoder::new(ReaderSource::new(Cursor::new(bytes)))
    }

    fn be_floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    fn fixed_record(tag: u8, floats: usize, tail: Option<i16>) -> Vec<u8> {
        let values: Vec<f32> = (0..floats).map(|v| v as f32 + 0.5).collect();
        let mut bytes = vec![tag];
        bytes.extend(be_floats(&values));
        if let Some(tail) = tail {
            bytes.extend_from_slice(&tail.to_be_bytes());
        }
        bytes
    }

    fn batch_record(count: u8) -> Vec<u8> {
        let mut bytes = vec![b'B', count];
        bytes.extend(be_floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        for i in 0..layout::batch_extra_vertices(count) {
            let base = i as f32 * 3.0;
            bytes.extend(be_floats(&[base, base + 1.0, base + 2.0]));
        }
        bytes.extend(be_floats(&[-1.0; 6]));
        bytes.extend_from_slice(&42i16.to_be_bytes());
        bytes
    }

    fn every_fixed_record() -> Vec<Vec<u8>> {
        vec![
            fixed_record(b'F', 3, None),
            vec![b'T', 200],
            fixed_record(b'P', 3, None),
            fixed_record(b'L', 6, Some(-7)),
            fixed_record(b'E', 8, Some(1)),
            fixed_record(b'S', 9, Some(i16::MAX)),
            fixed_record(b'C', 8, Some(i16::MIN)),
            fixed_record(b'Y', 8, Some(0)),
        ]
    }

    #[test]
    fn empty_stream_ends_cleanly() {
        let mut decoder = decoder(Vec::new());
        assert!(decoder.decode_next().unwrap().is_none());
        assert_eq!(decoder.stats().records, 0);
    }

    #[test]
    fn f_record_end_to_end() {
        let mut bytes = vec![b'F'];
        bytes.extend(be_floats(&[1.0, 2.0, 3.0]));
        let records: Vec<Record> = decoder(bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            records,
            vec![Record::F {
                values: [1.0, 2.0, 3.0]
            }]
        );
    }

    #[test]
    fn fixed_records_consume_tag_plus_payload() {
        for bytes in every_fixed_record() {
            let len = bytes.len() as u64;
            let tag = Tag::from_byte(bytes[0]).unwrap();
            let mut decoder = decoder(bytes);
            let record = decoder.decode_next().unwrap().unwrap();
            assert_eq!(record.tag(), tag);
            assert_eq!(decoder.offset(), len);
            assert_eq!(len, 1 + tag.payload_len().unwrap() as u64);
            assert!(decoder.decode_next().unwrap().is_none());
        }
    }

    #[test]
    fn fixed_record_fields_are_big_endian() {
        let mut bytes = vec![b'L'];
        bytes.extend(be_floats(&[0.1, -0.2, 3e10, 4.0, 5.0, 6.0]));
        bytes.extend_from_slice(&[0x80, 0x01]);
        let record = decoder(bytes).decode_next().unwrap().unwrap();
        assert_eq!(
            record,
            Record::L {
                values: [0.1, -0.2, 3e10, 4.0, 5.0, 6.0],
                tail: i16::from_be_bytes([0x80, 0x01])
            }
        );
    }

    #[test]
    fn batch_with_four_vertices_consumes_76_bytes() {
        let bytes = batch_record(4);
        assert_eq!(bytes.len(), 76);
        let mut decoder = decoder(bytes);
        let record = decoder.decode_next().unwrap().unwrap();
        let Record::B(batch) = record else {
            panic!("expected batch record");
        };
        assert_eq!(batch.count, 4);
        assert_eq!(batch.vertices.len(), 2);
        assert_eq!(batch.vertices[1].decode(), [3.0, 4.0, 5.0]);
        assert_eq!(batch.trailer, [-1.0; 6]);
        assert_eq!(batch.tail, 42);
        assert_eq!(decoder.offset(), 76);
    }

    #[test]
    fn batch_with_two_vertices_has_empty_vertex_block() {
        let bytes = batch_record(2);
        assert_eq!(bytes.len(), 52);
        let mut decoder = decoder(bytes);
        let Some(Record::B(batch)) = decoder.decode_next().unwrap() else {
            panic!("expected batch record");
        };
        assert!(batch.vertices.is_empty());
        assert_eq!(decoder.offset(), 52);
    }

    #[test]
    fn batch_count_below_two_clamps_to_zero_vertices() {
        for count in [0u8, 1] {
            let mut bytes = batch_record(count);
            assert_eq!(bytes.len(), 52);
            bytes.extend(vec![b'T', 5]);
            let records: Vec<Record> = decoder(bytes).collect::<Result<_, _>>().unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[1], Record::T { value: 5 });
        }
    }

    #[test]
    fn concatenated_records_decode_in_order() {
        let mut parts = every_fixed_record();
        parts.insert(3, batch_record(5));
        parts.push(batch_record(0));
        let expected_tags: Vec<u8> = parts.iter().map(|p| p[0]).collect();
        let bytes: Vec<u8> = parts.concat();
        let total = bytes.len() as u64;

        let mut decoder = decoder(bytes);
        let records: Vec<Record> = decoder.by_ref().collect::<Result<_, _>>().unwrap();
        let tags: Vec<u8> = records.iter().map(|r| r.tag().as_byte()).collect();
        assert_eq!(tags, expected_tags);
        assert_eq!(decoder.stats().records, expected_tags.len() as u64);
        assert_eq!(decoder.stats().bytes_consumed, total);
        let encoded: usize = records.iter().map(Record::encoded_len).sum();
        assert_eq!(encoded as u64, total);
    }

    #[test]
    fn dropping_last_byte_truncates_every_record_kind() {
        let mut parts = every_fixed_record();
        parts.push(batch_record(4));
        parts.push(batch_record(1));
        for mut bytes in parts {
            bytes.pop();
            let mut decoder = decoder(bytes);
            let results: Vec<_> = decoder.by_ref().collect();
            assert_eq!(results.len(), 1);
            assert!(matches!(results[0], Err(DecodeError::Truncated { .. })));
            assert_eq!(decoder.stats().records, 0);
        }
    }

    #[test]
    fn truncation_reports_tag_field_and_offset() {
        let mut bytes = vec![b'T', 1];
        bytes.push(b'E');
        bytes.extend(be_floats(&[0.0; 3]));
        let err = decoder(bytes)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        match err {
            DecodeError::Truncated {
                tag,
                field,
                offset,
                needed,
                available,
            } => {
                assert_eq!(tag, Tag::E);
                assert_eq!(field, "payload");
                assert_eq!(offset, 3);
                assert_eq!(needed, layout::E_PAYLOAD_LEN);
                assert_eq!(available, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn batch_truncation_names_sub_field() {
        let full = batch_record(3);
        let cases = [
            (1, "count"),
            (2, "header"),
            (2 + layout::BATCH_HEADER_LEN, "vertices"),
            (
                2 + layout::BATCH_HEADER_LEN + layout::BATCH_VERTEX_LEN,
                "trailer",
            ),
        ];
        for (keep, expected_field) in cases {
            let bytes = full[..keep].to_vec();
            let err = decoder(bytes).decode_next().unwrap_err();
            let DecodeError::Truncated { tag, field, .. } = err else {
                panic!("expected truncation");
            };
            assert_eq!(tag, Tag::B);
            assert_eq!(field, expected_field);
        }
    }

    #[test]
    fn truncation_message_mentions_offset() {
        let err = decoder(vec![b'P', 0, 0]).decode_next().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("truncated P record"));
        assert!(msg.contains("offset 1"));
    }

    #[test]
    fn unknown_bytes_are_skipped_and_counted() {
        let mut bytes = vec![0x00, b'x'];
        bytes.extend(vec![b'T', 9]);
        bytes.push(0xff);
        let mut decoder = StreamDecoder::with_config(
            ReaderSource::new(Cursor::new(bytes)),
            DecoderConfig {
                unknown_tags: UnknownTagPolicy::Warn,
            },
        );
        let records: Vec<Record> = decoder.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(records, vec![Record::T { value: 9 }]);
        assert_eq!(decoder.stats().unknown_tags, 3);
        assert_eq!(decoder.stats().bytes_consumed, 5);
    }

    #[test]
    fn unknown_byte_does_not_consume_payload() {
        // 'f' is not a tag; the following 'T' must still be read as one.
        let bytes = vec![b'f', b'T', b'T'];
        let records: Vec<Record> = decoder(bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(records, vec![Record::T { value: b'T' }]);
    }

    #[test]
    fn iterator_is_fused_after_error() {
        let mut bytes = vec![b'T', 1, b'F', 0];
        bytes.extend(vec![b'T', 2]);
        let mut decoder = decoder(bytes);
        assert!(matches!(decoder.next(), Some(Ok(Record::T { value: 1 }))));
        assert!(matches!(decoder.next(), Some(Err(_))));
        assert!(decoder.next().is_none());
        assert!(decoder.next().is_none());
    }

    #[test]
    fn records_before_truncation_are_kept() {
        let mut bytes = fixed_record(b'P', 3, None);
        bytes.extend(vec![b'S', 1, 2]);
        let mut decoder = decoder(bytes);
        let first = decoder.next().unwrap().unwrap();
        assert_eq!(first.tag(), Tag::P);
        assert!(decoder.next().unwrap().is_err());
        assert_eq!(decoder.stats().records, 1);
    }
}
