use super::error::RecordError;
use super::layout;
use super::reader::PayloadReader;
use super::{Batch, RawVertex, Record, Tag};

/// Decode the payload of a fixed-layout tag.
///
/// `payload` must hold exactly the tag's payload bytes. `B` batches go
/// through [`parse_batch`] instead.
pub fn parse_fixed(tag: Tag, payload: &[u8]) -> Result<Record, RecordError> {
    let expected = tag
        .payload_len()
        .ok_or(RecordError::NotFixed { tag: tag.letter() })?;
    if payload.len() != expected {
        return Err(RecordError::LengthMismatch {
            tag: tag.letter(),
            expected,
            actual: payload.len(),
        });
    }

    let mut reader = PayloadReader::new(payload);
    let record = match tag {
        Tag::F => Record::F {
            values: reader.read_f32s_be()?,
        },
        Tag::T => Record::T {
            value: reader.read_u8()?,
        },
        Tag::P => Record::P {
            values: reader.read_f32s_be()?,
        },
        Tag::L => Record::L {
            values: reader.read_f32s_be()?,
            tail: reader.read_i16_be()?,
        },
        Tag::E => Record::E {
            values: reader.read_f32s_be()?,
            tail: reader.read_i16_be()?,
        },
        Tag::S => Record::S {
            values: reader.read_f32s_be()?,
            tail: reader.read_i16_be()?,
        },
        Tag::C => Record::C {
            values: reader.read_f32s_be()?,
            tail: reader.read_i16_be()?,
        },
        Tag::Y => Record::Y {
            values: reader.read_f32s_be()?,
            tail: reader.read_i16_be()?,
        },
        Tag::B => return Err(RecordError::NotFixed { tag: tag.letter() }),
    };
    Ok(record)
}

/// Decode a complete `B` payload: count, header, vertex block, trailer.
///
/// The vertex block length is derived from the leading count byte, so the
/// payload length must equal the layout computed from it.
pub fn parse_batch(payload: &[u8]) -> Result<Batch, RecordError> {
    let mut reader = PayloadReader::new(payload);
    let count = reader.read_u8()?;
    let expected = layout::batch_record_len(count) - layout::TAG_LEN;
    if payload.len() != expected {
        return Err(RecordError::LengthMismatch {
            tag: Tag::B.letter(),
            expected,
            actual: payload.len(),
        });
    }

    let header = reader.read_f32s_be()?;
    let mut vertices = Vec::with_capacity(layout::batch_extra_vertices(count));
    for _ in 0..layout::batch_extra_vertices(count) {
        vertices.push(RawVertex(reader.read_array()?));
    }
    let trailer = reader.read_f32s_be()?;
    let tail = reader.read_i16_be()?;

    Ok(Batch {
        count,
        header,
        vertices,
        trailer,
        tail,
    })
}
