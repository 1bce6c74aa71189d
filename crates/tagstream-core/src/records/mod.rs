//! Record decoding for the tagged stream format.
//!
//! Each record is one tag byte followed by a payload whose size is fixed by
//! the tag, except for `B` batches whose vertex block is sized by a leading
//! count byte. The layering follows the usual split:
//! - `layout`: tag bytes and payload sizes (source of truth)
//! - `reader`: sequential big-endian field access
//! - `parser`: domain-level decoding into [`Record`] values
//! - `error`: payload access errors
//!
//! Parsers are pure and contain no I/O; the stream decoder owns the byte
//! source and hands each payload to the parser once it is fully read.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod error;
mod float_repr;
pub mod layout;
pub mod parser;
pub mod reader;

/// Closed set of record tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    F = layout::TAG_F,
    T = layout::TAG_T,
    P = layout::TAG_P,
    L = layout::TAG_L,
    E = layout::TAG_E,
    S = layout::TAG_S,
    C = layout::TAG_C,
    Y = layout::TAG_Y,
    B = layout::TAG_B,
}

impl Tag {
    /// Map a stream byte to a tag, `None` for bytes outside the tag set.
    ///
    /// # Examples
    /// ```
    /// use tagstream_core::Tag;
    ///
    /// assert_eq!(Tag::from_byte(b'F'), Some(Tag::F));
    /// assert_eq!(Tag::from_byte(b'x'), None);
    /// ```
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            layout::TAG_F => Some(Tag::F),
            layout::TAG_T => Some(Tag::T),
            layout::TAG_P => Some(Tag::P),
            layout::TAG_L => Some(Tag::L),
            layout::TAG_E => Some(Tag::E),
            layout::TAG_S => Some(Tag::S),
            layout::TAG_C => Some(Tag::C),
            layout::TAG_Y => Some(Tag::Y),
            layout::TAG_B => Some(Tag::B),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn letter(self) -> char {
        char::from(self.as_byte())
    }

    /// Fixed payload size, `None` for the variable-length batch.
    ///
    /// # Examples
    /// ```
    /// use tagstream_core::Tag;
    ///
    /// assert_eq!(Tag::S.payload_len(), Some(38));
    /// assert_eq!(Tag::B.payload_len(), None);
    /// ```
    pub fn payload_len(self) -> Option<usize> {
        match self {
            Tag::F => Some(layout::F_PAYLOAD_LEN),
            Tag::T => Some(layout::T_PAYLOAD_LEN),
            Tag::P => Some(layout::P_PAYLOAD_LEN),
            Tag::L => Some(layout::L_PAYLOAD_LEN),
            Tag::E => Some(layout::E_PAYLOAD_LEN),
            Tag::S => Some(layout::S_PAYLOAD_LEN),
            Tag::C => Some(layout::C_PAYLOAD_LEN),
            Tag::Y => Some(layout::Y_PAYLOAD_LEN),
            Tag::B => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One decoded record, in the field order of its payload.
///
/// `tail` is the trailing big-endian `i16` shared by the wider layouts.
/// Non-finite floats serialize as the strings `"NaN"`, `"inf"` and `"-inf"`.
///
/// # Examples
/// ```
/// use tagstream_core::Record;
///
/// let record = Record::F { values: [1.0, 2.0, 3.0] };
/// assert_eq!(record.to_string(), "F (1.0, 2.0, 3.0)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum Record {
    F {
        #[serde(with = "float_repr")]
        values: [f32; 3],
    },
    T {
        value: u8,
    },
    P {
        #[serde(with = "float_repr")]
        values: [f32; 3],
    },
    L {
        #[serde(with = "float_repr")]
        values: [f32; 6],
        tail: i16,
    },
    E {
        #[serde(with = "float_repr")]
        values: [f32; 8],
        tail: i16,
    },
    S {
        #[serde(with = "float_repr")]
        values: [f32; 9],
        tail: i16,
    },
    C {
        #[serde(with = "float_repr")]
        values: [f32; 8],
        tail: i16,
    },
    Y {
        #[serde(with = "float_repr")]
        values: [f32; 8],
        tail: i16,
    },
    B(Batch),
}

impl Record {
    pub fn tag(&self) -> Tag {
        match self {
            Record::F { .. } => Tag::F,
            Record::T { .. } => Tag::T,
            Record::P { .. } => Tag::P,
            Record::L { .. } => Tag::L,
            Record::E { .. } => Tag::E,
            Record::S { .. } => Tag::S,
            Record::C { .. } => Tag::C,
            Record::Y { .. } => Tag::Y,
            Record::B(_) => Tag::B,
        }
    }

    /// Number of stream bytes this record occupied, tag byte included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::B(batch) => layout::batch_record_len(batch.count),
            other => layout::TAG_LEN + other.tag().payload_len().unwrap_or(0),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.tag())?;
        match self {
            Record::F { values } | Record::P { values } => write_tuple(f, values, None),
            Record::T { value } => write!(f, "({value},)"),
            Record::L { values, tail } => write_tuple(f, values, Some(*tail)),
            Record::E { values, tail } | Record::C { values, tail } | Record::Y { values, tail } => {
                write_tuple(f, values, Some(*tail))
            }
            Record::S { values, tail } => write_tuple(f, values, Some(*tail)),
            Record::B(batch) => {
                write!(f, "{} ", batch.count)?;
                write_tuple(f, &batch.header, None)?;
                write!(f, " [{} vertices] ", batch.vertices.len())?;
                write_tuple(f, &batch.trailer, Some(batch.tail))
            }
        }
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, values: &[f32], tail: Option<i16>) -> fmt::Result {
    write!(f, "(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value:?}")?;
    }
    if let Some(tail) = tail {
        write!(f, ", {tail}")?;
    }
    write!(f, ")")
}

/// Variable-length polygon batch (`B`).
///
/// The header carries the first two vertices; `vertices` holds the
/// remaining `count - 2` vertices as raw chunks, decoded on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Vertex count as stored in the stream.
    pub count: u8,
    #[serde(with = "float_repr")]
    pub header: [f32; 6],
    pub vertices: Vec<RawVertex>,
    #[serde(with = "float_repr")]
    pub trailer: [f32; 6],
    pub tail: i16,
}

impl Batch {
    /// Decode each stored vertex chunk into `[x, y, z]`.
    ///
    /// # Examples
    /// ```
    /// use tagstream_core::{Batch, RawVertex};
    ///
    /// let mut chunk = [0u8; 12];
    /// chunk[0..4].copy_from_slice(&1.0f32.to_be_bytes());
    /// let batch = Batch {
    ///     count: 3,
    ///     header: [0.0; 6],
    ///     vertices: vec![RawVertex(chunk)],
    ///     trailer: [0.0; 6],
    ///     tail: 0,
    /// };
    /// let decoded: Vec<[f32; 3]> = batch.decoded_vertices().collect();
    /// assert_eq!(decoded, vec![[1.0, 0.0, 0.0]]);
    /// ```
    pub fn decoded_vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.vertices.iter().map(RawVertex::decode)
    }
}

/// One undecoded 12-byte vertex chunk (3 × big-endian `f32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVertex(pub [u8; layout::BATCH_VERTEX_LEN]);

impl RawVertex {
    pub fn decode(&self) -> [f32; 3] {
        let mut out = [0f32; 3];
        for (value, bytes) in out.iter_mut().zip(self.0.chunks_exact(layout::F32_LEN)) {
            *value = f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        out
    }
}
