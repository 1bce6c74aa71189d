//! Serde representation for `f32` arrays that keeps non-finite values.
//!
//! Finite values are plain numbers. `NaN`, `inf` and `-inf` are written as
//! strings, since JSON numbers cannot hold them.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeTuple, Serializer};

const NAN: &str = "NaN";
const INF: &str = "inf";
const NEG_INF: &str = "-inf";

pub fn serialize<S: Serializer, const N: usize>(
    values: &[f32; N],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut tuple = serializer.serialize_tuple(N)?;
    for value in values {
        tuple.serialize_element(&Float(*value))?;
    }
    tuple.end()
}

pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[f32; N], D::Error> {
    deserializer.deserialize_tuple(N, ArrayVisitor::<N>)
}

struct Float(f32);

impl serde::Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value == f32::INFINITY {
            serializer.serialize_str(INF)
        } else if value == f32::NEG_INFINITY {
            serializer.serialize_str(NEG_INF)
        } else {
            serializer.serialize_f32(value)
        }
    }
}

impl<'de> serde::Deserialize<'de> for Float {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }
}

struct FloatVisitor;

impl Visitor<'_> for FloatVisitor {
    type Value = Float;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number or one of \"{NAN}\", \"{INF}\", \"{NEG_INF}\"")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Float, E> {
        Ok(Float(value as f32))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Float, E> {
        Ok(Float(value as f32))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Float, E> {
        Ok(Float(value as f32))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Float, E> {
        match value {
            NAN => Ok(Float(f32::NAN)),
            INF => Ok(Float(f32::INFINITY)),
            NEG_INF => Ok(Float(f32::NEG_INFINITY)),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

struct ArrayVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for ArrayVisitor<N> {
    type Value = [f32; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an array of {N} floats")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<[f32; N], A::Error> {
        let mut values = [0f32; N];
        for (i, value) in values.iter_mut().enumerate() {
            let Float(v) = seq
                .next_element::<Float>()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
            *value = v;
        }
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(N + 1, &self));
        }
        Ok(values)
    }
}
