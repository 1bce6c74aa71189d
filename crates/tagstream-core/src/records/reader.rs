use super::error::RecordError;
use super::layout;

/// Sequential big-endian field reader over one record payload.
pub struct PayloadReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], RecordError> {
        let end = self.pos + len;
        let bytes = self
            .payload
            .get(self.pos..end)
            .ok_or(RecordError::TooShort {
                needed: end,
                actual: self.payload.len(),
            })?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], RecordError> {
        let bytes = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, RecordError> {
        let bytes = self.read_slice(layout::U8_LEN)?;
        Ok(bytes[0])
    }

    pub fn read_i16_be(&mut self) -> Result<i16, RecordError> {
        Ok(i16::from_be_bytes(self.read_array::<{ layout::I16_LEN }>()?))
    }

    pub fn read_f32_be(&mut self) -> Result<f32, RecordError> {
        Ok(f32::from_be_bytes(self.read_array::<{ layout::F32_LEN }>()?))
    }

    /// Read `N` consecutive big-endian floats in payload order.
    pub fn read_f32s_be<const N: usize>(&mut self) -> Result<[f32; N], RecordError> {
        let mut values = [0f32; N];
        for value in &mut values {
            *value = self.read_f32_be()?;
        }
        Ok(values)
    }
}
