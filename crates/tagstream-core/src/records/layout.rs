pub const TAG_LEN: usize = 1;

pub const F32_LEN: usize = 4;
pub const I16_LEN: usize = 2;
pub const U8_LEN: usize = 1;

pub const TAG_F: u8 = b'F';
pub const TAG_T: u8 = b'T';
pub const TAG_P: u8 = b'P';
pub const TAG_L: u8 = b'L';
pub const TAG_E: u8 = b'E';
pub const TAG_S: u8 = b'S';
pub const TAG_C: u8 = b'C';
pub const TAG_Y: u8 = b'Y';
pub const TAG_B: u8 = b'B';

pub const F_PAYLOAD_LEN: usize = 3 * F32_LEN;
pub const T_PAYLOAD_LEN: usize = U8_LEN;
pub const P_PAYLOAD_LEN: usize = 3 * F32_LEN;
pub const L_PAYLOAD_LEN: usize = 6 * F32_LEN + I16_LEN;
pub const E_PAYLOAD_LEN: usize = 8 * F32_LEN + I16_LEN;
pub const S_PAYLOAD_LEN: usize = 9 * F32_LEN + I16_LEN;
pub const C_PAYLOAD_LEN: usize = 8 * F32_LEN + I16_LEN;
pub const Y_PAYLOAD_LEN: usize = 8 * F32_LEN + I16_LEN;

pub const BATCH_COUNT_LEN: usize = U8_LEN;
pub const BATCH_HEADER_LEN: usize = 6 * F32_LEN;
pub const BATCH_VERTEX_LEN: usize = 3 * F32_LEN;
pub const BATCH_TRAILER_LEN: usize = L_PAYLOAD_LEN;
/// Vertices carried by the header; only the rest are stored as raw chunks.
pub const BATCH_HEADER_VERTICES: u8 = 2;

/// Number of raw vertex chunks following a batch header.
///
/// Counts below the header vertices clamp to zero.
pub fn batch_extra_vertices(count: u8) -> usize {
    usize::from(count.saturating_sub(BATCH_HEADER_VERTICES))
}

/// Byte length of the variable vertex block of a batch.
///
/// # Examples
/// ```
/// use tagstream_core::records::layout::batch_vertex_bytes;
///
/// assert_eq!(batch_vertex_bytes(4), 24);
/// assert_eq!(batch_vertex_bytes(1), 0);
/// ```
pub fn batch_vertex_bytes(count: u8) -> usize {
    batch_extra_vertices(count) * BATCH_VERTEX_LEN
}

/// Total encoded size of a batch record, tag byte included.
pub fn batch_record_len(count: u8) -> usize {
    TAG_LEN + BATCH_COUNT_LEN + BATCH_HEADER_LEN + batch_vertex_bytes(count) + BATCH_TRAILER_LEN
}
