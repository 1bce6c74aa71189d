use thiserror::Error;

/// Errors returned when reading fields out of a record payload.
///
/// # Examples
/// ```
/// use tagstream_core::records::error::RecordError;
///
/// let err = RecordError::TooShort { needed: 12, actual: 4 };
/// assert!(err.to_string().contains("payload too short"));
/// ```
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("payload length mismatch for tag {tag}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        tag: char,
        expected: usize,
        actual: usize,
    },
    #[error("tag {tag} has no fixed payload layout")]
    NotFixed { tag: char },
}
