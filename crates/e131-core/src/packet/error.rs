use std::fmt;

use thiserror::Error;

/// PDU whose `flength` word failed a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Root,
    Frame,
    Dmp,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Root => "root",
            Layer::Frame => "framing",
            Layer::Dmp => "DMP",
        };
        f.write_str(name)
    }
}

/// Errors returned while decoding an inbound buffer (malformed packets).
///
/// # Examples
/// ```
/// use e131_core::DecodeError;
///
/// let err = DecodeError::TooShort { needed: 125, actual: 3 };
/// assert!(err.to_string().contains("packet too short"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("packet too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid property value count: {count}")]
    InvalidPropertyValueCount { count: u16 },
    #[error("invalid {layer} layer flags: {flags:#x}")]
    InvalidFlags { layer: Layer, flags: u16 },
    #[error("{layer} layer length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        layer: Layer,
        expected: u16,
        actual: u16,
    },
}

/// Errors returned while encoding into a caller-provided buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
}
