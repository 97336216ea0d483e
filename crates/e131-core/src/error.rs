use thiserror::Error;

use crate::address::ResolutionError;
use crate::packet::{DecodeError, EncodeError};
use crate::transport::TransportError;
use crate::validate::ProtocolError;

/// Caller-supplied parameter outside the protocol range.
///
/// Always reported before any mutation or I/O takes place.
///
/// # Examples
/// ```
/// use e131_core::{InvalidArgument, PacketBuilder};
///
/// let err = PacketBuilder::new(0, 24).build().unwrap_err();
/// assert_eq!(err, InvalidArgument::Universe(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("universe {0} out of range 1..=63999")]
    Universe(u16),
    #[error("channel count {0} out of range 1..=512")]
    ChannelCount(usize),
    #[error("channel {0} out of range for this packet")]
    Channel(usize),
    #[error("priority {0} out of range 0..=200")]
    Priority(u8),
    #[error("property value count {0} out of range 1..=513")]
    PropertyValueCount(usize),
    #[error("host must not be empty")]
    EmptyHost,
}

/// Umbrella error for callers that want a single type across the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    #[error("malformed packet: {0}")]
    Malformed(#[from] DecodeError),
    #[error("invalid packet: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("address resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
