//! Structural validation of inbound E1.31 packets.
//!
//! Checks run in a fixed order (input present, ACN identifier, root vector,
//! framing vector, DMP vector) and the first failure is reported. Length
//! consistency is left to [`crate::decode`] and ordering to
//! [`crate::SequenceTracker`].

use thiserror::Error;

use crate::packet::Packet;
use crate::packet::layout;
use crate::packet::reader::PacketReader;

/// Classified validation failure.
///
/// # Examples
/// ```
/// use e131_core::{ProtocolError, validate};
///
/// assert_eq!(validate(&[]), Err(ProtocolError::NullInput));
/// assert_eq!(validate(&[0u8; 638]), Err(ProtocolError::BadAcnIdentifier));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty packet buffer")]
    NullInput,
    #[error("invalid ACN packet identifier")]
    BadAcnIdentifier,
    #[error("invalid root layer vector")]
    BadRootVector,
    #[error("invalid framing layer vector")]
    BadFrameVector,
    #[error("invalid DMP layer vector")]
    BadDmpVector,
}

/// Validates a raw buffer as received from the transport.
///
/// A buffer too short to hold a checked field fails that field's check.
pub fn validate(bytes: &[u8]) -> Result<(), ProtocolError> {
    if bytes.is_empty() {
        return Err(ProtocolError::NullInput);
    }
    let reader = PacketReader::new(bytes);

    if reader.field(layout::ACN_ID_RANGE) != Some(&layout::ACN_ID[..]) {
        return Err(ProtocolError::BadAcnIdentifier);
    }
    let root_vector = layout::ROOT_VECTOR_DATA.to_be_bytes();
    if reader.field(layout::ROOT_VECTOR_RANGE) != Some(&root_vector[..]) {
        return Err(ProtocolError::BadRootVector);
    }
    let frame_vector = layout::FRAME_VECTOR_DMP.to_be_bytes();
    if reader.field(layout::FRAME_VECTOR_RANGE) != Some(&frame_vector[..]) {
        return Err(ProtocolError::BadFrameVector);
    }
    if reader.read_u8(layout::DMP_VECTOR_OFFSET).ok() != Some(layout::DMP_VECTOR_SET_PROPERTY) {
        return Err(ProtocolError::BadDmpVector);
    }
    Ok(())
}

/// Validates an already decoded packet with the same checks and order.
pub fn validate_packet(packet: &Packet) -> Result<(), ProtocolError> {
    if packet.root.acn_id != *layout::ACN_ID {
        return Err(ProtocolError::BadAcnIdentifier);
    }
    if packet.root.vector != layout::ROOT_VECTOR_DATA {
        return Err(ProtocolError::BadRootVector);
    }
    if packet.frame.vector != layout::FRAME_VECTOR_DMP {
        return Err(ProtocolError::BadFrameVector);
    }
    if packet.dmp.vector != layout::DMP_VECTOR_SET_PROPERTY {
        return Err(ProtocolError::BadDmpVector);
    }
    Ok(())
}
