use std::ops::Range;

// Root layer
pub const PREAMBLE_SIZE_RANGE: Range<usize> = 0..2;
pub const POSTAMBLE_SIZE_RANGE: Range<usize> = 2..4;
pub const ACN_ID_RANGE: Range<usize> = 4..16;
pub const ROOT_FLENGTH_RANGE: Range<usize> = 16..18;
pub const ROOT_VECTOR_RANGE: Range<usize> = 18..22;
pub const CID_RANGE: Range<usize> = 22..38;

// Framing layer
pub const FRAME_FLENGTH_RANGE: Range<usize> = 38..40;
pub const FRAME_VECTOR_RANGE: Range<usize> = 40..44;
pub const SOURCE_NAME_RANGE: Range<usize> = 44..108;
pub const PRIORITY_OFFSET: usize = 108;
pub const RESERVED_RANGE: Range<usize> = 109..111;
pub const SEQUENCE_OFFSET: usize = 111;
pub const OPTIONS_OFFSET: usize = 112;
pub const UNIVERSE_RANGE: Range<usize> = 113..115;

// DMP layer
pub const DMP_FLENGTH_RANGE: Range<usize> = 115..117;
pub const DMP_VECTOR_OFFSET: usize = 117;
pub const DMP_TYPE_OFFSET: usize = 118;
pub const FIRST_ADDRESS_RANGE: Range<usize> = 119..121;
pub const ADDRESS_INCREMENT_RANGE: Range<usize> = 121..123;
pub const PROPERTY_VALUE_COUNT_RANGE: Range<usize> = 123..125;
pub const PROPERTY_VALUES_OFFSET: usize = 125;

/// Start of each PDU, i.e. the first byte covered by its `flength`.
pub const ROOT_PDU_OFFSET: usize = ROOT_FLENGTH_RANGE.start;
pub const FRAME_PDU_OFFSET: usize = FRAME_FLENGTH_RANGE.start;
pub const DMP_PDU_OFFSET: usize = DMP_FLENGTH_RANGE.start;

pub const SOURCE_NAME_LEN: usize = SOURCE_NAME_RANGE.end - SOURCE_NAME_RANGE.start;
pub const MAX_PROPERTY_VALUES: usize = 513;
pub const MAX_CHANNELS: usize = MAX_PROPERTY_VALUES - 1;

/// Root, framing and DMP headers with zero property values.
pub const HEADER_LEN: usize = PROPERTY_VALUES_OFFSET;
pub const MAX_PACKET_LEN: usize = HEADER_LEN + MAX_PROPERTY_VALUES;

pub const ACN_ID: &[u8; 12] = b"ASC-E1.17\0\0\0";
pub const PREAMBLE_SIZE: u16 = 0x0010;
pub const POSTAMBLE_SIZE: u16 = 0x0000;
pub const ROOT_VECTOR_DATA: u32 = 0x0000_0004;
pub const FRAME_VECTOR_DMP: u32 = 0x0000_0002;
pub const DMP_VECTOR_SET_PROPERTY: u8 = 0x02;
pub const DMP_ADDRESS_AND_DATA_TYPE: u8 = 0xA1;
pub const DMP_FIRST_ADDRESS: u16 = 0x0000;
pub const DMP_ADDRESS_INCREMENT: u16 = 0x0001;

pub const FLENGTH_FLAGS: u16 = 0x7000;
pub const FLENGTH_FLAGS_MASK: u16 = 0xF000;
pub const FLENGTH_LENGTH_MASK: u16 = 0x0FFF;

/// Packed `flength` word for a PDU starting at `pdu_offset` in a packet
/// carrying `property_value_count` values.
pub const fn flength(pdu_offset: usize, property_value_count: usize) -> u16 {
    FLENGTH_FLAGS | ((PROPERTY_VALUES_OFFSET + property_value_count - pdu_offset) as u16)
}
