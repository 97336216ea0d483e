use super::error::{DecodeError, EncodeError, Layer};
use super::layout;
use super::reader::PacketReader;
use super::writer::PacketWriter;
use super::{DmpLayer, FrameLayer, Options, Packet, PropertyValues, RootLayer, SourceName};

/// Serializes a packet to exactly `125 + property_value_count` bytes.
///
/// The three `flength` words are derived from the property values, so the
/// output always decodes even when the stored length fields are stale.
///
/// # Examples
/// ```
/// use e131_core::{PacketBuilder, encode};
///
/// let packet = PacketBuilder::new(1, 24).build()?;
/// assert_eq!(encode(&packet).len(), 125 + 25);
/// # Ok::<(), e131_core::InvalidArgument>(())
/// ```
pub fn encode(packet: &Packet) -> Vec<u8> {
    let count = packet.dmp.property_values.as_bytes().len();
    let mut writer = PacketWriter::with_capacity(packet.wire_len());
    let RootLayer {
        preamble_size,
        postamble_size,
        acn_id,
        vector,
        cid,
        ..
    } = &packet.root;
    writer.put_u16_be(*preamble_size);
    writer.put_u16_be(*postamble_size);
    writer.put_slice(acn_id);
    writer.put_u16_be(layout::flength(layout::ROOT_PDU_OFFSET, count));
    writer.put_u32_be(*vector);
    writer.put_slice(cid);
    debug_assert_eq!(writer.position(), layout::FRAME_PDU_OFFSET);

    let frame = &packet.frame;
    writer.put_u16_be(layout::flength(layout::FRAME_PDU_OFFSET, count));
    writer.put_u32_be(frame.vector);
    writer.put_padded(frame.source_name.as_str().as_bytes(), layout::SOURCE_NAME_LEN);
    writer.put_u8(frame.priority);
    writer.put_u16_be(frame.reserved);
    writer.put_u8(frame.sequence_number);
    writer.put_u8(frame.options.bits());
    writer.put_u16_be(frame.universe);
    debug_assert_eq!(writer.position(), layout::DMP_PDU_OFFSET);

    let dmp = &packet.dmp;
    writer.put_u16_be(layout::flength(layout::DMP_PDU_OFFSET, count));
    writer.put_u8(dmp.vector);
    writer.put_u8(dmp.address_type);
    writer.put_u16_be(dmp.first_address);
    writer.put_u16_be(dmp.address_increment);
    writer.put_u16_be(dmp.property_values.count());
    debug_assert_eq!(writer.position(), layout::PROPERTY_VALUES_OFFSET);
    writer.put_slice(dmp.property_values.as_bytes());

    writer.finish()
}

/// Serializes into `out`, returning the number of bytes written.
///
/// Nothing is written when `out` cannot hold the whole packet.
pub fn encode_into(packet: &Packet, out: &mut [u8]) -> Result<usize, EncodeError> {
    let needed = packet.wire_len();
    let actual = out.len();
    let target = out
        .get_mut(..needed)
        .ok_or(EncodeError::BufferTooSmall { needed, actual })?;
    target.copy_from_slice(&encode(packet));
    Ok(needed)
}

/// Decodes a packet, checking lengths but not vectors or identifiers.
///
/// Vector and ACN identifier checks belong to [`crate::validate`]; the raw
/// values are carried through so they can be classified afterwards.
pub fn decode(bytes: &[u8]) -> Result<Packet, DecodeError> {
    let reader = PacketReader::new(bytes);
    reader.require_len(layout::HEADER_LEN)?;

    let count = reader.read_u16_be(layout::PROPERTY_VALUE_COUNT_RANGE)?;
    if count == 0 || count as usize > layout::MAX_PROPERTY_VALUES {
        return Err(DecodeError::InvalidPropertyValueCount { count });
    }
    let count = count as usize;
    let values = reader.property_values(count)?;

    let root_flength = read_flength(&reader, Layer::Root, count)?;
    let frame_flength = read_flength(&reader, Layer::Frame, count)?;
    let dmp_flength = read_flength(&reader, Layer::Dmp, count)?;

    let root = RootLayer {
        preamble_size: reader.read_u16_be(layout::PREAMBLE_SIZE_RANGE)?,
        postamble_size: reader.read_u16_be(layout::POSTAMBLE_SIZE_RANGE)?,
        acn_id: reader.read_array(layout::ACN_ID_RANGE)?,
        flength: root_flength,
        vector: reader.read_u32_be(layout::ROOT_VECTOR_RANGE)?,
        cid: reader.read_array(layout::CID_RANGE)?,
    };

    let frame = FrameLayer {
        flength: frame_flength,
        vector: reader.read_u32_be(layout::FRAME_VECTOR_RANGE)?,
        source_name: SourceName::new(&reader.read_padded_string(layout::SOURCE_NAME_RANGE)?),
        priority: reader.read_u8(layout::PRIORITY_OFFSET)?,
        reserved: reader.read_u16_be(layout::RESERVED_RANGE)?,
        sequence_number: reader.read_u8(layout::SEQUENCE_OFFSET)?,
        options: Options::from_bits(reader.read_u8(layout::OPTIONS_OFFSET)?),
        universe: reader.read_u16_be(layout::UNIVERSE_RANGE)?,
    };

    let property_values = PropertyValues::try_from(values.to_vec())
        .map_err(|_| DecodeError::InvalidPropertyValueCount { count: count as u16 })?;
    let dmp = DmpLayer {
        flength: dmp_flength,
        vector: reader.read_u8(layout::DMP_VECTOR_OFFSET)?,
        address_type: reader.read_u8(layout::DMP_TYPE_OFFSET)?,
        first_address: reader.read_u16_be(layout::FIRST_ADDRESS_RANGE)?,
        address_increment: reader.read_u16_be(layout::ADDRESS_INCREMENT_RANGE)?,
        property_values,
    };

    if reader.len() > layout::HEADER_LEN + count {
        log::trace!(
            "codec: ignoring {} trailing bytes",
            reader.len() - layout::HEADER_LEN - count
        );
    }

    Ok(Packet { root, frame, dmp })
}

fn read_flength(reader: &PacketReader<'_>, layer: Layer, count: usize) -> Result<u16, DecodeError> {
    let (range, pdu_offset) = match layer {
        Layer::Root => (layout::ROOT_FLENGTH_RANGE, layout::ROOT_PDU_OFFSET),
        Layer::Frame => (layout::FRAME_FLENGTH_RANGE, layout::FRAME_PDU_OFFSET),
        Layer::Dmp => (layout::DMP_FLENGTH_RANGE, layout::DMP_PDU_OFFSET),
    };
    let word = reader.read_u16_be(range)?;
    let flags = word & layout::FLENGTH_FLAGS_MASK;
    if flags != layout::FLENGTH_FLAGS {
        return Err(DecodeError::InvalidFlags { layer, flags });
    }
    let expected = layout::flength(pdu_offset, count) & layout::FLENGTH_LENGTH_MASK;
    let actual = word & layout::FLENGTH_LENGTH_MASK;
    if actual != expected {
        return Err(DecodeError::LengthMismatch {
            layer,
            expected,
            actual,
        });
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, encode_into};
    use crate::packet::error::{DecodeError, EncodeError, Layer};
    use crate::packet::{PacketBuilder, PacketOption, PropertyValues, layout};

    fn sample() -> crate::Packet {
        let mut packet = PacketBuilder::new(7, 4)
            .source_name("desk")
            .priority(150)
            .sequence_number(42)
            .cid([0xAB; 16])
            .build()
            .unwrap();
        packet.channels_mut().copy_from_slice(&[1, 2, 3, 255]);
        packet
    }

    #[test]
    fn encode_writes_fixed_header_fields() {
        let bytes = encode(&sample());
        assert_eq!(bytes.len(), layout::HEADER_LEN + 5);
        assert_eq!(&bytes[0..4], &[0x00, 0x10, 0x00, 0x00]);
        assert_eq!(&bytes[layout::ACN_ID_RANGE], layout::ACN_ID);
        assert_eq!(&bytes[layout::ROOT_VECTOR_RANGE], &[0, 0, 0, 4]);
        assert_eq!(&bytes[layout::FRAME_VECTOR_RANGE], &[0, 0, 0, 2]);
        assert_eq!(&bytes[44..48], b"desk");
        assert!(bytes[48..108].iter().all(|b| *b == 0));
        assert_eq!(bytes[layout::PRIORITY_OFFSET], 150);
        assert_eq!(bytes[layout::SEQUENCE_OFFSET], 42);
        assert_eq!(&bytes[layout::UNIVERSE_RANGE], &[0, 7]);
        assert_eq!(bytes[layout::DMP_VECTOR_OFFSET], 0x02);
        assert_eq!(bytes[layout::DMP_TYPE_OFFSET], 0xA1);
        assert_eq!(&bytes[layout::ADDRESS_INCREMENT_RANGE], &[0, 1]);
        assert_eq!(&bytes[layout::PROPERTY_VALUE_COUNT_RANGE], &[0, 5]);
        assert_eq!(&bytes[125..], &[0, 1, 2, 3, 255]);
    }

    #[test]
    fn options_byte_uses_msb_first_bits() {
        let mut packet = sample();
        packet.set_option(PacketOption::Preview, true);
        assert_eq!(encode(&packet)[layout::OPTIONS_OFFSET], 0x80);

        packet.set_option(PacketOption::Preview, false);
        packet.set_option(PacketOption::Terminated, true);
        assert_eq!(encode(&packet)[layout::OPTIONS_OFFSET], 0x40);

        let mut bytes = encode(&packet);
        bytes[layout::OPTIONS_OFFSET] = 0x80;
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.option(PacketOption::Preview));
        assert!(!decoded.option(PacketOption::Terminated));
    }

    #[test]
    fn encode_derives_flength_from_property_values() {
        let mut packet = PacketBuilder::new(1, 24).build().unwrap();
        packet.dmp.property_values = PropertyValues::zeroed(10).unwrap();
        packet.channels_mut()[9] = 77;

        let bytes = encode(&packet);
        assert_eq!(bytes.len(), layout::HEADER_LEN + 11);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.channels().len(), 10);
        assert_eq!(decoded.channels()[9], 77);
        assert_eq!(decoded.root.flength, 0x7000 | (11 + 10 + 77 + 22));
        assert_eq!(decoded.frame.flength, 0x7000 | (11 + 10 + 77));
        assert_eq!(decoded.dmp.flength, 0x7000 | (11 + 10));
    }

    #[test]
    fn deserialized_packet_with_other_length_still_encodes() {
        let packet = PacketBuilder::new(1, 2).build().unwrap();
        let mut value = serde_json::to_value(&packet).unwrap();
        value["dmp"]["property_values"] = serde_json::json!([0, 1, 2, 3, 4, 5]);
        let packet: crate::Packet = serde_json::from_value(value).unwrap();

        let decoded = decode(&encode(&packet)).unwrap();
        assert_eq!(decoded.channels(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn decode_reverses_encode() {
        let mut packet = sample();
        packet.set_option(PacketOption::Preview, true);
        let decoded = decode(&encode(&packet)).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let packet = sample();
        let mut bytes = encode(&packet);
        bytes.resize(layout::MAX_PACKET_LEN, 0xEE);
        assert_eq!(decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn decode_rejects_short_header() {
        let err = decode(&[0u8; layout::HEADER_LEN - 1]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                needed: layout::HEADER_LEN,
                actual: layout::HEADER_LEN - 1
            }
        );
    }

    #[test]
    fn decode_rejects_truncated_values() {
        let bytes = encode(&sample());
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::TooShort { .. }));
    }

    #[test]
    fn decode_rejects_out_of_range_count() {
        let mut bytes = encode(&sample());
        bytes[layout::PROPERTY_VALUE_COUNT_RANGE].copy_from_slice(&514u16.to_be_bytes());
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DecodeError::InvalidPropertyValueCount { count: 514 }
        );
        bytes[layout::PROPERTY_VALUE_COUNT_RANGE].copy_from_slice(&0u16.to_be_bytes());
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DecodeError::InvalidPropertyValueCount { count: 0 }
        );
    }

    #[test]
    fn decode_rejects_inconsistent_flength() {
        let mut bytes = encode(&sample());
        bytes[layout::FRAME_FLENGTH_RANGE].copy_from_slice(&(0x7000u16 | 10).to_be_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            DecodeError::LengthMismatch {
                layer: Layer::Frame,
                actual: 10,
                ..
            }
        ));

        let mut bytes = encode(&sample());
        bytes[layout::DMP_FLENGTH_RANGE.start] &= 0x0F;
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            DecodeError::InvalidFlags {
                layer: Layer::Dmp,
                flags: 0
            }
        ));
    }

    #[test]
    fn encode_into_refuses_small_buffers() {
        let packet = sample();
        let mut small = [0u8; 64];
        assert_eq!(
            encode_into(&packet, &mut small),
            Err(EncodeError::BufferTooSmall {
                needed: 130,
                actual: 64
            })
        );
        assert!(small.iter().all(|b| *b == 0));

        let mut buf = [0u8; layout::MAX_PACKET_LEN];
        let written = encode_into(&packet, &mut buf).unwrap();
        assert_eq!(written, 130);
        assert_eq!(&buf[..written], encode(&packet).as_slice());
        assert!(buf[written..].iter().all(|b| *b == 0));
    }
}
