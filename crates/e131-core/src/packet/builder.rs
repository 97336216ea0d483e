use crate::error::InvalidArgument;

use super::layout;
use super::{
    DmpLayer, FrameLayer, Options, Packet, PacketOption, PropertyValues, RootLayer, SourceName,
};

pub const MIN_UNIVERSE: u16 = 1;
pub const MAX_UNIVERSE: u16 = 63999;
pub const MAX_PRIORITY: u8 = 200;
pub const DEFAULT_PRIORITY: u8 = 100;

/// Checks that `universe` lies in `1..=63999`.
pub fn check_universe(universe: u16) -> Result<u16, InvalidArgument> {
    if (MIN_UNIVERSE..=MAX_UNIVERSE).contains(&universe) {
        Ok(universe)
    } else {
        Err(InvalidArgument::Universe(universe))
    }
}

/// Builds well-formed outbound packets.
///
/// All derived fields (the three `flength` words, the property value count
/// and the fixed vectors) are filled in by [`PacketBuilder::build`]; levels
/// start at zero and are set on the returned packet.
///
/// # Examples
/// ```
/// use e131_core::{PacketBuilder, PacketOption};
///
/// let mut packet = PacketBuilder::new(1, 24)
///     .source_name("E1.31 Test Client")
///     .option(PacketOption::Preview, true)
///     .build()?;
/// packet.channels_mut()[0] = 255;
/// assert_eq!(packet.dmp.property_values.count(), 25);
/// # Ok::<(), e131_core::InvalidArgument>(())
/// ```
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    universe: u16,
    channel_count: usize,
    source_name: SourceName,
    priority: u8,
    sequence_number: u8,
    options: Options,
    cid: [u8; 16],
}

impl PacketBuilder {
    pub fn new(universe: u16, channel_count: usize) -> Self {
        Self {
            universe,
            channel_count,
            source_name: SourceName::default(),
            priority: DEFAULT_PRIORITY,
            sequence_number: 0,
            options: Options::empty(),
            cid: [0; 16],
        }
    }

    /// Names the source; anything past 63 bytes is dropped.
    pub fn source_name(mut self, name: &str) -> Self {
        self.source_name = SourceName::new(name);
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn sequence_number(mut self, sequence_number: u8) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn option(mut self, option: PacketOption, enabled: bool) -> Self {
        self.options.set(option, enabled);
        self
    }

    pub fn cid(mut self, cid: [u8; 16]) -> Self {
        self.cid = cid;
        self
    }

    /// Validates the parameters and assembles the packet.
    ///
    /// Fails with [`InvalidArgument`] when the universe, channel count or
    /// priority is out of range; no packet is produced in that case.
    pub fn build(self) -> Result<Packet, InvalidArgument> {
        let universe = check_universe(self.universe)?;
        let property_values = PropertyValues::zeroed(self.channel_count)?;
        if self.priority > MAX_PRIORITY {
            return Err(InvalidArgument::Priority(self.priority));
        }
        let count = self.channel_count + 1;

        Ok(Packet {
            root: RootLayer {
                preamble_size: layout::PREAMBLE_SIZE,
                postamble_size: layout::POSTAMBLE_SIZE,
                acn_id: *layout::ACN_ID,
                flength: layout::flength(layout::ROOT_PDU_OFFSET, count),
                vector: layout::ROOT_VECTOR_DATA,
                cid: self.cid,
            },
            frame: FrameLayer {
                flength: layout::flength(layout::FRAME_PDU_OFFSET, count),
                vector: layout::FRAME_VECTOR_DMP,
                source_name: self.source_name,
                priority: self.priority,
                reserved: 0,
                sequence_number: self.sequence_number,
                options: self.options,
                universe,
            },
            dmp: DmpLayer {
                flength: layout::flength(layout::DMP_PDU_OFFSET, count),
                vector: layout::DMP_VECTOR_SET_PROPERTY,
                address_type: layout::DMP_ADDRESS_AND_DATA_TYPE,
                first_address: layout::DMP_FIRST_ADDRESS,
                address_increment: layout::DMP_ADDRESS_INCREMENT,
                property_values,
            },
        })
    }
}
