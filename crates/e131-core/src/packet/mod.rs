//! E1.31 data packet model and wire codec.
//!
//! A [`Packet`] always carries its three nested layers (root, framing, DMP).
//! The wire mapping is explicit: `layout` holds every offset and constant,
//! `reader`/`writer` provide bounds-checked big-endian access, and `codec`
//! turns bytes into layers and back without indexing raw memory directly.
//!
//! Only `125 + property_value_count` bytes are ever emitted or required;
//! trailing channel slots that are not in use never reach the wire.
//!
//! Version française (résumé):
//! Le module décrit le paquet E1.31 (couches racine, trame, DMP) et son
//! codec. Les positions sont dans `layout`, les accès bornés dans
//! `reader`/`writer`, la conversion dans `codec`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidArgument;

pub mod builder;
pub mod codec;
pub mod error;
pub mod layout;
pub(crate) mod reader;
pub(crate) mod writer;

pub use builder::PacketBuilder;
pub use codec::{decode, encode, encode_into};
pub use error::{DecodeError, EncodeError, Layer};

/// Complete E1.31 data packet.
///
/// The `flength` fields hold what was decoded; [`encode`] recomputes them
/// from the property values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub root: RootLayer,
    pub frame: FrameLayer,
    pub dmp: DmpLayer,
}

/// ACN root layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootLayer {
    pub preamble_size: u16,
    pub postamble_size: u16,
    pub acn_id: [u8; 12],
    pub flength: u16,
    pub vector: u32,
    /// Component identifier of the sending source.
    pub cid: [u8; 16],
}

/// E1.31 framing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayer {
    pub flength: u16,
    pub vector: u32,
    pub source_name: SourceName,
    pub priority: u8,
    pub reserved: u16,
    pub sequence_number: u8,
    pub options: Options,
    pub universe: u16,
}

/// DMP "set property" layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmpLayer {
    pub flength: u16,
    pub vector: u8,
    pub address_type: u8,
    pub first_address: u16,
    pub address_increment: u16,
    pub property_values: PropertyValues,
}

impl Packet {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        codec::decode(bytes)
    }

    pub fn universe(&self) -> u16 {
        self.frame.universe
    }

    pub fn sequence_number(&self) -> u8 {
        self.frame.sequence_number
    }

    pub fn set_sequence_number(&mut self, sequence_number: u8) {
        self.frame.sequence_number = sequence_number;
    }

    /// Number of DMX channels carried (property values minus the start code).
    pub fn channel_count(&self) -> usize {
        self.dmp.property_values.channels().len()
    }

    pub fn channels(&self) -> &[u8] {
        self.dmp.property_values.channels()
    }

    pub fn channels_mut(&mut self) -> &mut [u8] {
        self.dmp.property_values.channels_mut()
    }

    pub fn option(&self, option: PacketOption) -> bool {
        self.frame.options.contains(option)
    }

    pub fn set_option(&mut self, option: PacketOption, enabled: bool) {
        self.frame.options.set(option, enabled);
    }

    /// Total wire length of this packet.
    pub fn wire_len(&self) -> usize {
        layout::HEADER_LEN + self.dmp.property_values.as_bytes().len()
    }
}

/// Source name limited to 63 bytes of UTF-8, NUL-padded on the wire.
///
/// # Examples
/// ```
/// use e131_core::SourceName;
///
/// let long = "x".repeat(100);
/// assert_eq!(SourceName::new(&long).as_str().len(), SourceName::MAX_LEN);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SourceName(String);

impl SourceName {
    /// One byte of the 64-byte field is kept for the terminating NUL.
    pub const MAX_LEN: usize = layout::SOURCE_NAME_LEN - 1;

    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(Self::MAX_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self(name[..end].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<SourceName> for String {
    fn from(value: SourceName) -> Self {
        value.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named bits of the framing-layer options field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOption {
    /// Data is meant for visualisers, not live output.
    Preview,
    /// The source is ceasing transmission on this universe.
    Terminated,
}

impl PacketOption {
    pub const fn mask(self) -> u8 {
        match self {
            PacketOption::Preview => 0x80,
            PacketOption::Terminated => 0x40,
        }
    }
}

/// Framing-layer options bitmask. Unknown bits are preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(u8);

impl Options {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, option: PacketOption) -> bool {
        self.0 & option.mask() != 0
    }

    pub fn set(&mut self, option: PacketOption, enabled: bool) {
        if enabled {
            self.0 |= option.mask();
        } else {
            self.0 &= !option.mask();
        }
    }

    pub fn with(mut self, option: PacketOption) -> Self {
        self.set(option, true);
        self
    }
}

/// DMP property values: the start code followed by one level per channel.
///
/// Holds between 1 and 513 values; the length is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PropertyValues(Vec<u8>);

impl PropertyValues {
    /// Zero start code plus `channel_count` zeroed levels.
    pub fn zeroed(channel_count: usize) -> Result<Self, InvalidArgument> {
        if !(1..=layout::MAX_CHANNELS).contains(&channel_count) {
            return Err(InvalidArgument::ChannelCount(channel_count));
        }
        Ok(Self(vec![0; channel_count + 1]))
    }

    pub fn count(&self) -> u16 {
        self.0.len() as u16
    }

    pub fn start_code(&self) -> u8 {
        self.0.first().copied().unwrap_or(0)
    }

    pub fn channels(&self) -> &[u8] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn channels_mut(&mut self) -> &mut [u8] {
        self.0.get_mut(1..).unwrap_or(&mut [])
    }

    /// Sets the level of a 1-based channel.
    pub fn set_channel(&mut self, channel: usize, level: u8) -> Result<(), InvalidArgument> {
        let slot = channel
            .checked_sub(1)
            .and_then(|index| self.channels_mut().get_mut(index))
            .ok_or(InvalidArgument::Channel(channel))?;
        *slot = level;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for PropertyValues {
    type Error = InvalidArgument;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        if !(1..=layout::MAX_PROPERTY_VALUES).contains(&values.len()) {
            return Err(InvalidArgument::PropertyValueCount(values.len()));
        }
        Ok(Self(values))
    }
}

impl From<PropertyValues> for Vec<u8> {
    fn from(values: PropertyValues) -> Self {
        values.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_name_truncates_on_char_boundary() {
        let name = format!("{}é", "a".repeat(62));
        let truncated = SourceName::new(&name);
        assert_eq!(truncated.as_str(), "a".repeat(62));
    }

    #[test]
    fn options_set_and_clear_independently() {
        let mut options = Options::empty().with(PacketOption::Preview);
        assert!(options.contains(PacketOption::Preview));
        assert!(!options.contains(PacketOption::Terminated));
        options.set(PacketOption::Terminated, true);
        options.set(PacketOption::Preview, false);
        assert_eq!(options.bits(), 0x40);
    }

    #[test]
    fn unknown_option_bits_survive() {
        let mut options = Options::from_bits(0x21);
        options.set(PacketOption::Preview, true);
        assert_eq!(options.bits(), 0xA1);
    }

    #[test]
    fn property_values_keep_start_code_separate() {
        let mut values = PropertyValues::zeroed(4).unwrap();
        values.set_channel(1, 10).unwrap();
        values.set_channel(4, 40).unwrap();
        assert_eq!(values.count(), 5);
        assert_eq!(values.start_code(), 0);
        assert_eq!(values.channels(), &[10, 0, 0, 40]);
        assert_eq!(values.set_channel(0, 1), Err(InvalidArgument::Channel(0)));
        assert_eq!(values.set_channel(5, 1), Err(InvalidArgument::Channel(5)));
    }

    #[test]
    fn property_values_reject_out_of_range_lengths() {
        assert!(PropertyValues::zeroed(0).is_err());
        assert!(PropertyValues::zeroed(513).is_err());
        assert!(PropertyValues::try_from(Vec::new()).is_err());
        assert!(PropertyValues::try_from(vec![0; 514]).is_err());
        assert!(PropertyValues::try_from(vec![0; 513]).is_ok());
    }
}
