//! E1.31 (Streaming ACN) packet codec and stream logic.
//!
//! This crate builds, encodes, validates and decodes E1.31 data packets and
//! decides which inbound packets of a stream to keep. Packets carry up to
//! 512 DMX levels for one universe inside three nested layers (root,
//! framing, DMP) with big-endian fields and packed `flength` words.
//!
//! Layers of the crate:
//! - `packet`: data model, wire `layout`, bounds-checked codec, builder.
//! - `validate`: classified structural checks on inbound bytes.
//! - `sequence` / `stats`: per-stream sequence acceptance and loss counters.
//! - `address`: unicast and multicast destinations.
//! - `transport`: the datagram seam, with a standard UDP implementation.
//! - `sender` / `receiver`: sequence-serialised sending and a receive
//!   pipeline that skips bad packets instead of failing.
//!
//! Invariants:
//! - Encoded packets are exactly `125 + property_value_count` bytes long.
//! - Every `flength` agrees with the span it describes.
//! - Sequence state only moves on accepted packets.
//!
//! Version française (résumé):
//! Cette crate construit, encode, valide et décode les paquets E1.31, puis
//! filtre les flux entrants par numéro de séquence (fenêtre de 20 paquets en
//! arrière). Les E/S réseau restent derrière le trait `Transport`.
//!
//! # Examples
//! ```
//! use e131_core::{Decision, PacketBuilder, SequenceTracker, decode, encode, validate};
//!
//! let mut packet = PacketBuilder::new(1, 3).source_name("desk").build()?;
//! packet.channels_mut().copy_from_slice(&[255, 128, 0]);
//! let bytes = encode(&packet);
//!
//! validate(&bytes)?;
//! let decoded = decode(&bytes)?;
//! assert_eq!(decoded, packet);
//!
//! let mut tracker = SequenceTracker::new();
//! assert_eq!(tracker.admit(decoded.sequence_number()), Decision::Accept);
//! # Ok::<(), e131_core::Error>(())
//! ```

pub mod address;
mod error;
pub mod packet;
mod receiver;
mod sender;
pub mod sequence;
mod stats;
pub mod transport;
pub mod validate;

pub use address::{DEFAULT_PORT, Destination, ResolutionError, multicast_group};
pub use error::{Error, InvalidArgument};
pub use packet::builder::{DEFAULT_PRIORITY, MAX_PRIORITY, MAX_UNIVERSE, MIN_UNIVERSE};
pub use packet::layout::{MAX_CHANNELS, MAX_PACKET_LEN};
pub use packet::{
    DecodeError, DmpLayer, EncodeError, FrameLayer, Layer, Options, Packet, PacketBuilder,
    PacketOption, PropertyValues, RootLayer, SourceName, decode, encode, encode_into,
};
pub use receiver::{DEFAULT_STREAM_LIMIT, ReceiveOutcome, Received, Receiver};
pub use sender::{Sender, TERMINATE_REPEAT};
pub use sequence::{Decision, SequenceTracker, StreamKey};
pub use stats::{ReceiveSummary, StreamStats, StreamSummary};
pub use transport::{Transport, TransportError, UdpTransport};
pub use validate::{ProtocolError, validate, validate_packet};
