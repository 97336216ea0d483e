//! Receive pipeline: validate, decode, then sequence-filter datagrams.
//!
//! A [`Receiver`] never fails on a bad packet. Invalid, malformed and stale
//! datagrams are counted, logged at debug/trace level and skipped; only
//! transport errors are returned to the caller.
//!
//! Per-stream state is bounded: once the stream limit is reached, the stream
//! idle for longest is evicted to make room for a new one.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::packet::layout::MAX_PACKET_LEN;
use crate::packet::{DecodeError, Packet, SourceName, decode};
use crate::sequence::{Decision, SequenceTracker, StreamKey};
use crate::stats::{ReceiveSummary, StreamStats, build_stream_summary};
use crate::transport::{Transport, TransportError};
use crate::validate::{ProtocolError, validate};

/// Streams tracked at once by [`Receiver::new`].
pub const DEFAULT_STREAM_LIMIT: usize = 1024;

/// Accepted packet together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub packet: Packet,
    pub from: SocketAddr,
    pub key: StreamKey,
}

/// Classification of one inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Accepted(Received),
    Stale {
        key: StreamKey,
        sequence_number: u8,
        last_seen: u8,
    },
    Malformed(DecodeError),
    Invalid(ProtocolError),
}

#[derive(Debug, Default)]
struct StreamState {
    tracker: SequenceTracker,
    stats: StreamStats,
    source_name: SourceName,
    /// Datagram counter value when this stream last sent a valid packet.
    last_active: u64,
}

pub struct Receiver<T> {
    transport: T,
    streams: HashMap<StreamKey, StreamState>,
    stream_limit: usize,
    datagrams: u64,
    malformed: u64,
    invalid: u64,
    evicted: u64,
}

impl<T: Transport> Receiver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_stream_limit(transport, DEFAULT_STREAM_LIMIT)
    }

    /// Receiver tracking at most `limit` streams (at least one).
    pub fn with_stream_limit(transport: T, limit: usize) -> Self {
        Self {
            transport,
            streams: HashMap::new(),
            stream_limit: limit.max(1),
            datagrams: 0,
            malformed: 0,
            invalid: 0,
            evicted: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receives one datagram and classifies it.
    pub fn recv_once(&mut self) -> Result<ReceiveOutcome, TransportError> {
        let mut buf = [0u8; MAX_PACKET_LEN];
        let (len, from) = self.transport.recv(&mut buf)?;
        let bytes = buf.get(..len).unwrap_or(&buf);
        Ok(self.process(bytes, from))
    }

    /// Blocks until a packet is accepted, skipping everything else.
    pub fn next_accepted(&mut self) -> Result<Received, TransportError> {
        loop {
            if let ReceiveOutcome::Accepted(received) = self.recv_once()? {
                return Ok(received);
            }
        }
    }

    /// Classifies `bytes` and updates per-stream state.
    ///
    /// Sequence state only changes for packets that pass validation and
    /// decoding.
    pub fn process(&mut self, bytes: &[u8], from: SocketAddr) -> ReceiveOutcome {
        self.datagrams += 1;

        if let Err(err) = validate(bytes) {
            self.invalid += 1;
            log::debug!("rx: invalid packet from {}: {}", from, err);
            return ReceiveOutcome::Invalid(err);
        }
        let packet = match decode(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                self.malformed += 1;
                log::debug!("rx: malformed packet from {}: {}", from, err);
                return ReceiveOutcome::Malformed(err);
            }
        };

        let key = StreamKey::of(&packet);
        if !self.streams.contains_key(&key) && self.streams.len() >= self.stream_limit {
            self.evict_idle_stream();
        }
        let state = self.streams.entry(key).or_default();
        state.last_active = self.datagrams;
        let sequence_number = packet.sequence_number();
        match state.tracker.admit(sequence_number) {
            Decision::Accept => {
                state.stats.record_accept(sequence_number);
                if state.source_name != packet.frame.source_name {
                    state.source_name = packet.frame.source_name.clone();
                }
                ReceiveOutcome::Accepted(Received { packet, from, key })
            }
            Decision::Discard => {
                state.stats.record_discard();
                let last_seen = state.tracker.last_seen();
                log::trace!(
                    "rx: stale packet {} on {} (last {})",
                    sequence_number,
                    key,
                    last_seen
                );
                ReceiveOutcome::Stale {
                    key,
                    sequence_number,
                    last_seen,
                }
            }
        }
    }

    fn evict_idle_stream(&mut self) {
        let idle = self
            .streams
            .iter()
            .min_by_key(|(_, state)| state.last_active)
            .map(|(key, _)| *key);
        if let Some(key) = idle {
            self.streams.remove(&key);
            self.evicted += 1;
            log::debug!("rx: stream limit reached, evicted idle stream {}", key);
        }
    }

    pub fn stream_stats(&self, key: &StreamKey) -> Option<&StreamStats> {
        self.streams.get(key).map(|state| &state.stats)
    }

    /// Counters for every stream seen so far, ordered by universe then CID.
    pub fn summary(&self) -> ReceiveSummary {
        let mut keys: Vec<&StreamKey> = self.streams.keys().collect();
        keys.sort();
        let streams = keys
            .into_iter()
            .filter_map(|key| {
                self.streams.get(key).map(|state| {
                    build_stream_summary(
                        key,
                        state.source_name.as_str(),
                        state.tracker.last_seen(),
                        &state.stats,
                    )
                })
            })
            .collect();

        ReceiveSummary {
            datagrams: self.datagrams,
            malformed: self.malformed,
            invalid: self.invalid,
            evicted_streams: self.evicted,
            streams,
        }
    }
}
