//! Sequence-number acceptance for receive streams.
//!
//! One [`SequenceTracker`] exists per stream identity ([`StreamKey`]). A
//! packet whose sequence number falls 1 to 20 steps behind the last accepted
//! one (8-bit wraparound) is stale and discarded; anything else, including
//! repeats of the same number and forward jumps over lost packets, is
//! accepted and becomes the new reference.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::packet::Packet;

/// Oldest backwards step still treated as stale.
pub const STALE_WINDOW: i8 = -20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Discard,
}

/// Per-identity acceptance state over the 8-bit sequence number.
///
/// # Examples
/// ```
/// use e131_core::{Decision, SequenceTracker};
///
/// let mut tracker = SequenceTracker::new();
/// assert_eq!(tracker.admit(1), Decision::Accept);
/// assert_eq!(tracker.admit(0), Decision::Discard);
/// assert_eq!(tracker.last_seen(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    last_seen: u8,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_seen(last_seen: u8) -> Self {
        Self { last_seen }
    }

    pub fn last_seen(&self) -> u8 {
        self.last_seen
    }

    /// Signed wraparound distance from the last accepted number.
    pub fn distance(&self, seq: u8) -> i8 {
        seq.wrapping_sub(self.last_seen) as i8
    }

    pub fn admit(&mut self, seq: u8) -> Decision {
        let diff = self.distance(seq);
        if (STALE_WINDOW..=-1).contains(&diff) {
            return Decision::Discard;
        }
        self.last_seen = seq;
        Decision::Accept
    }
}

/// Identity of a receive stream: sending component and universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamKey {
    pub universe: u16,
    pub cid: [u8; 16],
}

impl StreamKey {
    pub fn of(packet: &Packet) -> Self {
        Self {
            universe: packet.frame.universe,
            cid: packet.root.cid,
        }
    }

    pub fn cid_hex(&self) -> String {
        self.cid.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.cid_hex(), self.universe)
    }
}
