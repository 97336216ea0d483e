use serde::Serialize;

use crate::sequence::StreamKey;

/// Loss and reorder counters for one stream.
///
/// Loss is inferred from forward sequence gaps; a burst is a run of
/// consecutive gaps without an in-order packet in between.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub accepted: u64,
    pub discarded: u64,
    pub lost: u64,
    pub burst_count: u64,
    pub max_burst_len: u64,
    #[serde(skip)]
    current_burst: u64,
    #[serde(skip)]
    last_accepted: Option<u8>,
}

impl StreamStats {
    pub(crate) fn record_accept(&mut self, seq: u8) {
        self.accepted += 1;
        if let Some(last) = self.last_accepted {
            let expected = last.wrapping_add(1);
            let gap = seq.wrapping_sub(expected) as u16;
            if gap > 0 && gap < 128 {
                self.lost += gap as u64;
                if self.current_burst == 0 {
                    self.burst_count += 1;
                }
                self.current_burst += gap as u64;
                if self.current_burst > self.max_burst_len {
                    self.max_burst_len = self.current_burst;
                }
            } else {
                self.current_burst = 0;
            }
        }
        self.last_accepted = Some(seq);
    }

    pub(crate) fn record_discard(&mut self) {
        self.discarded += 1;
    }
}

/// Per-stream entry of a [`ReceiveSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSummary {
    pub universe: u16,
    pub cid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub last_sequence: u8,
    #[serde(flatten)]
    pub stats: StreamStats,
    /// `lost / (accepted + lost)`, when anything was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_rate: Option<f64>,
}

/// Snapshot of everything a receiver has seen, in stable order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiveSummary {
    pub datagrams: u64,
    pub malformed: u64,
    pub invalid: u64,
    /// Streams dropped to stay within the receiver's stream limit.
    pub evicted_streams: u64,
    pub streams: Vec<StreamSummary>,
}

pub(crate) fn build_stream_summary(
    key: &StreamKey,
    source_name: &str,
    last_sequence: u8,
    stats: &StreamStats,
) -> StreamSummary {
    let denom = stats.accepted + stats.lost;
    let loss_rate = if denom > 0 {
        Some(stats.lost as f64 / denom as f64)
    } else {
        None
    };
    StreamSummary {
        universe: key.universe,
        cid: key.cid_hex(),
        source_name: if source_name.is_empty() {
            None
        } else {
            Some(source_name.to_string())
        },
        last_sequence,
        stats: stats.clone(),
        loss_rate,
    }
}
