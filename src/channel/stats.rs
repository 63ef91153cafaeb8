//! Point-in-time channel statistics

use serde::Serialize;

/// Snapshot of one channel's counters and gauges
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Channel name
    pub name: String,
    /// Partition index, `None` for standalone channels
    pub partition: Option<usize>,
    /// Configured capacity
    pub capacity: usize,
    /// Messages currently queued and not yet taken by a reader
    pub buffered: usize,
    /// Messages published but not yet recorded as processed or failed
    pub queue_depth: usize,
    /// Total messages published
    pub published: u64,
    /// Total messages handled successfully
    pub processed: u64,
    /// Total messages whose handler failed
    pub failed: u64,
    /// Whether the channel has been completed
    pub completed: bool,
}

impl ChannelStats {
    /// Messages taken by a reader but not yet recorded
    pub fn in_flight(&self) -> usize {
        self.queue_depth.saturating_sub(self.buffered)
    }

    /// True once every published message has been recorded
    pub fn is_drained(&self) -> bool {
        self.queue_depth == 0 && self.published == self.processed + self.failed
    }
}

/// Totals across a set of channel snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsTotals {
    pub published: u64,
    pub processed: u64,
    pub failed: u64,
    pub queue_depth: usize,
}

impl StatsTotals {
    pub fn from_stats<'a>(stats: impl IntoIterator<Item = &'a ChannelStats>) -> Self {
        stats.into_iter().fold(Self::default(), |mut totals, s| {
            totals.published += s.published;
            totals.processed += s.processed;
            totals.failed += s.failed;
            totals.queue_depth += s.queue_depth;
            totals
        })
    }
}
