use serde::{Deserialize, Serialize};

/// Counters accumulated by one worker instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Own-run comparisons against peer checkpoints.
    pub comparisons: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    /// Values written to the output sink, own and peer-announced.
    pub values_emitted: u64,
}

impl WorkerStats {
    /// Sum two sets of counters.
    pub fn combined(&self, other: &Self) -> Self {
        Self {
            comparisons: self.comparisons + other.comparisons,
            messages_sent: self.messages_sent + other.messages_sent,
            messages_received: self.messages_received + other.messages_received,
            values_emitted: self.values_emitted + other.values_emitted,
        }
    }
}
