use serde::{Deserialize, Serialize};

use pairmerge_types::WorkerStats;

/// Outcome of a coordinated run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Both workers finished within the step budget.
    pub success: bool,
    pub total_steps: usize,
    pub stats_a: WorkerStats,
    pub stats_b: WorkerStats,
}

impl MergeReport {
    pub fn combined_stats(&self) -> WorkerStats {
        self.stats_a.combined(&self.stats_b)
    }
}
