use serde::{Deserialize, Serialize};

use pairmerge_store::DEFAULT_DELIMITER;
use pairmerge_types::DEFAULT_CHUNK_SIZE;

use crate::error::{WorkerError, WorkerResult};

/// Tunables shared by both workers of a job.
///
/// Both sides must agree on `chunk_size`: a message carrying more
/// checkpoints than the receiver's `chunk_size` is a protocol violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of checkpoints per message (K).
    pub chunk_size: usize,
    /// Written between consecutive values in the output sink.
    pub delimiter: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delimiter: DEFAULT_DELIMITER.into(),
        }
    }
}

impl WorkerConfig {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.chunk_size == 0 {
            return Err(WorkerError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if self.delimiter.is_empty() {
            return Err(WorkerError::InvalidConfig("delimiter must not be empty".into()));
        }
        // Signs and digits would run into the values and make the output
        // unparseable.
        if let Some(c) = self
            .delimiter
            .chars()
            .find(|c| c.is_ascii_digit() || *c == '-' || *c == '+')
        {
            return Err(WorkerError::InvalidConfig(format!(
                "delimiter {:?} must not contain {c:?}",
                self.delimiter
            )));
        }
        Ok(())
    }
}
