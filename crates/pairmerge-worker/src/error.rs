use pairmerge_store::StoreError;
use pairmerge_types::WorkerId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid worker config: {0}")]
    InvalidConfig(String),

    #[error("run for worker {worker} is not sorted at index {index}")]
    UnsortedRun { worker: WorkerId, index: usize },

    #[error("persisted state for worker {worker} covers {persisted} values, run has {actual}")]
    RunLengthMismatch {
        worker: WorkerId,
        persisted: usize,
        actual: usize,
    },

    #[error("corrupt persisted state for worker {worker}: {reason}")]
    CorruptState { worker: WorkerId, reason: String },

    #[error("protocol violation received by worker {worker}: {reason}")]
    ProtocolViolation { worker: WorkerId, reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkerError {
    /// Configuration errors are fatal: the worker cannot be resumed from
    /// what it was given.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::UnsortedRun { .. }
                | Self::RunLengthMismatch { .. }
                | Self::CorruptState { .. }
                | Self::Store(StoreError::CorruptState { .. })
        )
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
