use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid worker id: {0}")]
    InvalidWorkerId(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid message tag: {0}")]
    InvalidTag(String),
}
