use std::path::PathBuf;

use pairmerge_types::WorkerId;

/// Errors from mailbox, sink, and state store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A slot held bytes that are not a valid message.
    #[error("corrupt message in slot {slot}: {source}")]
    CorruptMessage {
        slot: String,
        #[source]
        source: pairmerge_protocol::ProtocolError,
    },

    /// Message encoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] pairmerge_protocol::ProtocolError),

    /// A persisted state document could not be decoded.
    #[error("corrupt state for worker {worker}: {reason}")]
    CorruptState { worker: WorkerId, reason: String },

    /// Serialization of a state document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Slot names must be non-empty and must not contain path separators.
    #[error("invalid slot name: {0:?}")]
    InvalidSlot(String),

    /// The output contains something that is not an integer.
    #[error("malformed output value {value:?}")]
    MalformedOutput { value: String },

    /// The backing directory does not exist.
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
