//! Foundation types for pairmerge.
//!
//! pairmerge merges two pre-sorted integer runs held by two workers that
//! never share memory. The workers talk through single-slot mailboxes and
//! append to one shared output sink. This crate holds the types every other
//! pairmerge crate agrees on.
//!
//! # Key Types
//!
//! - [`WorkerId`] — One of the two symmetric worker roles
//! - [`Phase`] — Position of a worker in its local protocol state machine
//! - [`Message`] — A `Chunk` or `Final` batch of checkpoints plus the separator flag
//! - [`PersistedState`] — The record a worker reloads at the start of every step
//! - [`WorkerStats`] — Per-instance counters reported to the coordinator

pub mod error;
pub mod identity;
pub mod message;
pub mod state;
pub mod stats;

pub use error::TypeError;
pub use identity::WorkerId;
pub use message::{Message, MessageTag, DEFAULT_CHUNK_SIZE};
pub use state::{PersistedState, Phase};
pub use stats::WorkerStats;
