//! Merge worker for pairmerge.
//!
//! A [`MergeWorker`] owns one sorted run and merges it with a peer's run
//! that it never sees in full. Each call to [`MergeWorker::step`] does a
//! bounded amount of work: read at most one message, append zero or more
//! values to the shared sink, persist state, write at most one message.
//!
//! The peer announces slices of its run as checkpoints. For each checkpoint
//! the worker writes its own values that sort strictly before it, then the
//! checkpoint itself. Handing the announced values to the receiver this way
//! places every value at its sorted position without either side holding
//! the other's data.

pub mod config;
pub mod env;
pub mod error;
pub mod worker;

pub use config::WorkerConfig;
pub use env::WorkerEnv;
pub use error::{WorkerError, WorkerResult};
pub use worker::{MergeWorker, StepOutcome};
