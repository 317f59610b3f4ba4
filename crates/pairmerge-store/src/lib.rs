//! Environment collaborators for pairmerge workers.
//!
//! A merge worker touches the outside world through three interfaces and
//! nothing else:
//!
//! - [`MailboxTransport`] -- named single-slot mailboxes: a write replaces
//!   the pending message, a read consumes it
//! - [`OutputSink`] -- one append-only byte stream shared by both workers
//! - [`StateStore`] -- one persisted [`PersistedState`](pairmerge_types::PersistedState)
//!   per worker, surviving process restarts
//!
//! # Backends
//!
//! - [`InMemoryMailbox`], [`InMemorySink`], [`InMemoryStateStore`] -- for
//!   tests and embedding
//! - [`FileMailbox`], [`FileSink`], [`FileStateStore`] -- one file per slot,
//!   one output file, one JSON document per worker
//!
//! # Design Rules
//!
//! 1. Slots hold at most one message; writing overwrites, reading deletes.
//! 2. The sink is append-only: no seek, no truncate once a job is running.
//! 3. Slot and state files are replaced atomically (temp file + rename), so
//!    a crash never leaves a half-written message or state behind.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod output;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileMailbox, FileSink, FileStateStore};
pub use memory::{InMemoryMailbox, InMemorySink, InMemoryStateStore};
pub use output::{parse_values, DEFAULT_DELIMITER};
pub use traits::{MailboxTransport, OutputSink, StateStore};
