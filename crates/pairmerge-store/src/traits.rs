use pairmerge_types::{Message, PersistedState, WorkerId};

use crate::error::StoreResult;

/// Named single-slot mailboxes.
///
/// Implementations must satisfy:
/// - A slot holds at most one message. `write` replaces whatever is pending.
/// - `read` returns the pending message and clears the slot in one call.
/// - An empty slot is a legal outcome of `read`, not an error.
pub trait MailboxTransport: Send + Sync {
    /// Store `message` in `slot`, overwriting any pending message.
    fn write(&self, slot: &str, message: &Message) -> StoreResult<()>;

    /// Consume the pending message in `slot`, if any.
    fn read(&self, slot: &str) -> StoreResult<Option<Message>>;

    /// Drop any pending message in `slot`. Clearing an empty slot is a no-op.
    fn clear(&self, slot: &str) -> StoreResult<()>;
}

/// Append-only destination for merged output.
///
/// Shared by both workers. There is no seek and no truncate: once a job is
/// running, bytes only ever go on the end.
pub trait OutputSink: Send + Sync {
    fn append(&self, bytes: &[u8]) -> StoreResult<()>;
}

/// Per-worker persisted state, keyed by worker identity.
pub trait StateStore: Send + Sync {
    /// Load the state last saved for `worker`. `Ok(None)` if never saved.
    fn load(&self, worker: WorkerId) -> StoreResult<Option<PersistedState>>;

    /// Replace the state for `worker`.
    fn save(&self, worker: WorkerId, state: &PersistedState) -> StoreResult<()>;

    /// Forget the state for `worker`, so the next load starts fresh.
    fn clear(&self, worker: WorkerId) -> StoreResult<()>;
}
