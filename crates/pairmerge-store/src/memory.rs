use std::collections::HashMap;
use std::sync::RwLock;

use pairmerge_types::{Message, PersistedState, WorkerId};

use crate::error::StoreResult;
use crate::traits::{MailboxTransport, OutputSink, StateStore};

/// In-memory mailbox slots, keyed by slot name.
pub struct InMemoryMailbox {
    slots: RwLock<HashMap<String, Message>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Look at the pending message in `slot` without consuming it.
    pub fn peek(&self, slot: &str) -> Option<Message> {
        self.slots.read().expect("lock poisoned").get(slot).cloned()
    }

    /// Number of slots currently holding a message.
    pub fn pending(&self) -> usize {
        self.slots.read().expect("lock poisoned").len()
    }
}

impl Default for InMemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MailboxTransport for InMemoryMailbox {
    fn write(&self, slot: &str, message: &Message) -> StoreResult<()> {
        let mut slots = self.slots.write().expect("lock poisoned");
        slots.insert(slot.to_string(), message.clone());
        Ok(())
    }

    fn read(&self, slot: &str) -> StoreResult<Option<Message>> {
        let mut slots = self.slots.write().expect("lock poisoned");
        Ok(slots.remove(slot))
    }

    fn clear(&self, slot: &str) -> StoreResult<()> {
        self.slots.write().expect("lock poisoned").remove(slot);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryMailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMailbox")
            .field("pending", &self.pending())
            .finish()
    }
}

/// In-memory append-only byte buffer.
#[derive(Debug, Default)]
pub struct InMemorySink {
    bytes: RwLock<Vec<u8>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.read().expect("lock poisoned")).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for InMemorySink {
    fn append(&self, bytes: &[u8]) -> StoreResult<()> {
        self.bytes.write().expect("lock poisoned").extend_from_slice(bytes);
        Ok(())
    }
}

/// In-memory state store.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: RwLock<HashMap<WorkerId, PersistedState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self, worker: WorkerId) -> StoreResult<Option<PersistedState>> {
        Ok(self.states.read().expect("lock poisoned").get(&worker).copied())
    }

    fn save(&self, worker: WorkerId, state: &PersistedState) -> StoreResult<()> {
        self.states.write().expect("lock poisoned").insert(worker, *state);
        Ok(())
    }

    fn clear(&self, worker: WorkerId) -> StoreResult<()> {
        self.states.write().expect("lock poisoned").remove(&worker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairmerge_types::Phase;

    #[test]
    fn read_consumes_the_slot() {
        let mailbox = InMemoryMailbox::new();
        mailbox.write("A_to_B", &Message::chunk(vec![1, 2], false)).unwrap();
        assert_eq!(mailbox.pending(), 1);

        let msg = mailbox.read("A_to_B").unwrap().expect("should exist");
        assert_eq!(msg.checkpoints, vec![1, 2]);
        assert!(mailbox.read("A_to_B").unwrap().is_none());
        assert_eq!(mailbox.pending(), 0);
    }

    #[test]
    fn write_overwrites_pending() {
        let mailbox = InMemoryMailbox::new();
        mailbox.write("s", &Message::chunk(vec![1], false)).unwrap();
        mailbox.write("s", &Message::ack(true)).unwrap();
        let msg = mailbox.read("s").unwrap().unwrap();
        assert!(msg.is_final());
        assert!(msg.separator_seen);
    }

    #[test]
    fn slots_are_independent() {
        let mailbox = InMemoryMailbox::new();
        mailbox.write("A_to_B", &Message::chunk(vec![1], false)).unwrap();
        assert!(mailbox.read("B_to_A").unwrap().is_none());
        assert!(mailbox.peek("A_to_B").is_some());
    }

    #[test]
    fn clear_empties_slot() {
        let mailbox = InMemoryMailbox::new();
        mailbox.write("s", &Message::chunk(vec![1], false)).unwrap();
        mailbox.clear("s").unwrap();
        mailbox.clear("s").unwrap();
        assert!(mailbox.read("s").unwrap().is_none());
    }

    #[test]
    fn sink_appends_in_order() {
        let sink = InMemorySink::new();
        assert!(sink.is_empty());
        sink.append(b"1, 2").unwrap();
        sink.append(b", 3").unwrap();
        assert_eq!(sink.contents(), "1, 2, 3");
        assert_eq!(sink.len(), 7);
    }

    #[test]
    fn state_store_roundtrip() {
        let store = InMemoryStateStore::new();
        assert!(store.load(WorkerId::A).unwrap().is_none());

        let mut state = PersistedState::initial(3);
        state.phase = Phase::AwaitingPeer;
        store.save(WorkerId::A, &state).unwrap();
        assert_eq!(store.load(WorkerId::A).unwrap(), Some(state));
        assert!(store.load(WorkerId::B).unwrap().is_none());

        store.clear(WorkerId::A).unwrap();
        assert!(store.load(WorkerId::A).unwrap().is_none());
    }
}
