use std::sync::Arc;

use pairmerge_store::{MailboxTransport, OutputSink, StateStore};
use pairmerge_types::WorkerId;

/// Everything a worker touches outside its own run.
#[derive(Clone)]
pub struct WorkerEnv {
    pub transport: Arc<dyn MailboxTransport>,
    /// Slot this worker reads from.
    pub inbox: String,
    /// Slot this worker writes to.
    pub outbox: String,
    pub sink: Arc<dyn OutputSink>,
    pub states: Arc<dyn StateStore>,
}

impl WorkerEnv {
    /// Wire `worker` to the conventional crosswise slots: it reads
    /// `<peer>_to_<self>` and writes `<self>_to_<peer>`.
    pub fn crosswise(
        worker: WorkerId,
        transport: Arc<dyn MailboxTransport>,
        sink: Arc<dyn OutputSink>,
        states: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            transport,
            inbox: worker.inbound_slot(),
            outbox: worker.outbound_slot(),
            sink,
            states,
        }
    }
}

impl std::fmt::Debug for WorkerEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerEnv")
            .field("inbox", &self.inbox)
            .field("outbox", &self.outbox)
            .finish_non_exhaustive()
    }
}
