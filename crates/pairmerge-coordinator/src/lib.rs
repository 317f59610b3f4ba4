//! Turn-based coordinator for pairmerge.
//!
//! The [`Coordinator`] alternates two [`Participant`]s, one step each per
//! round, until both report completion or the step budget runs out. It has
//! no merge knowledge: the budget only turns a livelock into a reported
//! failure instead of a hang.
//!
//! [`MergeJob`] wires two [`MergeWorker`](pairmerge_worker::MergeWorker)s
//! crosswise over shared stores, and [`JobDir`] lays a job out on disk.

pub mod coordinator;
pub mod job;
pub mod report;

pub use coordinator::{Coordinator, Participant, DEFAULT_MAX_STEPS};
pub use job::{JobDir, MergeJob};
pub use report::MergeReport;
