use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Position of a worker in its local protocol state machine.
///
/// ```text
/// Init ──► AwaitingPeer ──► Unlocked ──► AwaitingPeer ...
///   │                           │
///   └──────────► Finished ◄─────┘
/// ```
///
/// `Unlocked` only exists inside a step: a worker that receives a reply
/// while `AwaitingPeer` unlocks and, in the same call, either sends its next
/// chunk (back to `AwaitingPeer`) or finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No message exchanged yet.
    Init,
    /// A chunk was sent; no output and no send until one reply is consumed.
    AwaitingPeer,
    /// A reply is in hand; the worker may emit and prepare its next chunk.
    Unlocked,
    /// Terminal.
    Finished,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self == Self::Finished
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::AwaitingPeer => write!(f, "awaiting-peer"),
            Self::Unlocked => write!(f, "unlocked"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for Phase {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Self::Init),
            "awaiting-peer" => Ok(Self::AwaitingPeer),
            "unlocked" => Ok(Self::Unlocked),
            "finished" => Ok(Self::Finished),
            other => Err(TypeError::InvalidPhase(other.into())),
        }
    }
}

/// The record a worker persists at the end of every step.
///
/// Together with the immutable run (re-supplied by the caller) this is
/// enough to resume the worker deterministically after a restart.
///
/// - `emit_cursor` is the index of the next own value that is still owed to
///   the sink: everything before it was either written by this worker or
///   announced to the peer, which then owns writing it.
/// - `announce_cursor` is the end of the last slice announced to the peer.
///   The value just before it is the floor for every checkpoint the peer
///   may still send: anything smaller is rejected as a protocol violation.
///   `emit_cursor` cannot stand in for it, since emission moves past the
///   announced slice on the next reply.
///
/// Valid states satisfy `announce_cursor <= emit_cursor <= run_length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub phase: Phase,
    pub emit_cursor: usize,
    /// Bounds incoming checkpoints from below; see the type docs.
    pub announce_cursor: usize,
    pub run_length: usize,
}

impl PersistedState {
    /// State of a worker that has not run yet.
    pub fn initial(run_length: usize) -> Self {
        Self {
            phase: Phase::Init,
            emit_cursor: 0,
            announce_cursor: 0,
            run_length,
        }
    }

    /// Number of own values not yet written nor announced.
    pub fn remaining(&self) -> usize {
        self.run_length.saturating_sub(self.emit_cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.emit_cursor >= self.run_length
    }

    /// Check the cursor invariants.
    pub fn cursors_valid(&self) -> bool {
        self.announce_cursor <= self.emit_cursor && self.emit_cursor <= self.run_length
    }
}
