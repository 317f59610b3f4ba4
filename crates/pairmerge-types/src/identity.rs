use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a merge worker.
///
/// The protocol is symmetric: neither role is privileged, and either one may
/// make the first move. The roles only name the two ends of the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkerId {
    A,
    B,
}

impl WorkerId {
    /// The other end of the channel.
    pub fn peer(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Lower-case form used in file and slot names.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }

    /// Name of the mailbox slot carrying messages from `self` to its peer.
    pub fn outbound_slot(self) -> String {
        format!("{}_to_{}", self, self.peer())
    }

    /// Name of the mailbox slot carrying messages from the peer to `self`.
    pub fn inbound_slot(self) -> String {
        self.peer().outbound_slot()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

impl FromStr for WorkerId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Self::A),
            "b" | "B" => Ok(Self::B),
            other => Err(TypeError::InvalidWorkerId(other.into())),
        }
    }
}
