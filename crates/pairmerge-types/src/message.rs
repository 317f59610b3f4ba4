use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Default upper bound on checkpoints carried by one message.
pub const DEFAULT_CHUNK_SIZE: usize = 11;

/// Kind of protocol message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTag {
    /// The next unsent slice of the sender's run. The sender expects a reply.
    Chunk,
    /// The sender has exhausted its run. Carries any still-unsent tail.
    Final,
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chunk => write!(f, "chunk"),
            Self::Final => write!(f, "final"),
        }
    }
}

impl FromStr for MessageTag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chunk" => Ok(Self::Chunk),
            "final" => Ok(Self::Final),
            other => Err(TypeError::InvalidTag(other.into())),
        }
    }
}

/// A single protocol message between the two workers.
///
/// Checkpoints are values taken from the sender's run, in ascending order.
/// The receiver writes each of them to the output sink at its sorted
/// position relative to its own run. `separator_seen` records whether
/// anything has been written to the shared sink yet, so the receiver knows
/// whether its next value needs a leading delimiter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub tag: MessageTag,
    pub checkpoints: Vec<i64>,
    pub separator_seen: bool,
}

impl Message {
    pub fn chunk(checkpoints: Vec<i64>, separator_seen: bool) -> Self {
        Self {
            tag: MessageTag::Chunk,
            checkpoints,
            separator_seen,
        }
    }

    pub fn final_with(checkpoints: Vec<i64>, separator_seen: bool) -> Self {
        Self {
            tag: MessageTag::Final,
            checkpoints,
            separator_seen,
        }
    }

    /// A `Final` carrying no checkpoints: the pure completion acknowledgment.
    pub fn ack(separator_seen: bool) -> Self {
        Self::final_with(Vec::new(), separator_seen)
    }

    pub fn is_final(&self) -> bool {
        self.tag == MessageTag::Final
    }

    /// Returns `true` if the checkpoints are in non-decreasing order.
    pub fn is_ordered(&self) -> bool {
        self.checkpoints.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_tag() {
        assert_eq!(Message::chunk(vec![1], false).tag, MessageTag::Chunk);
        assert!(Message::final_with(vec![1, 2], true).is_final());
        let ack = Message::ack(true);
        assert!(ack.is_final());
        assert!(ack.checkpoints.is_empty());
        assert!(ack.separator_seen);
    }

    #[test]
    fn ordering_check() {
        assert!(Message::chunk(vec![], false).is_ordered());
        assert!(Message::chunk(vec![1, 1, 3], false).is_ordered());
        assert!(!Message::chunk(vec![4, 2], false).is_ordered());
    }

    #[test]
    fn tag_parse_and_display() {
        assert_eq!("chunk".parse::<MessageTag>().unwrap(), MessageTag::Chunk);
        assert_eq!(MessageTag::Final.to_string(), "final");
        assert!("UNLO".parse::<MessageTag>().is_err());
    }

    #[test]
    fn serde_json_shape() {
        let msg = Message::chunk(vec![3, 5], true);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
