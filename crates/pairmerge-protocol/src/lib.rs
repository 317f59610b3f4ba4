//! Wire encoding for pairmerge mailbox messages.
//!
//! A mailbox slot holds exactly one encoded [`Message`](pairmerge_types::Message).
//! The encoding keeps tag, checkpoints and separator flag together as one
//! unit, so overwriting a slot always replaces all three.

pub mod codec;
pub mod error;

pub use codec::{MessageCodec, MAX_FRAME_SIZE};
pub use error::{ProtocolError, ProtocolResult};
