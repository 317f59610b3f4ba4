use pairmerge_types::{Message, MessageTag};

use crate::error::{ProtocolError, ProtocolResult};

/// Upper bound on an encoded payload. A chunk holds a handful of integers;
/// anything near this size is a corrupt slot.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

const SEPARATOR_BIT: u8 = 0x01;
const CHUNK_TAG: u8 = 0x02;
const FINAL_TAG: u8 = 0x04;

/// Codec for mailbox messages.
///
/// Frame layout: `[4 bytes len][1 byte tag][payload]`, where `len` counts
/// the tag byte plus payload. The tag byte folds the separator flag into
/// its low bit; the payload is the bincode-encoded checkpoint list.
pub struct MessageCodec;

impl MessageCodec {
    pub fn encode(msg: &Message) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(&msg.checkpoints)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(4 + 1 + payload.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(Self::tag_byte(msg));
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode one framed message. Trailing bytes are rejected: a slot holds
    /// exactly one message.
    pub fn decode(data: &[u8]) -> ProtocolResult<Message> {
        if data.len() < 5 {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[0..4]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: len - 1,
                max: MAX_FRAME_SIZE,
            });
        }
        let total = 4 + len;
        if data.len() != total {
            return Err(ProtocolError::FramingError(format!(
                "length mismatch: have {}, need {}",
                data.len(),
                total
            )));
        }
        let (tag, separator_seen) = Self::parse_tag_byte(data[4])?;
        let checkpoints: Vec<i64> = bincode::deserialize(&data[5..total])
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(Message {
            tag,
            checkpoints,
            separator_seen,
        })
    }

    pub fn tag_byte(msg: &Message) -> u8 {
        let tag = match msg.tag {
            MessageTag::Chunk => CHUNK_TAG,
            MessageTag::Final => FINAL_TAG,
        };
        if msg.separator_seen {
            tag | SEPARATOR_BIT
        } else {
            tag
        }
    }

    pub fn parse_tag_byte(byte: u8) -> ProtocolResult<(MessageTag, bool)> {
        let separator_seen = byte & SEPARATOR_BIT != 0;
        match byte & !SEPARATOR_BIT {
            CHUNK_TAG => Ok((MessageTag::Chunk, separator_seen)),
            FINAL_TAG => Ok((MessageTag::Final, separator_seen)),
            _ => Err(ProtocolError::InvalidTag(byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_roundtrip() {
        let msg = Message::chunk(vec![-3, 0, 7, 7, 42], true);
        let encoded = MessageCodec::encode(&msg).unwrap();
        assert_eq!(MessageCodec::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn empty_ack_roundtrip() {
        let msg = Message::ack(false);
        let encoded = MessageCodec::encode(&msg).unwrap();
        assert_eq!(MessageCodec::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn separator_flag_lives_in_tag_byte() {
        let with = MessageCodec::encode(&Message::chunk(vec![1], true)).unwrap();
        let without = MessageCodec::encode(&Message::chunk(vec![1], false)).unwrap();
        assert_eq!(with[4] & SEPARATOR_BIT, SEPARATOR_BIT);
        assert_eq!(without[4] & SEPARATOR_BIT, 0);
        assert_eq!(with[5..], without[5..]);
    }

    #[test]
    fn tag_bytes_distinct() {
        let mut bytes: Vec<u8> = [
            Message::chunk(vec![], false),
            Message::chunk(vec![], true),
            Message::ack(false),
            Message::ack(true),
        ]
        .iter()
        .map(MessageCodec::tag_byte)
        .collect();
        bytes.sort();
        bytes.dedup();
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn decode_truncated() {
        let err = MessageCodec::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_zero_length() {
        let err = MessageCodec::decode(&[0u8, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_trailing_bytes() {
        let mut encoded = MessageCodec::encode(&Message::chunk(vec![1, 2], false)).unwrap();
        encoded.push(0);
        let err = MessageCodec::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_unknown_tag() {
        let mut encoded = MessageCodec::encode(&Message::chunk(vec![1], false)).unwrap();
        encoded[4] = 0x80;
        let err = MessageCodec::decode(&encoded).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidTag(0x80)));
    }
}
