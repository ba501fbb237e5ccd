//! The message kinds exchanged after the handshake.

use std::convert::TryFrom;
use std::io;

use crate::bitfield::Bitfield;
use crate::PieceIndex;

/// Numeric ids for peer-wire messages (all but keep-alive, which has none).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageId {
    Choke = 0,
    Unchoke = 1,
    Interested = 2,
    NotInterested = 3,
    Have = 4,
    Bitfield = 5,
    Request = 6,
    Piece = 7,
    Cancel = 8,
}

impl TryFrom<u8> for MessageId {
    type Error = io::Error;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        use MessageId::*;
        match v {
            x if x == Choke as u8 => Ok(Choke),
            x if x == Unchoke as u8 => Ok(Unchoke),
            x if x == Interested as u8 => Ok(Interested),
            x if x == NotInterested as u8 => Ok(NotInterested),
            x if x == Have as u8 => Ok(Have),
            x if x == Bitfield as u8 => Ok(Bitfield),
            x if x == Request as u8 => Ok(Request),
            x if x == Piece as u8 => Ok(Piece),
            x if x == Cancel as u8 => Ok(Cancel),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown message id {}", other),
            )),
        }
    }
}

/// A request/cancel payload: piece index, byte offset, block length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub index: PieceIndex,
    pub offset: u32,
    pub len: u32,
}

/// All peer-wire messages, after the handshake.
#[derive(Debug, PartialEq, Clone)]
pub enum Message {
    /// An empty frame (`N == 0`); advances the stream but carries nothing.
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have { index: PieceIndex },
    Bitfield(Bitfield),
    Request(BlockInfo),
    Piece {
        index: PieceIndex,
        offset: u32,
        block: Vec<u8>,
    },
    Cancel(BlockInfo),
}

impl Message {
    /// Returns the message's id, or `None` for keep-alive.
    pub fn id(&self) -> Option<MessageId> {
        use Message::*;
        match self {
            KeepAlive => None,
            Choke => Some(MessageId::Choke),
            Unchoke => Some(MessageId::Unchoke),
            Interested => Some(MessageId::Interested),
            NotInterested => Some(MessageId::NotInterested),
            Have { .. } => Some(MessageId::Have),
            Bitfield(_) => Some(MessageId::Bitfield),
            Request(_) => Some(MessageId::Request),
            Piece { .. } => Some(MessageId::Piece),
            Cancel(_) => Some(MessageId::Cancel),
        }
    }
}

/// Copies a `Piece` message's block into `out_buf` at its announced offset.
///
/// Requires `msg` to be a `Piece` whose index matches `expected_index` and
/// whose `offset + block.len()` does not overrun `out_buf` (the
/// `parse_piece` contract). Returns the number of bytes copied.
pub fn parse_piece(
    expected_index: PieceIndex,
    out_buf: &mut [u8],
    msg: &Message,
) -> crate::error::Result<usize> {
    match msg {
        Message::Piece {
            index,
            offset,
            block,
        } => {
            if *index != expected_index {
                return Err(crate::error::Error::ProtocolError(format!(
                    "piece index mismatch: expected {}, got {}",
                    expected_index, index
                )));
            }
            let offset = *offset as usize;
            let block_len = block.len();
            let end = offset
                .checked_add(block_len)
                .ok_or_else(|| crate::error::Error::ProtocolError("offset overflow".into()))?;
            if end > out_buf.len() {
                return Err(crate::error::Error::ProtocolError(format!(
                    "piece block [{}, {}) overruns buffer of length {}",
                    offset,
                    end,
                    out_buf.len()
                )));
            }
            out_buf[offset..end].copy_from_slice(block);
            Ok(block_len)
        }
        other => Err(crate::error::Error::ProtocolError(format!(
            "expected Piece, got {:?}",
            other.id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::codec::PeerCodec;
    use bytes::BytesMut;
    use pretty_assertions::assert_eq;
    use tokio_util::codec::{Decoder, Encoder};

    fn round_trip(msg: Message) -> Message {
        let mut buf = BytesMut::new();
        PeerCodec.encode(msg, &mut buf).unwrap();
        PeerCodec.decode(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn keep_alive_frame_decodes_to_the_keep_alive_sentinel() {
        // The codec surfaces the zero-length frame as `Message::KeepAlive`
        // rather than `None`, so callers can tell "a keep-alive arrived"
        // from "the stream ended"; it's up to them (see `Peer::connect`) to
        // treat it as carrying no real message.
        let mut buf = BytesMut::from(&[0, 0, 0, 0][..]);
        let msg = PeerCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg, Message::KeepAlive);
    }

    #[test]
    fn zero_body_messages_round_trip() {
        assert_eq!(round_trip(Message::Choke), Message::Choke);
        assert_eq!(round_trip(Message::Unchoke), Message::Unchoke);
        assert_eq!(round_trip(Message::Interested), Message::Interested);
        assert_eq!(round_trip(Message::NotInterested), Message::NotInterested);
    }

    #[test]
    fn have_round_trips() {
        let msg = Message::Have { index: 42 };
        assert_eq!(round_trip(msg.clone()), msg);
    }

    #[test]
    fn request_and_cancel_round_trip() {
        let info = BlockInfo {
            index: 3,
            offset: 16384,
            len: 16384,
        };
        assert_eq!(round_trip(Message::Request(info)), Message::Request(info));
        assert_eq!(round_trip(Message::Cancel(info)), Message::Cancel(info));
    }

    #[test]
    fn piece_round_trips() {
        let msg = Message::Piece {
            index: 1,
            offset: 0,
            block: vec![1, 2, 3, 4],
        };
        assert_eq!(round_trip(msg.clone()), msg);
    }

    #[test]
    fn bitfield_round_trips() {
        // The wire form is just the padded bytes, with no piece count of
        // its own, so a round trip may come back with a longer (but
        // byte-equal) `BitVec` than the original — compare raw bytes and
        // individual bits, not full structural equality.
        let mut bf = Bitfield::new(10);
        bf.set(0);
        bf.set(9);
        let original_raw = bf.as_raw_slice().to_vec();
        let msg = round_trip(Message::Bitfield(bf));
        match msg {
            Message::Bitfield(decoded) => {
                assert_eq!(decoded.as_raw_slice(), original_raw.as_slice());
                assert!(decoded.has(0));
                assert!(decoded.has(9));
                assert!(!decoded.has(1));
            }
            other => panic!("expected Bitfield, got {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_have_with_wrong_body_length() {
        // Id 4 (Have), but a 1-byte body instead of the required 4.
        let mut buf = BytesMut::from(&[0, 0, 0, 2, 4, 0][..]);
        assert!(PeerCodec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_rejects_request_with_short_body() {
        // Id 6 (Request), but only 4 body bytes instead of the required 12.
        let mut buf = BytesMut::from(&[0, 0, 0, 5, 6, 0, 0, 0, 0][..]);
        assert!(PeerCodec.decode(&mut buf).is_err());
    }

    #[test]
    fn decode_rejects_piece_shorter_than_its_fixed_fields() {
        // Id 7 (Piece), but a 3-byte body: not even enough for index+offset
        // (8 bytes), let alone a block. Must fail cleanly rather than
        // underflow the `block_len = body_len - 8` subtraction.
        let mut buf = BytesMut::from(&[0, 0, 0, 4, 7, 0, 0, 0][..]);
        assert!(PeerCodec.decode(&mut buf).is_err());
    }

    #[test]
    fn parse_piece_rejects_index_mismatch() {
        let msg = Message::Piece {
            index: 1,
            offset: 0,
            block: vec![0; 4],
        };
        let mut buf = [0u8; 16];
        assert!(parse_piece(2, &mut buf, &msg).is_err());
    }

    #[test]
    fn parse_piece_rejects_overrun() {
        let msg = Message::Piece {
            index: 0,
            offset: 14,
            block: vec![0; 8],
        };
        let mut buf = [0u8; 16];
        assert!(parse_piece(0, &mut buf, &msg).is_err());
    }

    #[test]
    fn parse_piece_copies_into_buffer() {
        let msg = Message::Piece {
            index: 0,
            offset: 4,
            block: vec![9, 9, 9],
        };
        let mut buf = [0u8; 16];
        let n = parse_piece(0, &mut buf, &msg).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[4..7], &[9, 9, 9]);
        assert!(buf[0..4].iter().all(|&b| b == 0));
        assert!(buf[7..].iter().all(|&b| b == 0));
    }
}
