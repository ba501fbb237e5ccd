//! Framing for the handshake and the steady-state peer messages.

use std::convert::TryFrom;
use std::io::{self, Cursor};

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::handshake::{Handshake, PROTOCOL_STRING};
use super::message::{BlockInfo, Message, MessageId};
use crate::bitfield::Bitfield;

/// Codec for the one-shot 68-byte handshake frame.
pub struct HandshakeCodec;

impl Encoder<Handshake> for HandshakeCodec {
    type Error = io::Error;

    fn encode(&mut self, h: Handshake, buf: &mut BytesMut) -> io::Result<()> {
        buf.put_u8(h.prot.len() as u8);
        buf.extend_from_slice(&h.prot);
        buf.extend_from_slice(&h.reserved);
        buf.extend_from_slice(&h.info_hash);
        buf.extend_from_slice(&h.peer_id);
        Ok(())
    }
}

impl Decoder for HandshakeCodec {
    type Item = Handshake;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Handshake>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let prot_len = buf[0] as usize;
        if prot_len != PROTOCOL_STRING.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unexpected protocol string length",
            ));
        }

        let needed = 1 + prot_len + 8 + 20 + 20;
        if buf.len() < needed {
            return Ok(None);
        }

        buf.advance(1);
        let mut prot = [0u8; 19];
        buf.copy_to_slice(&mut prot);
        let mut reserved = [0u8; 8];
        buf.copy_to_slice(&mut reserved);
        let mut info_hash = [0u8; 20];
        buf.copy_to_slice(&mut info_hash);
        let mut peer_id = [0u8; 20];
        buf.copy_to_slice(&mut peer_id);

        Ok(Some(Handshake {
            prot,
            reserved,
            info_hash,
            peer_id,
        }))
    }
}

/// Codec for the steady-state peer-wire messages: a 4-byte big-endian
/// length prefix followed by a 1-byte id and the id-specific body. A
/// length of zero is a keep-alive, carrying no id at all.
pub struct PeerCodec;

impl Encoder<Message> for PeerCodec {
    type Error = io::Error;

    fn encode(&mut self, msg: Message, buf: &mut BytesMut) -> io::Result<()> {
        use Message::*;
        match msg {
            KeepAlive => buf.put_u32(0),
            Choke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Choke as u8);
            }
            Unchoke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Unchoke as u8);
            }
            Interested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Interested as u8);
            }
            NotInterested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::NotInterested as u8);
            }
            Have { index } => {
                buf.put_u32(1 + 4);
                buf.put_u8(MessageId::Have as u8);
                buf.put_u32(index as u32);
            }
            Bitfield(bf) => {
                let raw = bf.as_raw_slice();
                buf.put_u32(1 + raw.len() as u32);
                buf.put_u8(MessageId::Bitfield as u8);
                buf.extend_from_slice(raw);
            }
            Request(info) => {
                buf.put_u32(1 + 3 * 4);
                buf.put_u8(MessageId::Request as u8);
                buf.put_u32(info.index as u32);
                buf.put_u32(info.offset);
                buf.put_u32(info.len);
            }
            Piece {
                index,
                offset,
                block,
            } => {
                buf.put_u32(1 + 2 * 4 + block.len() as u32);
                buf.put_u8(MessageId::Piece as u8);
                buf.put_u32(index as u32);
                buf.put_u32(offset);
                buf.extend_from_slice(&block);
            }
            Cancel(info) => {
                buf.put_u32(1 + 3 * 4);
                buf.put_u8(MessageId::Cancel as u8);
                buf.put_u32(info.index as u32);
                buf.put_u32(info.offset);
                buf.put_u32(info.len);
            }
        }
        Ok(())
    }
}

impl Decoder for PeerCodec {
    type Item = Message;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Message>> {
        if buf.len() < 4 {
            return Ok(None);
        }
        let msg_len = Cursor::new(&buf[..4]).get_u32() as usize;
        if buf.len() < 4 + msg_len {
            return Ok(None);
        }
        buf.advance(4);

        if msg_len == 0 {
            return Ok(Some(Message::KeepAlive));
        }

        let id = MessageId::try_from(buf.get_u8())?;
        // Body length is fixed per kind (Bitfield and Piece are the only
        // variable-length ones); reject anything that doesn't match before
        // pulling a single field off `buf`, or a short frame panics on
        // `Buf::get_u32`/`get_u8` underflow instead of failing cleanly, and
        // a long one leaves unconsumed bytes that desync the next frame.
        let body_len = msg_len - 1;
        let expect = |want: usize| -> io::Result<()> {
            if body_len != want {
                Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{:?} body must be {} bytes, got {}", id, want, body_len),
                ))
            } else {
                Ok(())
            }
        };
        let msg = match id {
            MessageId::Choke => {
                expect(0)?;
                Message::Choke
            }
            MessageId::Unchoke => {
                expect(0)?;
                Message::Unchoke
            }
            MessageId::Interested => {
                expect(0)?;
                Message::Interested
            }
            MessageId::NotInterested => {
                expect(0)?;
                Message::NotInterested
            }
            MessageId::Have => {
                expect(4)?;
                Message::Have {
                    index: buf.get_u32() as usize,
                }
            }
            MessageId::Bitfield => {
                let mut raw = vec![0u8; body_len];
                buf.copy_to_slice(&mut raw);
                Message::Bitfield(Bitfield::from_raw(raw))
            }
            MessageId::Request => {
                expect(12)?;
                Message::Request(BlockInfo {
                    index: buf.get_u32() as usize,
                    offset: buf.get_u32(),
                    len: buf.get_u32(),
                })
            }
            MessageId::Piece => {
                if body_len < 8 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Piece body must be at least 8 bytes, got {}", body_len),
                    ));
                }
                let index = buf.get_u32() as usize;
                let offset = buf.get_u32();
                let block_len = body_len - 8;
                let mut block = vec![0u8; block_len];
                buf.copy_to_slice(&mut block);
                Message::Piece {
                    index,
                    offset,
                    block,
                }
            }
            MessageId::Cancel => {
                expect(12)?;
                Message::Cancel(BlockInfo {
                    index: buf.get_u32() as usize,
                    offset: buf.get_u32(),
                    len: buf.get_u32(),
                })
            }
        };
        Ok(Some(msg))
    }
}
