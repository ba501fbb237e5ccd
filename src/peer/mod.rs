//! One peer connection's lifecycle: handshake, the local
//! choke/interest state, the remote's announced piece availability, and
//! the handful of frames a piece worker needs to send.

pub mod addr;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, FramedParts};

use crate::bitfield::Bitfield;
use crate::error::{Error, Result};
use crate::wire::{Handshake, HandshakeCodec, Message, PeerCodec};
use crate::{PeerId, PieceIndex, Sha1Hash};

pub use addr::PeerAddr;

/// An established, handshaken connection to one peer.
///
/// Owned exclusively by the worker that created it; no other
/// task ever touches `choked_by_peer` or `remote_bitfield`.
pub struct Peer {
    conn: Framed<TcpStream, PeerCodec>,
    pub choked_by_peer: bool,
    pub remote_bitfield: Bitfield,
}

impl Peer {
    /// Connects to `addr`, exchanges handshakes, and reads the first real
    /// message, which must announce the remote's piece availability.
    ///
    /// Keep-alives carry no message at all, so any number of them may
    /// precede the `Bitfield` without counting as a violation. Some peers
    /// instead send an early `Have` before their `Bitfield`; this
    /// implementation rejects that (the policy chosen here is
    /// `ExpectedBitfield` rather than tolerating an assumed-empty
    /// bitfield, since a peer deviating from the conventional handshake
    /// order is indistinguishable from one simply misbehaving, and
    /// failing the connection is cheaper than guessing).
    pub async fn connect(addr: PeerAddr, info_hash: Sha1Hash, peer_id: PeerId) -> Result<Self> {
        let socket = TcpStream::connect(addr.socket_addr())
            .await
            .map_err(|e| Error::HandshakeFailed(e.to_string()))?;
        let mut hs_conn = Framed::new(socket, HandshakeCodec);

        hs_conn
            .send(Handshake::new(info_hash, peer_id))
            .await
            .map_err(|e| Error::HandshakeFailed(e.to_string()))?;
        let reply = hs_conn
            .next()
            .await
            .ok_or_else(|| Error::HandshakeFailed("connection closed before handshake".into()))?
            .map_err(|e| Error::HandshakeFailed(e.to_string()))?;
        if reply.info_hash != info_hash {
            return Err(Error::InfoHashMismatch);
        }

        let old_parts = hs_conn.into_parts();
        let mut new_parts = FramedParts::new(old_parts.io, PeerCodec);
        new_parts.read_buf = old_parts.read_buf;
        new_parts.write_buf = old_parts.write_buf;
        let mut conn = Framed::from_parts(new_parts);

        // A keep-alive is "no message" per the wire spec, not one of the
        // nine real kinds; a peer that happens to send one before its
        // Bitfield isn't misbehaving, so skip past any number of them
        // while still waiting for the mandatory first real message.
        let remote_bitfield = loop {
            let msg = conn
                .next()
                .await
                .ok_or_else(|| {
                    Error::TransportError(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed before bitfield",
                    ))
                })?
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::InvalidData {
                        Error::ProtocolError(e.to_string())
                    } else {
                        Error::TransportError(e)
                    }
                })?;
            match msg {
                Message::KeepAlive => continue,
                Message::Bitfield(bf) => break bf,
                _ => return Err(Error::ExpectedBitfield),
            }
        };

        Ok(Self {
            conn,
            choked_by_peer: true,
            remote_bitfield,
        })
    }

    pub async fn send_choke(&mut self) -> Result<()> {
        self.send(Message::Choke).await
    }

    pub async fn send_unchoke(&mut self) -> Result<()> {
        self.send(Message::Unchoke).await
    }

    pub async fn send_interested(&mut self) -> Result<()> {
        self.send(Message::Interested).await
    }

    pub async fn send_not_interested(&mut self) -> Result<()> {
        self.send(Message::NotInterested).await
    }

    pub async fn send_have(&mut self, index: PieceIndex) -> Result<()> {
        self.send(Message::Have { index }).await
    }

    pub async fn send_request(&mut self, index: PieceIndex, offset: u32, len: u32) -> Result<()> {
        self.send(Message::Request(crate::wire::message::BlockInfo {
            index,
            offset,
            len,
        }))
        .await
    }

    async fn send(&mut self, msg: Message) -> Result<()> {
        self.conn.send(msg).await.map_err(Error::TransportError)
    }

    /// Reads one framed message. `None` means the connection closed; a
    /// keep-alive decodes to `Some(Message::KeepAlive)` like any other
    /// frame and is left for the caller to ignore.
    pub async fn read(&mut self) -> Result<Option<Message>> {
        match self.conn.next().await {
            Some(Ok(msg)) => Ok(Some(msg)),
            // The codec flags malformed frames (unknown message id, a body
            // length that doesn't match its kind) with `InvalidData`; every
            // other error kind is a genuine socket failure.
            Some(Err(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Err(Error::ProtocolError(e.to_string()))
            }
            Some(Err(e)) => Err(Error::TransportError(e)),
            None => Ok(None),
        }
    }
}
