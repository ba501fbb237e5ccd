//! Framing, parsing and serialization of the wire protocol.
//!
//! This is split into the one-shot [`handshake`] exchanged at connection
//! start, the steady-state [`message`] kinds exchanged afterwards, and the
//! [`codec`] that frames both onto a [`tokio_util::codec::Framed`] stream.

pub mod codec;
pub mod handshake;
pub mod message;

pub use codec::{HandshakeCodec, PeerCodec};
pub use handshake::{Handshake, PROTOCOL_STRING};
pub use message::{Message, MessageId};
