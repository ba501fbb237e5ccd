//! The handshake frame exchanged once, at connection start.

use crate::{PeerId, Sha1Hash};

/// The fixed protocol string identifying the classic wire protocol.
pub const PROTOCOL_STRING: &str = "BitTorrent protocol";

/// The bit-exact, 68-byte handshake frame:
/// `[1=19][19=PROTOCOL_STRING][8 reserved=0][20 info_hash][20 peer_id]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handshake {
    /// The protocol string, always `PROTOCOL_STRING`'s bytes.
    pub prot: [u8; 19],
    /// Reserved extension bytes; always zero (no extensions are supported).
    pub reserved: [u8; 8],
    /// The torrent's info hash.
    pub info_hash: Sha1Hash,
    /// The sending client's peer id.
    pub peer_id: PeerId,
}

impl Handshake {
    /// Builds a handshake for our side of the connection.
    pub fn new(info_hash: Sha1Hash, peer_id: PeerId) -> Self {
        let mut prot = [0; 19];
        prot.copy_from_slice(PROTOCOL_STRING.as_bytes());
        Self {
            prot,
            reserved: [0; 8],
            info_hash,
            peer_id,
        }
    }

    /// The handshake's fixed wire length, in bytes.
    pub const fn len() -> usize {
        1 + 19 + 8 + 20 + 20
    }
}
