//! A peer's network address, as announced by the tracker.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::{Error, Result};

/// An immutable (IPv4, port) pair identifying a peer.
///
/// Decoded from the tracker's compact peer list: each entry is 6 bytes,
/// the first 4 being the big-endian IPv4 address and the last 2 the
/// big-endian port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerAddr(SocketAddrV4);

impl PeerAddr {
    /// Decodes a single compact peer entry (exactly 6 bytes).
    pub fn from_compact(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 6 {
            return Err(Error::TrackerError(format!(
                "compact peer entry must be 6 bytes, got {}",
                bytes.len()
            )));
        }
        let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let port = u16::from_be_bytes([bytes[4], bytes[5]]);
        Ok(Self(SocketAddrV4::new(ip, port)))
    }

    /// Decodes the tracker's whole compact peer list.
    ///
    /// Fails if the byte string's length isn't a multiple of 6.
    pub fn decode_compact_list(bytes: &[u8]) -> Result<Vec<Self>> {
        if bytes.len() % 6 != 0 {
            return Err(Error::TrackerError(format!(
                "compact peer list length {} is not a multiple of 6",
                bytes.len()
            )));
        }
        bytes.chunks_exact(6).map(Self::from_compact).collect()
    }

    /// Returns the socket address suitable for `TcpStream::connect`.
    pub fn socket_addr(&self) -> SocketAddrV4 {
        self.0
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_two_peers() {
        // S6: 0x0A 00 00 01 1A E1 | 0x0A 00 00 02 1A E1
        let bytes = [
            0x0A, 0x00, 0x00, 0x01, 0x1A, 0xE1, 0x0A, 0x00, 0x00, 0x02, 0x1A, 0xE1,
        ];
        let peers = PeerAddr::decode_compact_list(&bytes).unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].to_string(), "10.0.0.1:6881");
        assert_eq!(peers[1].to_string(), "10.0.0.2:6881");
    }

    #[test]
    fn rejects_length_not_multiple_of_six() {
        let bytes = [0u8; 7];
        assert!(PeerAddr::decode_compact_list(&bytes).is_err());
    }

    #[test]
    fn structural_equality() {
        let a = PeerAddr::from_compact(&[1, 2, 3, 4, 0, 80]).unwrap();
        let b = PeerAddr::from_compact(&[1, 2, 3, 4, 0, 80]).unwrap();
        let c = PeerAddr::from_compact(&[1, 2, 3, 4, 0, 81]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
