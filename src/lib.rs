#[macro_use]
extern crate serde_derive;

pub mod bitfield;
pub mod conf;
pub mod coordinator;
pub mod descriptor;
pub mod error;
pub mod metainfo;
pub mod peer;
pub mod piece_worker;
pub mod queue;
pub mod tracker;
mod wire;


pub use bitfield::Bitfield;
pub use descriptor::Descriptor;
pub use peer::addr::PeerAddr;

/// The type of a piece's index.
///
/// On the wire all integers are sent as 4-byte big endian integers, but in
/// the source code we use `usize` to be consistent with other index types
/// in Rust.
pub type PieceIndex = usize;

/// The peer ID is an arbitrary 20 byte string.
///
/// Guidelines for choosing a peer ID: http://bittorrent.org/beps/bep_0020.html.
pub type PeerId = [u8; 20];

/// A SHA-1 hash digest, 20 bytes long.
pub type Sha1Hash = [u8; 20];
