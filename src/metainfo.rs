//! Dictionary-encoded metainfo parsing: the on-disk `.torrent`
//! format, decoded as far as the raw `announce`/`info` dictionary before
//! [`crate::descriptor`] turns it into the [`crate::Descriptor`] the rest
//! of the crate actually works with.

use serde_bencode::Error;
use serde_bytes::ByteBuf;
use sha1::{Digest, Sha1};

use crate::Sha1Hash;

#[derive(Debug, Deserialize)]
pub struct Metainfo {
    pub announce: String,
    pub info: Info,
}

impl Metainfo {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, Error> {
        serde_bencode::from_bytes(buf)
    }

    /// Computes the info hash: SHA-1 over the canonical bencoding of the
    /// `info` dictionary, which serves as the swarm key.
    pub fn info_hash(&self) -> Result<Sha1Hash, Error> {
        let info = serde_bencode::to_bytes(&self.info)?;
        let digest = Sha1::digest(&info);
        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&digest);
        Ok(info_hash)
    }
}

/// The `info` dictionary. Only single-file torrents are supported;
/// `length` is therefore required rather than optional.
#[derive(Debug, Serialize, Deserialize)]
pub struct Info {
    pub name: String,
    #[serde(with = "serde_bytes")]
    pub pieces: ByteBuf,
    #[serde(rename = "piece length")]
    pub piece_length: u64,
    pub length: u64,
    pub private: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Metainfo {
        Metainfo {
            announce: "http://tracker.test/announce".into(),
            info: Info {
                name: "file.bin".into(),
                pieces: ByteBuf::from(vec![0u8; 20]),
                piece_length: 10,
                length: 10,
                private: None,
            },
        }
    }

    #[test]
    fn info_hash_is_stable() {
        let a = sample().info_hash().unwrap();
        let b = sample().info_hash().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn bencoded_round_trip_preserves_announce_and_info() {
        let original = sample();
        let bytes = serde_bencode::to_bytes(&original.info).unwrap();
        let info: Info = serde_bencode::from_bytes(&bytes).unwrap();
        assert_eq!(info.name, original.info.name);
        assert_eq!(info.length, original.info.length);
        assert_eq!(info.piece_length, original.info.piece_length);
    }
}
