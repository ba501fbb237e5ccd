//! The parsed, immutable torrent descriptor.

use crate::error::{Error, Result};
use crate::metainfo::Metainfo;
use crate::{PieceIndex, Sha1Hash};

/// Everything the rest of the crate needs to know about one torrent,
/// derived once from its [`Metainfo`] and never mutated afterward.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub announce_url: String,
    pub info_hash: Sha1Hash,
    pub piece_hashes: Vec<Sha1Hash>,
    pub piece_length: u64,
    pub total_length: u64,
    pub name: String,
}

impl Descriptor {
    /// Builds a descriptor from a parsed metainfo file, validating the
    /// invariants: `piece_hashes` splits evenly into 20-byte
    /// digests, their count matches `ceil(total_length / piece_length)`,
    /// and the last piece is non-empty.
    pub fn from_metainfo(meta: &Metainfo) -> Result<Self> {
        let pieces = meta.info.pieces.as_ref();
        if pieces.is_empty() || pieces.len() % 20 != 0 {
            return Err(Error::DescriptorInvalid(format!(
                "pieces field length {} is not a positive multiple of 20",
                pieces.len()
            )));
        }
        let piece_hashes: Vec<Sha1Hash> = pieces
            .chunks_exact(20)
            .map(|chunk| {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();

        let piece_length = meta.info.piece_length;
        let total_length = meta.info.length;
        if piece_length == 0 || total_length == 0 {
            return Err(Error::DescriptorInvalid(
                "piece length and total length must be positive".into(),
            ));
        }

        let expected_count =
            ((total_length + piece_length - 1) / piece_length) as usize;
        if piece_hashes.len() != expected_count {
            return Err(Error::DescriptorInvalid(format!(
                "expected {} piece digests for a {}-byte file at piece length {}, got {}",
                expected_count,
                total_length,
                piece_length,
                piece_hashes.len()
            )));
        }

        let last_size = total_length - (expected_count as u64 - 1) * piece_length;
        if last_size == 0 {
            return Err(Error::DescriptorInvalid(
                "last piece size must be positive".into(),
            ));
        }

        let info_hash = meta
            .info_hash()
            .map_err(|e| Error::DescriptorInvalid(e.to_string()))?;

        Ok(Self {
            announce_url: meta.announce.clone(),
            info_hash,
            piece_hashes,
            piece_length,
            total_length,
            name: meta.info.name.clone(),
        })
    }

    /// The number of pieces in the torrent.
    pub fn piece_count(&self) -> usize {
        self.piece_hashes.len()
    }

    /// The byte length of piece `index`: `piece_length` for every piece
    /// but the last, which takes the remainder.
    pub fn size(&self, index: PieceIndex) -> u64 {
        if index + 1 == self.piece_count() {
            self.total_length - index as u64 * self.piece_length
        } else {
            self.piece_length
        }
    }

    /// The output buffer's byte range occupied by piece `index`.
    pub fn range(&self, index: PieceIndex) -> std::ops::Range<usize> {
        let start = index * self.piece_length as usize;
        start..start + self.size(index) as usize
    }
}
