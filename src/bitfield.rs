//! The piece-availability bitfield.
//!
//! A peer's bitfield is a compact bool vector from most significant to
//! least significant bit: piece `i` lives in byte `i/8`, at bit `7-(i%8)`.
//! This wraps [`bitvec`]'s `BitVec<Msb0, u8>`, which already
//! implements exactly this bit order, and adds the out-of-range semantics
//! the design calls for: `has` is false past the end, `set` past the end
//! is a no-op, neither of which `BitVec` gives us for free (indexing it
//! out of bounds panics).

use bitvec::prelude::{BitVec, Msb0};

/// Per-peer statement of which pieces it possesses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bitfield {
    bits: BitVec<Msb0, u8>,
}

impl Bitfield {
    /// Creates a bitfield with `piece_count` bits, all initially unset.
    pub fn new(piece_count: usize) -> Self {
        let byte_len = (piece_count + 7) / 8;
        let mut bits: BitVec<Msb0, u8> = BitVec::from_vec(vec![0u8; byte_len]);
        bits.truncate(piece_count);
        Self { bits }
    }

    /// Builds a bitfield from the raw bytes as sent on the wire.
    ///
    /// The raw byte vector may carry more bits than there are pieces (it is
    /// padded up to a byte boundary); that's fine, since `has` on a piece
    /// index at or beyond `piece_count` simply never gets queried.
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        Self {
            bits: BitVec::from_vec(bytes),
        }
    }

    /// Returns the bitfield's underlying raw bytes, as sent on the wire.
    pub fn as_raw_slice(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Returns whether the peer has piece `index`.
    ///
    /// Out-of-range queries are defined to return `false` rather than
    /// panicking.
    pub fn has(&self, index: usize) -> bool {
        if index < self.bits.len() {
            self.bits[index]
        } else {
            false
        }
    }

    /// Marks piece `index` as present.
    ///
    /// An out-of-range `index` is silently ignored.
    pub fn set(&mut self, index: usize) {
        if index < self.bits.len() {
            self.bits.set(index, true);
        }
    }
}
