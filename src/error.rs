//! The engine's error type.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! variant groups the failure kinds laid out by the design: some are fatal
//! to the whole download, others are scoped to a single peer connection or
//! a single piece and are handled by requeueing rather than propagating.

use std::io;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure kinds the engine can produce.
///
/// See the module-level comment for how each variant is expected to be
/// handled by its caller: fatal ones should abort the whole download;
/// per-connection ones should end only the one worker; per-piece ones
/// should requeue the piece and keep the connection alive.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The metainfo file is not a valid single-file torrent descriptor.
    #[error("invalid torrent descriptor: {0}")]
    DescriptorInvalid(String),

    /// The tracker returned a non-200 response or an unparseable body.
    #[error("tracker error: {0}")]
    TrackerError(String),

    /// The tracker's peer list was empty.
    #[error("tracker returned no peers")]
    NoPeers,

    /// The handshake could not be completed (I/O failure, malformed frame).
    #[error("handshake with peer failed: {0}")]
    HandshakeFailed(String),

    /// The peer's handshake carried a different info hash than ours.
    #[error("peer announced a mismatched info hash")]
    InfoHashMismatch,

    /// The peer's first post-handshake message was not a Bitfield.
    #[error("peer did not send a bitfield as its first message")]
    ExpectedBitfield,

    /// A wire message violated the wire protocol's framing or field contracts.
    #[error("protocol violation: {0}")]
    ProtocolError(String),

    /// A socket read or write failed.
    #[error("transport error: {0}")]
    TransportError(#[from] io::Error),

    /// A downloaded piece's SHA-1 digest did not match the expected one.
    #[error("piece {index} failed its integrity check")]
    IntegrityError {
        /// The piece index that failed verification.
        index: usize,
    },

    /// The download finished without every piece being assembled.
    #[error("incomplete download: got {done} of {total} pieces")]
    IncompleteDownload {
        /// Number of pieces successfully assembled.
        done: usize,
        /// Total number of pieces the torrent has.
        total: usize,
    },
}
