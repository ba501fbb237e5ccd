//! One peer's piece-fetching loop: the pipelined
//! block-request state machine that drives a single connection against
//! the shared work queue.

use sha1::{Digest, Sha1};
use tokio::time::timeout;

use crate::conf::Conf;
use crate::error::{Error, Result};
use crate::peer::{Peer, PeerAddr};
use crate::queue::{PieceWork, WorkQueue};
use crate::wire::message::parse_piece;
use crate::wire::Message;
use crate::{PeerId, Sha1Hash};

/// A completed, digest-verified piece, ready for the assembler.
pub struct PieceResult {
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// Drives one peer connection end to end.
///
/// Exits when the queue is closed and drained, or when the connection
/// fails outright. Failures that only affect the current piece are
/// recovered by requeueing and trying the next assignment on the same
/// connection; failures that poison the connection requeue and exit.
pub async fn run(
    addr: PeerAddr,
    info_hash: Sha1Hash,
    peer_id: PeerId,
    queue: WorkQueue,
    results: tokio::sync::mpsc::UnboundedSender<PieceResult>,
    conf: Conf,
) {
    let mut peer = match Peer::connect(addr, info_hash, peer_id).await {
        Ok(peer) => peer,
        Err(e) => {
            log::warn!("peer {} handshake failed: {}", addr, e);
            return;
        }
    };

    if let Err(e) = peer.send_unchoke().await {
        log::warn!("peer {} failed to send unchoke: {}", addr, e);
        return;
    }
    if let Err(e) = peer.send_interested().await {
        log::warn!("peer {} failed to send interested: {}", addr, e);
        return;
    }

    while let Some(work) = queue.dequeue().await {
        if !peer.remote_bitfield.has(work.index) {
            queue.requeue(work);
            continue;
        }

        let outcome = match download_piece(&mut peer, &work, &conf).await {
            Ok(bytes) if sha1_digest(&bytes) == work.digest => Ok(bytes),
            Ok(_) => Err(Error::IntegrityError { index: work.index }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(bytes) => {
                if let Err(e) = peer.send_have(work.index).await {
                    log::warn!("peer {} failed to send have: {}", addr, e);
                }
                if results
                    .send(PieceResult {
                        index: work.index,
                        bytes,
                    })
                    .is_err()
                {
                    // Assembler is gone; nothing left to do.
                    return;
                }
            }
            Err(e @ Error::IntegrityError { .. }) => {
                // Only the current piece is tainted; stay on this
                // connection and try the next assignment.
                log::warn!("peer {} lost piece {}: {}", addr, work.index, e);
                queue.requeue(work);
            }
            Err(e) => {
                // The connection itself is suspect; give up on it.
                log::warn!("peer {} lost piece {}: {}", addr, work.index, e);
                queue.requeue(work);
                return;
            }
        }
    }
}

/// The pipelined block-request loop: keeps up to
/// `conf.max_backlog` requests outstanding at once, bounded by a single
/// deadline spanning the whole piece.
async fn download_piece(peer: &mut Peer, work: &PieceWork, conf: &Conf) -> Result<Vec<u8>> {
    let piece_len = work.len as u32;
    let mut buf = vec![0u8; piece_len as usize];

    let mut requested: u32 = 0;
    let mut downloaded: u32 = 0;
    let mut backlog: usize = 0;

    timeout(conf.piece_deadline, async {
        while downloaded < piece_len {
            while !peer.choked_by_peer && backlog < conf.max_backlog && requested < piece_len {
                let block_size = std::cmp::min(conf.max_block_size, piece_len - requested);
                peer.send_request(work.index, requested, block_size).await?;
                backlog += 1;
                requested += block_size;
            }

            match peer.read().await? {
                Some(Message::Unchoke) => peer.choked_by_peer = false,
                Some(Message::Choke) => peer.choked_by_peer = true,
                Some(Message::Have { index }) => peer.remote_bitfield.set(index),
                Some(msg @ Message::Piece { .. }) => {
                    let n = parse_piece(work.index, &mut buf, &msg)?;
                    downloaded += n as u32;
                    backlog = backlog.saturating_sub(1);
                }
                Some(_) => {}
                None => {
                    return Err(Error::TransportError(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed mid-piece",
                    )))
                }
            }
        }
        Ok(())
    })
    .await
    .map_err(|_| {
        Error::ProtocolError(format!(
            "piece {} did not complete within {:?}",
            work.index, conf.piece_deadline
        ))
    })??;

    Ok(buf)
}

fn sha1_digest(bytes: &[u8]) -> Sha1Hash {
    let digest = Sha1::digest(bytes);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&digest);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_digest_matches_known_vector() {
        // sha1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709
        let got = sha1_digest(b"");
        assert_eq!(hex::encode(got), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}
