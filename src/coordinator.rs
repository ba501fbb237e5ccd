//! Owns the work queue and result channel, spawns one worker per peer,
//! and assembles verified pieces into the output buffer.

use tokio::sync::mpsc;

use crate::conf::Conf;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::peer::PeerAddr;
use crate::piece_worker::{self, PieceResult};
use crate::queue::{PieceWork, WorkQueue};
use crate::PeerId;

/// Downloads every piece of `descriptor` from `peers`, returning the
/// assembled file bytes.
///
/// Spawns one worker task per peer, all pulling from the same work
/// queue. The assembler loop below is the sole writer of the output
/// buffer and the sole closer of the queue: exactly one result-channel
/// read per iteration, and the queue is closed exactly once, after the
/// last piece lands.
pub async fn download(
    descriptor: &Descriptor,
    peers: Vec<PeerAddr>,
    peer_id: PeerId,
    conf: Conf,
) -> Result<Vec<u8>> {
    if peers.is_empty() {
        return Err(Error::NoPeers);
    }

    let total_pieces = descriptor.piece_count();
    let work_items: Vec<PieceWork> = (0..total_pieces)
        .map(|index| PieceWork {
            index,
            digest: descriptor.piece_hashes[index],
            len: descriptor.size(index),
        })
        .collect();
    let queue = WorkQueue::new(work_items);

    let (tx, mut rx) = mpsc::unbounded_channel::<PieceResult>();

    let mut worker_handles = Vec::with_capacity(peers.len());
    for addr in peers {
        let queue = queue.clone();
        let tx = tx.clone();
        let conf = conf.clone();
        let info_hash = descriptor.info_hash;
        worker_handles.push(tokio::spawn(async move {
            piece_worker::run(addr, info_hash, peer_id, queue, tx, conf).await
        }));
    }
    // Drop our own sender so the channel closes once every worker has
    // finished (and thus dropped theirs).
    drop(tx);

    let mut output = vec![0u8; descriptor.total_length as usize];
    let mut done = 0usize;
    while let Some(result) = rx.recv().await {
        let range = descriptor.range(result.index);
        output[range].copy_from_slice(&result.bytes);
        done += 1;
        log::info!(
            "({:.2}%) downloaded piece #{}",
            100.0 * done as f64 / total_pieces as f64,
            result.index
        );
        if done == total_pieces {
            queue.close();
            break;
        }
    }

    for handle in worker_handles {
        let _ = handle.await;
    }

    if done < total_pieces {
        return Err(Error::IncompleteDownload {
            done,
            total: total_pieces,
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn errors_immediately_on_empty_peer_list() {
        let descriptor = Descriptor {
            announce_url: "http://tracker.test/announce".into(),
            info_hash: [0u8; 20],
            piece_hashes: vec![[0u8; 20]],
            piece_length: 16384,
            total_length: 16384,
            name: "file.bin".into(),
        };
        let result = download(&descriptor, Vec::new(), [1u8; 20], Conf::default()).await;
        assert!(matches!(result, Err(Error::NoPeers)));
    }
}
