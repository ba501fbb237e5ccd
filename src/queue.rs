//! The shared, closable work queue.
//!
//! Multi-producer (workers requeue failed assignments), multi-consumer
//! (workers dequeue). Closing the queue is the sole cancellation signal:
//! once closed, `dequeue` returns `None` instead of blocking, and
//! `requeue` after closure is a silent no-op rather than a panic — the
//! fix for the close/requeue race described below.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::{PieceIndex, Sha1Hash};

/// How long an idle `dequeue` sleeps between polls of the shared queue.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One piece's work assignment: its index, expected digest, and byte
/// length.
#[derive(Clone, Copy, Debug)]
pub struct PieceWork {
    pub index: PieceIndex,
    pub digest: Sha1Hash,
    pub len: u64,
}

struct Inner {
    items: Mutex<VecDeque<PieceWork>>,
    closed: std::sync::atomic::AtomicBool,
}

/// A handle to the shared queue. Cloning shares the same underlying
/// state; every worker holds one.
#[derive(Clone)]
pub struct WorkQueue {
    inner: std::sync::Arc<Inner>,
}

impl WorkQueue {
    /// Builds a queue pre-populated with `items`.
    pub fn new(items: impl IntoIterator<Item = PieceWork>) -> Self {
        Self {
            inner: std::sync::Arc::new(Inner {
                items: Mutex::new(items.into_iter().collect()),
                closed: std::sync::atomic::AtomicBool::new(false),
            }),
        }
    }

    /// Takes one assignment, polling while the queue is empty but still
    /// open. Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<PieceWork> {
        loop {
            if let Some(item) = self.inner.items.lock().unwrap().pop_front() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }
            tokio::time::delay_for(POLL_INTERVAL).await;
        }
    }

    /// Puts a failed assignment back. A no-op once the queue has been
    /// closed, so a worker racing the assembler's closure never panics
    /// — it simply drops the assignment on the floor, which is safe
    /// because closure only happens once every piece has already been
    /// assembled.
    pub fn requeue(&self, item: PieceWork) {
        if self.is_closed() {
            return;
        }
        self.inner.items.lock().unwrap().push_back(item);
    }

    /// Closes the queue. Safe to call more than once; every `dequeue`
    /// still polling sees it on its next wakeup.
    pub fn close(&self) {
        self.inner.closed.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(index: PieceIndex) -> PieceWork {
        PieceWork {
            index,
            digest: [0u8; 20],
            len: 16384,
        }
    }

    #[tokio::test]
    async fn dequeues_in_fifo_order() {
        let q = WorkQueue::new(vec![work(0), work(1)]);
        assert_eq!(q.dequeue().await.unwrap().index, 0);
        assert_eq!(q.dequeue().await.unwrap().index, 1);
    }

    #[tokio::test]
    async fn dequeue_returns_none_once_closed_and_drained() {
        let q = WorkQueue::new(vec![work(0)]);
        q.close();
        assert_eq!(q.dequeue().await.unwrap().index, 0);
        assert!(q.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn requeue_after_close_is_a_silent_no_op() {
        let q = WorkQueue::new(Vec::<PieceWork>::new());
        q.close();
        q.requeue(work(5));
        assert!(q.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn requeue_before_close_is_visible_to_dequeue() {
        let q = WorkQueue::new(Vec::<PieceWork>::new());
        q.requeue(work(7));
        assert_eq!(q.dequeue().await.unwrap().index, 7);
    }
}
