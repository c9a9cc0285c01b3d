//! Bounded queues wiring the pipeline together
//!
//! Both pipeline channels share one contract: FIFO, fixed capacity,
//! blocking on both ends. Capacity is the system's only backpressure
//! mechanism - a full work queue throttles the feeder to the pool's
//! consumption rate.
//!
//! Sends poll in short slices so a producer parked on a full queue can
//! notice cancellation instead of blocking until space frees. Termination
//! travels in-band as tagged variants, one marker per consumer.

use crate::probe::ProbeResult;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use crossbeam_channel::RecvTimeoutError;

/// Poll interval for shutdown checks while blocked on a full or empty queue.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Item on the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// One candidate username to probe.
    Candidate(String),

    /// No more input; each worker consumes exactly one.
    Finished,
}

/// Message on the result queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportMessage {
    /// A classified result to persist.
    Result(ProbeResult),

    /// No more results; the reporter consumes exactly one.
    Finished,
}

/// Counters shared by all handles of one queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,
}

/// Bounded FIFO connecting one pipeline stage to the next.
///
/// The queue itself is only a factory for sender/receiver handles; the
/// coordinator drops it once the handles are distributed so channel
/// disconnection tracks the producing threads, not the queue object.
pub struct BoundedQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
    shutdown: Arc<AtomicBool>,
    stats: Arc<QueueStats>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize, shutdown: Arc<AtomicBool>) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            shutdown,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Get a sender handle (clone per producer)
    pub fn sender(&self) -> QueueSender<T> {
        QueueSender {
            sender: self.sender.clone(),
            shutdown: Arc::clone(&self.shutdown),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get a receiver handle (clone per consumer)
    pub fn receiver(&self) -> QueueReceiver<T> {
        QueueReceiver {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Handle for pushing items into the queue
#[derive(Clone)]
pub struct QueueSender<T> {
    sender: Sender<T>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<QueueStats>,
}

impl<T> QueueSender<T> {
    /// Deliver an item, blocking while the queue is full.
    ///
    /// Returns `Ok(true)` once the item is delivered, `Ok(false)` when it was
    /// dropped because the run was cancelled while the queue stayed full, and
    /// `Err` when every receiver is gone. Delivery is attempted before the
    /// cancellation check, so a cancelled run still hands off items whenever
    /// the consumer is draining.
    pub fn send(&self, item: T) -> Result<bool, ()> {
        let mut item = item;
        loop {
            match self.sender.send_timeout(item, POLL_INTERVAL) {
                Ok(()) => {
                    self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                    return Ok(true);
                }
                Err(crossbeam_channel::SendTimeoutError::Timeout(returned)) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        return Ok(false);
                    }
                    item = returned;
                }
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => return Err(()),
            }
        }
    }

    /// Single bounded delivery attempt.
    ///
    /// Returns `Ok(false)` on timeout; the caller polls its own liveness
    /// condition between attempts.
    pub fn send_timeout(&self, item: T, timeout: Duration) -> Result<bool, ()> {
        match self.sender.send_timeout(item, timeout) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => Ok(false),
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => Err(()),
        }
    }
}

/// Handle for pulling items from the queue
#[derive(Clone)]
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> QueueReceiver<T> {
    /// Receive with timeout.
    ///
    /// Consumers loop on this so they can check their exit conditions
    /// between waits; `Disconnected` means every producer is gone and the
    /// queue has drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let item = self.receiver.recv_timeout(timeout)?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Ok(item)
    }

    /// Try to receive without blocking
    pub fn try_recv(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            Err(_) => None,
        }
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn queue(capacity: usize) -> (BoundedQueue<WorkItem>, Arc<AtomicBool>) {
        let shutdown = Arc::new(AtomicBool::new(false));
        (BoundedQueue::new(capacity, Arc::clone(&shutdown)), shutdown)
    }

    #[test]
    fn test_queue_basic() {
        let (queue, _) = queue(10);
        let tx = queue.sender();
        let rx = queue.receiver();

        assert!(tx.send(WorkItem::Candidate("alice".into())).unwrap());
        assert_eq!(queue.len(), 1);

        let item = rx.recv_timeout(POLL_INTERVAL).unwrap();
        assert_eq!(item, WorkItem::Candidate("alice".into()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_fifo_order() {
        let (queue, _) = queue(10);
        let tx = queue.sender();
        let rx = queue.receiver();

        for name in ["a", "b", "c"] {
            tx.send(WorkItem::Candidate(name.into())).unwrap();
        }
        for name in ["a", "b", "c"] {
            assert_eq!(
                rx.recv_timeout(POLL_INTERVAL).unwrap(),
                WorkItem::Candidate(name.into())
            );
        }
    }

    #[test]
    fn test_queue_backpressure() {
        let (queue, _) = queue(2);
        let tx = queue.sender();
        let rx = queue.receiver();

        assert!(tx.send(WorkItem::Candidate("a".into())).unwrap());
        assert!(tx.send(WorkItem::Candidate("b".into())).unwrap());

        // Queue is full - a bounded attempt times out
        assert!(!tx
            .send_timeout(WorkItem::Candidate("c".into()), Duration::from_millis(20))
            .unwrap());
        assert_eq!(queue.len(), 2);

        // Consuming one frees a slot
        rx.recv_timeout(POLL_INTERVAL).unwrap();
        assert!(tx
            .send_timeout(WorkItem::Candidate("c".into()), POLL_INTERVAL)
            .unwrap());
    }

    #[test]
    fn test_blocked_send_gives_up_on_shutdown() {
        let (queue, shutdown) = queue(1);
        let tx = queue.sender();

        assert!(tx.send(WorkItem::Candidate("a".into())).unwrap());
        shutdown.store(true, Ordering::SeqCst);

        // Full queue + cancellation: the item is dropped, not delivered
        assert!(!tx.send(WorkItem::Candidate("b".into())).unwrap());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_send_delivers_despite_shutdown_when_space_exists() {
        let (queue, shutdown) = queue(2);
        let tx = queue.sender();
        shutdown.store(true, Ordering::SeqCst);

        assert!(tx.send(WorkItem::Finished).unwrap());
    }

    #[test]
    fn test_recv_reports_disconnect_after_drain() {
        let (queue, _) = queue(4);
        let tx = queue.sender();
        let rx = queue.receiver();
        tx.send(WorkItem::Candidate("a".into())).unwrap();
        drop(tx);
        drop(queue);

        // Buffered item is still delivered, then the channel reports closed
        assert!(rx.recv_timeout(POLL_INTERVAL).is_ok());
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(10)),
            Err(RecvTimeoutError::Disconnected)
        );
    }

    #[test]
    fn test_queue_stats() {
        let (queue, _) = queue(10);
        let tx = queue.sender();
        let rx = queue.receiver();

        tx.send(WorkItem::Candidate("a".into())).unwrap();
        tx.send(WorkItem::Candidate("b".into())).unwrap();
        rx.recv_timeout(POLL_INTERVAL).unwrap();

        let stats = queue.stats();
        assert_eq!(stats.enqueued.load(Ordering::Relaxed), 2);
        assert_eq!(stats.dequeued.load(Ordering::Relaxed), 1);
    }
}
