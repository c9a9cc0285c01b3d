//! Prober worker threads
//!
//! Each worker runs the same loop: pull a candidate from the work queue,
//! run one probe, forward the classified result. A termination marker ends
//! the loop cleanly; the shutdown flag ends it early.
//!
//! Probe failures never take a worker down. A transport error becomes an
//! UNKNOWN result with no status metadata plus one diagnostic line, and the
//! worker moves on to the next candidate.

use crate::error::WorkerError;
use crate::probe::{Classification, ProbeResult, Prober};
use crate::pipeline::queue::{
    QueueReceiver, QueueSender, RecvTimeoutError, ReportMessage, WorkItem, POLL_INTERVAL,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Candidates probed
    pub probed: AtomicU64,

    /// 401 responses
    pub valid_users: AtomicU64,

    /// 404 responses with the user-not-found indicator
    pub invalid_users: AtomicU64,

    /// 403 responses
    pub second_factor: AtomicU64,

    /// 200 responses
    pub valid_logins: AtomicU64,

    /// Inconclusive outcomes, including transport failures
    pub unknown: AtomicU64,

    /// Probes that failed at the transport layer
    pub transport_errors: AtomicU64,
}

impl WorkerStats {
    fn record(&self, classification: Classification) {
        self.probed.fetch_add(1, Ordering::Relaxed);
        let counter = match classification {
            Classification::ValidUser => &self.valid_users,
            Classification::InvalidUser => &self.invalid_users,
            Classification::ValidPasswordSecondFactor => &self.second_factor,
            Classification::ValidLogin => &self.valid_logins,
            Classification::Unknown => &self.unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Aggregated outcome counters across the pool
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Candidates probed
    pub probed: u64,
    /// VALID_USER outcomes
    pub valid_users: u64,
    /// INVALID_USER outcomes
    pub invalid_users: u64,
    /// VALID_PASSWD_2FA outcomes
    pub second_factor: u64,
    /// VALID_LOGIN outcomes
    pub valid_logins: u64,
    /// UNKNOWN outcomes
    pub unknown: u64,
    /// Transport-level probe failures (a subset of unknown)
    pub transport_errors: u64,
}

/// A worker thread probing candidates from the work queue
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        prober: Arc<dyn Prober>,
        queue_rx: QueueReceiver<WorkItem>,
        results_tx: QueueSender<ReportMessage>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("prober-{}", id))
            .spawn(move || worker_loop(id, prober, queue_rx, results_tx, shutdown, stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Check whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| WorkerError::Panicked { id: self.id })
        } else {
            Ok(())
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    prober: Arc<dyn Prober>,
    queue_rx: QueueReceiver<WorkItem>,
    results_tx: QueueSender<ReportMessage>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker = id, "worker starting");

    while !shutdown.load(Ordering::Relaxed) {
        let item = match queue_rx.recv_timeout(POLL_INTERVAL) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let username = match item {
            WorkItem::Candidate(username) => username,
            WorkItem::Finished => {
                trace!(worker = id, "termination marker received");
                break;
            }
        };

        let result = match prober.probe(&username) {
            Ok(response) => {
                stats.record(response.classification);
                trace!(
                    worker = id,
                    username = %username,
                    status = response.status,
                    classification = %response.classification,
                    "probe completed"
                );
                ProbeResult {
                    username,
                    classification: response.classification,
                    status: Some(response.status),
                }
            }
            Err(e) => {
                warn!(worker = id, username = %username, error = %e, "probe failed");
                stats.record(Classification::Unknown);
                stats.record_transport_error();
                ProbeResult {
                    username,
                    classification: Classification::Unknown,
                    status: None,
                }
            }
        };

        match results_tx.send(ReportMessage::Result(result)) {
            Ok(true) => {}
            // Cancelled while the result queue was full, or the reporter
            // is gone
            Ok(false) | Err(()) => break,
        }
    }

    debug!(
        worker = id,
        probed = stats.probed.load(Ordering::Relaxed),
        "worker shutting down"
    );
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> PoolStats {
    let mut totals = PoolStats::default();

    for worker in workers {
        totals.probed += worker.stats.probed.load(Ordering::Relaxed);
        totals.valid_users += worker.stats.valid_users.load(Ordering::Relaxed);
        totals.invalid_users += worker.stats.invalid_users.load(Ordering::Relaxed);
        totals.second_factor += worker.stats.second_factor.load(Ordering::Relaxed);
        totals.valid_logins += worker.stats.valid_logins.load(Ordering::Relaxed);
        totals.unknown += worker.stats.unknown.load(Ordering::Relaxed);
        totals.transport_errors += worker.stats.transport_errors.load(Ordering::Relaxed);
    }

    totals
}
