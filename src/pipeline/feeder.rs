//! Candidate feeder
//!
//! Reads the candidate source sequentially, pushes each username into the
//! bounded work queue (blocking under backpressure), then hands every worker
//! its own termination marker so no two workers race for one.
//!
//! A source read failure is fatal to the feeder and propagates to the
//! coordinator - but the markers are still pushed first, so the pool always
//! winds down instead of hanging on an empty queue.

use crate::error::{Result, UserEnumError, WorkerError};
use crate::pipeline::queue::{QueueSender, WorkItem};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Sequential source of candidate usernames.
///
/// End of iteration is the only termination the source signals; a yielded
/// error aborts the feed.
pub type CandidateSource = Box<dyn Iterator<Item = io::Result<String>> + Send>;

/// Candidate source backed by a file, one username per line.
pub fn file_source(path: &Path) -> io::Result<CandidateSource> {
    let file = File::open(path)?;
    Ok(Box::new(BufReader::new(file).lines()))
}

/// The feeder thread handle
pub struct Feeder {
    handle: Option<JoinHandle<io::Result<u64>>>,
}

impl Feeder {
    /// Spawn the feeder thread
    pub fn spawn(
        source: CandidateSource,
        queue_tx: QueueSender<WorkItem>,
        worker_count: usize,
        shutdown: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("feeder".into())
            .spawn(move || feeder_loop(source, queue_tx, worker_count, shutdown))?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Check whether the feeder thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the feeder, returning the number of candidates fed
    pub fn join(mut self) -> Result<u64> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result.map_err(UserEnumError::Io),
                Err(_) => Err(WorkerError::FeederPanicked.into()),
            }
        } else {
            Ok(0)
        }
    }
}

/// Main feeder loop
fn feeder_loop(
    mut source: CandidateSource,
    queue_tx: QueueSender<WorkItem>,
    worker_count: usize,
    shutdown: Arc<AtomicBool>,
) -> io::Result<u64> {
    let mut fed = 0u64;
    let mut read_error = None;

    while !shutdown.load(Ordering::Relaxed) {
        let line = match source.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!(error = %e, "candidate source read failed");
                read_error = Some(e);
                break;
            }
            None => break,
        };

        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }

        match queue_tx.send(WorkItem::Candidate(candidate.to_string())) {
            Ok(true) => fed += 1,
            // Cancelled while the queue was full, or all workers gone
            Ok(false) | Err(()) => break,
        }
    }

    // One marker per worker, pushed on every exit path. Under cancellation a
    // blocked marker push gives up; workers then exit via the shutdown flag.
    for _ in 0..worker_count {
        match queue_tx.send(WorkItem::Finished) {
            Ok(true) => {}
            Ok(false) | Err(()) => break,
        }
    }

    debug!(fed, "feeder finished");

    match read_error {
        Some(e) => Err(e),
        None => Ok(fed),
    }
}
