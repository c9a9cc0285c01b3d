//! Run coordinator - supervises the enumeration pipeline
//!
//! The coordinator is responsible for:
//! - Setting up both bounded queues and the shutdown flag
//! - Starting the reporter, the feeder, and the worker pool
//! - Waiting for worker completion and joining every thread
//! - Terminating the reporter with its single marker
//! - Reacting to cancellation and to a reporter that died mid-run
//!
//! Threads are never forcibly killed: cancellation is the shutdown flag
//! plus the in-band termination markers, and every participant winds down
//! on its own.

use crate::config::RunConfig;
use crate::error::Result;
use crate::pipeline::feeder::{CandidateSource, Feeder};
use crate::pipeline::queue::{BoundedQueue, ReportMessage, WorkItem};
use crate::pipeline::reporter::Reporter;
use crate::pipeline::worker::{aggregate_stats, PoolStats, Worker};
use crate::probe::Prober;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Interval between liveness checks while waiting on the pool
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a completed run
#[derive(Debug)]
pub struct RunResult {
    /// Candidates read from the source and enqueued
    pub candidates: u64,

    /// Aggregated probe outcomes across the pool
    pub outcomes: PoolStats,

    /// Records the reporter appended to the output file
    pub results_written: u64,

    /// Time taken for the run
    pub duration: Duration,

    /// Whether the run completed (vs was cancelled)
    pub completed: bool,
}

/// Coordinates the concurrent enumeration run
pub struct Coordinator {
    /// Configuration
    config: Arc<RunConfig>,

    /// Candidate source consumed by the feeder
    source: CandidateSource,

    /// Probe implementation shared by all workers
    prober: Arc<dyn Prober>,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl Coordinator {
    /// Create a new coordinator over the given collaborators
    pub fn new(config: RunConfig, source: CandidateSource, prober: Arc<dyn Prober>) -> Self {
        Self {
            config: Arc::new(config),
            source,
            prober,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the enumeration
    pub fn run(self) -> Result<RunResult> {
        let Self {
            config,
            source,
            prober,
            shutdown,
        } = self;

        let start = Instant::now();

        info!(
            endpoint = %config.endpoint,
            workers = config.worker_count,
            queue_capacity = config.queue_capacity,
            "starting enumeration"
        );

        let work_queue: BoundedQueue<WorkItem> =
            BoundedQueue::new(config.queue_capacity, Arc::clone(&shutdown));
        let result_queue: BoundedQueue<ReportMessage> =
            BoundedQueue::new(config.queue_capacity, Arc::clone(&shutdown));

        // Reporter first so an unwritable sink fails before any probe is sent
        let reporter = Reporter::spawn(
            &config.output_path,
            config.password.clone(),
            result_queue.receiver(),
            config.echo_results,
        )?;

        let feeder = Feeder::spawn(
            source,
            work_queue.sender(),
            config.worker_count,
            Arc::clone(&shutdown),
        )?;

        let mut workers = Vec::with_capacity(config.worker_count);
        let results_tx = result_queue.sender();
        for id in 0..config.worker_count {
            workers.push(Worker::spawn(
                id,
                Arc::clone(&prober),
                work_queue.receiver(),
                result_queue.sender(),
                Arc::clone(&shutdown),
            )?);
        }
        info!(count = workers.len(), "workers spawned");

        // Once the handles are distributed the queue objects only pin extra
        // sender/receiver ends; dropping them lets channel disconnection
        // track the threads that actually hold them.
        drop(work_queue);
        drop(result_queue);

        // Wait for every worker to finish. Workers exit on their own marker
        // or on cancellation - including the cancellation this loop raises
        // when the reporter dies and stops draining results.
        loop {
            if workers.iter().all(Worker::is_finished) {
                break;
            }
            if reporter.is_finished() && !shutdown.load(Ordering::SeqCst) {
                warn!("reporter exited early, cancelling run");
                shutdown.store(true, Ordering::SeqCst);
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        // Source errors surface after the pool has wound down
        let feeder_result = feeder.join();

        let outcomes = aggregate_stats(&workers);
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "worker failed to join cleanly");
            }
        }

        // Exactly one marker for the reporter, sent once no worker can
        // produce further results. If the reporter died the queue may stay
        // full; give up once its thread is gone.
        loop {
            match results_tx.send_timeout(ReportMessage::Finished, JOIN_POLL_INTERVAL) {
                Ok(true) | Err(()) => break,
                Ok(false) => {
                    if reporter.is_finished() {
                        break;
                    }
                }
            }
        }
        drop(results_tx);

        let results_written = reporter.join()?;
        let candidates = feeder_result?;

        let completed = !shutdown.load(Ordering::SeqCst);
        let duration = start.elapsed();

        info!(
            candidates,
            probed = outcomes.probed,
            written = results_written,
            duration_secs = duration.as_secs(),
            completed,
            "enumeration finished"
        );

        Ok(RunResult {
            candidates,
            outcomes,
            results_written,
            duration,
            completed,
        })
    }
}
