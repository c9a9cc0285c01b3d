//! Result reporter
//!
//! Single consumer of the result queue. Every result becomes one stable
//! line, appended to the output file with a flush per line and echoed to
//! stdout for live observability. Crash resilience comes from append
//! semantics: a killed run keeps every line written so far, and reruns
//! never rewrite earlier output.

use crate::error::ReportError;
use crate::pipeline::queue::{QueueReceiver, RecvTimeoutError, ReportMessage, POLL_INTERVAL};
use crate::probe::ProbeResult;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Placeholder for the status column when the probe never got a response
const NO_STATUS: &str = "???";

/// Render one result as its output record.
///
/// Formatting is pure: the same result always yields the same bytes.
pub fn format_record(result: &ProbeResult, password: &str) -> String {
    let code = match result.status {
        Some(status) => status.to_string(),
        None => NO_STATUS.to_string(),
    };

    format!(
        "[{}] {} {} {}:{}",
        result.classification.symbol(),
        code,
        result.classification,
        result.username,
        password
    )
}

/// The reporter thread handle
#[derive(Debug)]
pub struct Reporter {
    handle: Option<JoinHandle<Result<(), ReportError>>>,
    written: Arc<AtomicU64>,
}

impl Reporter {
    /// Open the output sink and start the reporter thread.
    ///
    /// The file is opened append+create before the thread starts, so an
    /// unwritable destination fails the run immediately instead of
    /// surfacing after probes have been spent.
    pub fn spawn(
        output_path: &Path,
        password: String,
        results_rx: QueueReceiver<ReportMessage>,
        echo: bool,
    ) -> Result<Self, ReportError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .map_err(|source| ReportError::OpenFailed {
                path: output_path.to_path_buf(),
                source,
            })?;

        let written = Arc::new(AtomicU64::new(0));
        let written_clone = Arc::clone(&written);
        let path = output_path.to_path_buf();

        let handle = thread::Builder::new()
            .name("reporter".into())
            .spawn(move || reporter_loop(file, path, password, results_rx, echo, written_clone))
            .map_err(|e| ReportError::SpawnFailed(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            written,
        })
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Check whether the reporter thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the reporter, returning the number of records written
    pub fn join(mut self) -> Result<u64, ReportError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => return Err(ReportError::Panicked),
            }
        }
        Ok(self.written.load(Ordering::Relaxed))
    }
}

/// Main reporter loop
///
/// Deliberately ignores the shutdown flag: after a cancellation the workers
/// stop producing, and draining until the termination marker is what gets
/// their in-flight results into the sink.
fn reporter_loop(
    file: File,
    path: PathBuf,
    password: String,
    results_rx: QueueReceiver<ReportMessage>,
    echo: bool,
    written: Arc<AtomicU64>,
) -> Result<(), ReportError> {
    let mut out = BufWriter::new(file);

    loop {
        let message = match results_rx.recv_timeout(POLL_INTERVAL) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let result = match message {
            ReportMessage::Result(result) => result,
            ReportMessage::Finished => break,
        };

        let record = format_record(&result, &password);
        writeln!(out, "{}", record)
            .and_then(|_| out.flush())
            .map_err(|source| ReportError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        if echo {
            println!("{}", record);
        }

        written.fetch_add(1, Ordering::Relaxed);
    }

    debug!(records = written.load(Ordering::Relaxed), "reporter finished");
    Ok(())
}
