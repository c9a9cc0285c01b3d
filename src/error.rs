//! Error types for o365-userenum
//!
//! This module defines the error hierarchy that covers:
//! - Probe transport errors (per-candidate, recovered locally)
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Reporter/output-sink errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Probe failures are never fatal; they surface as UNKNOWN results
//! - Source and sink failures terminate the run cleanly, never hang it

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the o365-userenum application
#[derive(Error, Debug)]
pub enum UserEnumError {
    /// Probe transport errors
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Reporter/output-sink errors
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O errors (candidate source reads, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single probe attempt
///
/// These are absorbed by the worker that hit them: the candidate is recorded
/// as UNKNOWN with no status metadata and the pool keeps going.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request failed at the transport layer
    /// (timeout, connection failure, TLS, malformed response)
    #[error("request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Generic probe failure
    #[error("{0}")]
    Other(String),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("invalid thread count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue capacity
    #[error("invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid probe timeout
    #[error("invalid timeout {seconds}s: must be greater than zero")]
    InvalidTimeout { seconds: f64 },

    /// Endpoint URL did not parse or has the wrong scheme
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Users file missing
    #[error("users file '{path}' does not exist")]
    UsersFileNotFound { path: PathBuf },

    /// Output path error
    #[error("invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("worker {id} panicked")]
    Panicked { id: usize },

    /// Worker thread could not be spawned
    #[error("failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Feeder thread panicked
    #[error("feeder thread panicked")]
    FeederPanicked,
}

/// Reporter/output-sink errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// Output file could not be opened for append
    #[error("failed to open output file '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be appended
    #[error("failed to append to output file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reporter thread could not be spawned
    #[error("failed to spawn reporter thread: {0}")]
    SpawnFailed(String),

    /// Reporter thread panicked
    #[error("reporter thread panicked")]
    Panicked,
}

/// Result type alias for UserEnumError
pub type Result<T> = std::result::Result<T, UserEnumError>;
