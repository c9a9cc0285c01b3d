//! Configuration types for o365-userenum
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Default ActiveSync endpoint
const DEFAULT_ENDPOINT: &str = "https://outlook.office365.com/Microsoft-Server-ActiveSync";

/// Default credential presented with every probe
const DEFAULT_PASSWORD: &str = "Password1";

/// Enumerate Office 365 usernames over ActiveSync
#[derive(Parser, Debug, Clone)]
#[command(
    name = "o365-userenum",
    version,
    about = "Enumerate Office 365 usernames over ActiveSync",
    long_about = "Probes an ActiveSync endpoint with candidate usernames and a fixed password,\n\
                  classifying each account from the response status. Results are appended to\n\
                  the output file as they arrive, one line per candidate.",
    after_help = "EXAMPLES:\n    \
        o365-userenum -u users.txt -o results.txt\n    \
        o365-userenum -u users.txt -o results.txt -w 32 --timeout 10\n    \
        o365-userenum -u users.txt -o results.txt --url https://mail.example.com/Microsoft-Server-ActiveSync"
)]
pub struct CliArgs {
    /// Candidate usernames file, one username per line
    #[arg(short = 'u', long = "users", value_name = "FILE")]
    pub users: PathBuf,

    /// Output file (appended to, never truncated)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Password to present with every probe
    #[arg(long, default_value = DEFAULT_PASSWORD, value_name = "PASSWORD")]
    pub password: String,

    /// ActiveSync endpoint URL
    #[arg(long = "url", default_value = DEFAULT_ENDPOINT, value_name = "URL")]
    pub endpoint: String,

    /// Number of prober threads
    #[arg(short = 'w', long = "threads", default_value = "10", value_name = "NUM")]
    pub threads: usize,

    /// HTTP timeout per probe, in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: f64,

    /// Queue capacity (defaults to half the thread count)
    #[arg(long, value_name = "NUM")]
    pub queue_size: Option<usize>,

    /// Quiet mode - do not echo results to stdout
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-probe diagnostics)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Queue capacity derived from the worker count.
///
/// Half the pool keeps the feeder throttled to consumption rate while still
/// hiding probe latency jitter across workers.
pub fn derived_queue_capacity(worker_count: usize) -> usize {
    (worker_count / 2).max(1)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Candidate usernames file
    pub users_path: PathBuf,

    /// Output file path
    pub output_path: PathBuf,

    /// Credential presented with every probe
    pub password: String,

    /// Parsed ActiveSync endpoint
    pub endpoint: Url,

    /// Number of worker threads
    pub worker_count: usize,

    /// Capacity of both bounded queues
    pub queue_capacity: usize,

    /// Per-probe HTTP timeout
    pub probe_timeout: Duration,

    /// Echo each record to stdout as it is written
    pub echo_results: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.threads == 0 || args.threads > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.threads,
                max: MAX_WORKERS,
            });
        }

        let queue_capacity = match args.queue_size {
            Some(size) if size < 1 => {
                return Err(ConfigError::InvalidQueueSize { size, min: 1 });
            }
            Some(size) => size,
            None => derived_queue_capacity(args.threads),
        };

        // Also rejects NaN
        if !(args.timeout > 0.0) {
            return Err(ConfigError::InvalidTimeout {
                seconds: args.timeout,
            });
        }

        let endpoint = Url::parse(&args.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            url: args.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                url: args.endpoint,
                reason: "expected an http or https URL".into(),
            });
        }

        if !args.users.exists() {
            return Err(ConfigError::UsersFileNotFound { path: args.users });
        }

        if let Some(parent) = args.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidOutputPath {
                    path: args.output.clone(),
                    reason: format!("parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        Ok(Self {
            users_path: args.users,
            output_path: args.output,
            password: args.password,
            endpoint,
            worker_count: args.threads,
            queue_capacity,
            probe_timeout: Duration::from_secs_f64(args.timeout),
            echo_results: !args.quiet,
            verbose: args.verbose,
        })
    }
}
