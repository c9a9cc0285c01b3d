//! o365-userenum - Office 365 ActiveSync Username Enumerator
//!
//! Probes an ActiveSync endpoint with a list of candidate usernames and a
//! fixed password, classifying each account from the response. Designed for
//! authorized credential/account-enumeration assessments, where a wordlist
//! of likely usernames is tested against a single tenant.
//!
//! # Features
//!
//! - **Concurrent probing**: A fixed pool of worker threads amortizes
//!   network latency across candidates.
//!
//! - **Bounded memory**: Both pipeline queues are capacity-limited, so the
//!   feeder is throttled to the pool's consumption rate no matter how large
//!   the wordlist is.
//!
//! - **Append-only output**: Every classified result is flushed to the
//!   output file as one line the moment it arrives; an interrupted run
//!   keeps everything probed so far.
//!
//! - **Graceful shutdown**: Ctrl-C drains in-flight work into the output
//!   file instead of killing threads.
//!
//! # Architecture
//!
//! ```text
//! candidates file
//!       │
//!       ▼
//!  ┌────────┐      ┌─────────────────┐      ┌──────────────────┐
//!  │ Feeder │ ───▶ │   Work Queue    │ ───▶ │  Worker Threads  │
//!  └────────┘      │   (crossbeam,   │      │  one OPTIONS     │
//!                  │    bounded)     │      │  probe/candidate │
//!                  └─────────────────┘      └────────┬─────────┘
//!                                                    │
//!                                                    ▼
//!  ┌─────────────────┐      ┌─────────────────┐
//!  │    Reporter     │ ◀─── │  Result Queue   │
//!  │ (append + echo) │      │   (crossbeam,   │
//!  └────────┬────────┘      │    bounded)     │
//!           │               └─────────────────┘
//!           ▼
//!     output file
//! ```
//!
//! The coordinator owns the shutdown flag, spawns every thread, and joins
//! them all; termination travels in-band as tagged queue markers.
//!
//! # Example
//!
//! ```bash
//! # Basic run against the default endpoint
//! o365-userenum -u users.txt -o results.txt
//!
//! # More workers, tighter timeout
//! o365-userenum -u users.txt -o results.txt -w 32 --timeout 10
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod progress;

pub use config::{CliArgs, RunConfig};
pub use error::{Result, UserEnumError};
pub use pipeline::{Coordinator, RunResult};
pub use probe::{classify, ActiveSyncProber, Classification, ProbeResult, Prober};
