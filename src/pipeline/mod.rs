//! The concurrent enumeration pipeline
//!
//! A fixed pool of prober threads fed through bounded queues:
//!
//! ```text
//!  ┌────────┐      ┌────────────┐      ┌─────────────┐
//!  │ Feeder │ ───▶ │ work queue │ ───▶ │ Worker pool │
//!  └────────┘      │ (bounded)  │      │  (N probes) │
//!                  └────────────┘      └──────┬──────┘
//!                                             │
//!                  ┌──────────────┐    ┌──────▼───────┐
//!                  │   Reporter   │ ◀─ │ result queue │
//!                  └──────────────┘    │  (bounded)   │
//!                                      └──────────────┘
//! ```
//!
//! Termination flows in-band: the feeder pushes one `WorkItem::Finished`
//! per worker, and the coordinator pushes a single `ReportMessage::Finished`
//! once the pool has drained. Cancellation is a shared atomic flag checked
//! at every blocking point; nothing is ever force-killed.

pub mod coordinator;
pub mod feeder;
pub mod queue;
pub mod reporter;
pub mod worker;

pub use coordinator::{Coordinator, RunResult};
pub use feeder::{file_source, CandidateSource, Feeder};
pub use queue::{BoundedQueue, ReportMessage, WorkItem};
pub use reporter::{format_record, Reporter};
pub use worker::{aggregate_stats, PoolStats, Worker};
