//! Parallel scanning
//!
//! Splits the input into line-aligned chunks and scans them on a fixed
//! number of workers. Workers share no mutable state; each returns its own
//! table, and the coordinator merges them after joining everyone.
//!
//! # Module Structure
//!
//! - `types`: Chunk descriptors, worker messages, and configuration
//! - `plan`: Line-aligned chunk boundaries
//! - `worker`: Worker launching and joining
//! - `coordinator`: Sequential/parallel decision, fan-out, merge, fallback

mod coordinator;
mod plan;
mod types;
mod worker;

// Re-export public types
pub use coordinator::Coordinator;
pub use plan::{chunks_from_boundaries, plan_chunks};
pub use types::{Chunk, ParallelConfig, WorkerExit, WorkerReport};
pub use worker::{ScanJob, ThreadLauncher, WorkerHandle, WorkerLauncher};
