//! Type definitions for parallel scanning
//!
//! Contains chunk descriptors, worker messages, and configuration.

use anyhow::Result;

use crate::config::{ExecutionMode, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_WORKERS};
use crate::scanner::ScanOutcome;

/// Configuration for parallel scanning
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    pub num_workers: usize,
    /// Inputs larger than this many bytes go parallel in `Auto` mode
    pub threshold: u64,
    pub mode: ExecutionMode,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            threshold: DEFAULT_PARALLEL_THRESHOLD,
            mode: ExecutionMode::Auto,
        }
    }
}

/// A line-aligned byte range `[start, end)` of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

/// Message a worker sends back exactly once
pub type WorkerReport = Result<ScanOutcome>;

/// How a started worker ended
#[derive(Debug)]
pub enum WorkerExit {
    /// The worker reported a result (success or scan error)
    Finished(Result<ScanOutcome>),
    /// The worker went away without reporting, e.g. it panicked
    Lost,
}
